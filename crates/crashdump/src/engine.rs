//! Reference capture engine driver
//!
//! Calls a [`CrashDumpHandler`] in the order a fault-capture engine does:
//!
//! 1. `dump_start`
//! 2. the captured register frame as one word chunk (skipped when empty)
//! 3. one chunk per region from `memory_regions`, in table order
//! 4. `dump_end`
//!
//! and starts over while the handler answers [`Disposition::Retry`].
//! Stack unwinding and register enumeration stay with the caller, which
//! passes whatever frame it captured.

use crate::chunk::MemoryChunk;
use crate::session::{CrashDumpHandler, CrashInfo};
use crate::transport::Disposition;

/// Run dumps on `handler` until it answers [`Disposition::Exit`].
///
/// Returns the final disposition, which is always `Exit`.
///
/// # Safety
///
/// Every region returned by `handler.memory_regions()` must be mapped and
/// readable with loads of its element width while the dump runs.
pub unsafe fn run_session<H>(handler: &mut H, info: &CrashInfo, registers: &[u32]) -> Disposition
where
    H: CrashDumpHandler + ?Sized,
{
    loop {
        handler.dump_start(info);

        if !registers.is_empty() {
            handler.dump_memory(MemoryChunk::words(registers));
        }

        // Re-query per entry: the table borrows the handler, `dump_memory`
        // needs it mutably.
        let mut index = 0usize;
        while let Some(region) = handler.memory_regions().as_slice().get(index).copied() {
            if region.is_sentinel() {
                break;
            }
            // SAFETY: forwarded from the caller's contract on the table.
            let chunk = unsafe { region.chunk() };
            handler.dump_memory(chunk);
            index = index.saturating_add(1);
        }

        match handler.dump_end() {
            Disposition::Exit => return Disposition::Exit,
            Disposition::Retry => {
                #[cfg(feature = "defmt")]
                defmt::warn!("crash dump: handler asked for a retry");
            }
        }
    }
}
