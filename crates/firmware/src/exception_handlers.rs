//! Cortex-M exception handlers for the fault-dump firmware.
//!
//! - **HardFault** with `crash-dump`: interrupts off, the UART is taken from
//!   the logging driver and the stacked registers plus every board region
//!   go out as a hex transcript. Then the core halts.
//! - **HardFault** without `crash-dump`: the stacked frame address is
//!   reported over defmt/RTT and the core halts via `defmt::panic!`.
//!
//! # Hardware-only handler
//!
//! The `#[cortex_m_rt::exception]` attribute requires ARM target intrinsics and
//! is therefore gated behind `#[cfg(feature = "hardware")]`. The module itself
//! (and `CRASH_DUMP_ON_FAULT`) compiles unconditionally so host tests can
//! check which handler a build links.

#![allow(clippy::doc_markdown)] // Exception handler docs use hardware terminology (HardFault, SVC) as plain text

/// Whether HardFault emits a crash transcript in this build.
pub const CRASH_DUMP_ON_FAULT: bool = cfg!(feature = "crash-dump");

/// `HFSR.DEBUGEVT`: the fault was escalated from a debug event (BKPT with
/// no debugger attached).
pub const HFSR_DEBUGEVT: u32 = 1 << 31;

/// HardFault exception handler: crash transcript (hardware target only).
///
/// # Safety
///
/// This function must never return; returning from a HardFault handler is
/// undefined behavior on Cortex-M. The `-> !` return type enforces this.
#[cfg(all(feature = "hardware", feature = "crash-dump"))]
#[cortex_m_rt::exception]
#[allow(unsafe_code)]
unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
    use crashdump::{run_session, CrashInfo};

    use crate::board;
    use crate::crash::{build_session, RegisterFrame};
    use crate::delay::CycleDelay;
    use crate::logging::LOG;
    use crate::uart::board_uart;

    cortex_m::interrupt::disable();

    // SAFETY: SCB is always mapped; HFSR is a read-only status read here.
    let hfsr = unsafe { (*cortex_m::peripheral::SCB::PTR).hfsr.read() };
    let info = CrashInfo {
        stack_pointer: core::ptr::from_ref(ef) as usize,
        breakpoint: hfsr & HFSR_DEBUGEVT != 0,
    };
    let frame = RegisterFrame::from(ef);

    defmt::error!("HardFault at pc={=u32:#x}, dumping", frame.pc);

    // SAFETY: interrupts are disabled, so the logging driver can no longer
    // touch UART0; the session closes its queue before reprogramming.
    let uart = unsafe { board_uart(board::UART_PINS) };
    let mut session = build_session(uart, &LOG, CycleDelay::new(board::SYSCLK_HZ));

    // SAFETY: board regions lie in on-chip RAM, validated at build time.
    let _ = unsafe { run_session(&mut session, &info, &frame.to_words()) };

    loop {
        cortex_m::asm::wfi();
    }
}

/// HardFault exception handler: defmt report only (hardware target only).
///
/// Outputs the exception frame address via defmt/RTT so the engineer can
/// inspect the stacked PC, LR, and PSR in a debugger, then halts the processor.
///
/// # Safety
///
/// This function must never return; returning from a HardFault handler is
/// undefined behavior on Cortex-M. The `-> !` return type enforces this.
#[cfg(all(feature = "hardware", not(feature = "crash-dump")))]
#[cortex_m_rt::exception]
#[allow(unsafe_code)]
unsafe fn HardFault(ef: &cortex_m_rt::ExceptionFrame) -> ! {
    defmt::panic!(
        "HardFault! Stacked exception frame at 0x{:08X}. pc=0x{:08X} lr=0x{:08X}",
        core::ptr::from_ref(ef) as u32,
        ef.pc(),
        ef.lr()
    );
}
