//! Crash-dump integration for the fault handler
//!
//! Ties the board configuration to a [`CrashDumpSession`] and captures the
//! register frame the core stacked on exception entry.

use crashdump::{CrashDumpSession, DumpConfig};
use embedded_hal::delay::DelayNs;
use platform::{DumpChannel, LogChannel};

use crate::board;

/// Registers stacked by the core on exception entry, in stacking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterFrame {
    /// r0
    pub r0: u32,
    /// r1
    pub r1: u32,
    /// r2
    pub r2: u32,
    /// r3
    pub r3: u32,
    /// r12
    pub r12: u32,
    /// Link register.
    pub lr: u32,
    /// Faulting program counter.
    pub pc: u32,
    /// Program status register.
    pub xpsr: u32,
}

impl RegisterFrame {
    /// Words in stacking order, ready for a word chunk.
    pub const fn to_words(&self) -> [u32; 8] {
        [
            self.r0, self.r1, self.r2, self.r3, self.r12, self.lr, self.pc, self.xpsr,
        ]
    }
}

#[cfg(feature = "hardware")]
impl From<&cortex_m_rt::ExceptionFrame> for RegisterFrame {
    fn from(ef: &cortex_m_rt::ExceptionFrame) -> Self {
        Self {
            r0: ef.r0(),
            r1: ef.r1(),
            r2: ef.r2(),
            r3: ef.r3(),
            r12: ef.r12(),
            lr: ef.lr(),
            pc: ef.pc(),
            xpsr: ef.xpsr(),
        }
    }
}

/// Session over `channel` with an explicit configuration.
pub fn session_with<'r, C, L, D>(
    config: DumpConfig<'r>,
    channel: C,
    logging: L,
    delay: D,
) -> CrashDumpSession<'r, C, L, D>
where
    C: DumpChannel,
    L: LogChannel,
    D: DelayNs,
{
    CrashDumpSession::new(channel, logging, delay, config)
}

/// Session configured from the selected board.
pub fn build_session<C, L, D>(channel: C, logging: L, delay: D) -> CrashDumpSession<'static, C, L, D>
where
    C: DumpChannel,
    L: LogChannel,
    D: DelayNs,
{
    session_with(board::DUMP_CONFIG, channel, logging, delay)
}
