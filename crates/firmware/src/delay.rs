//! Busy-wait delay for the fault path
//!
//! No timer interrupt runs inside HardFault, so the drain grace period and
//! the end-marker delay are burned in CPU cycles.

use embedded_hal::delay::DelayNs;

/// Cycle-counted delay at a fixed core clock.
#[derive(Debug, Clone, Copy)]
pub struct CycleDelay {
    sysclk_hz: u32,
}

impl CycleDelay {
    /// Delay for a core running at `sysclk_hz`.
    pub const fn new(sysclk_hz: u32) -> Self {
        Self { sysclk_hz }
    }

    /// Core cycles covering at least `ns` nanoseconds, saturating at
    /// `u32::MAX`.
    pub const fn cycles_for_ns(&self, ns: u32) -> u32 {
        // u32 * u32 fits in u64; the sum stays below 2^64.
        #[allow(clippy::arithmetic_side_effects)]
        let cycles = ((ns as u64) * (self.sysclk_hz as u64) + 999_999_999) / 1_000_000_000;
        if cycles > u32::MAX as u64 {
            u32::MAX
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let cycles = cycles as u32;
            cycles
        }
    }

    fn spin(cycles: u32) {
        #[cfg(feature = "hardware")]
        cortex_m::asm::delay(cycles);
        #[cfg(not(feature = "hardware"))]
        for _ in 0..cycles {
            core::hint::spin_loop();
        }
    }
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        Self::spin(self.cycles_for_ns(ns));
    }

    fn delay_us(&mut self, us: u32) {
        // Split so 1 s worth of microseconds does not saturate the ns path.
        for _ in 0..us / 1_000 {
            self.delay_ns(1_000_000);
        }
        self.delay_ns((us % 1_000).saturating_mul(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        for _ in 0..ms {
            self.delay_ns(1_000_000);
        }
    }
}
