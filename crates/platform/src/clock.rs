//! Time sources for log timestamps

use core::sync::atomic::{AtomicU32, Ordering};

/// Monotonic tick source used to timestamp trace lines.
///
/// The unit is whatever the board ticks in (milliseconds on the reference
/// board). Wrapping is allowed; the host tool only compares neighbouring
/// lines.
pub trait TimeSource {
    /// Current tick count.
    fn now(&self) -> u32;
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> u32 {
        (**self).now()
    }
}

/// Tick counter advanced from a periodic interrupt (e.g. SysTick).
///
/// Const-constructible so it can be a `static`.
#[derive(Debug, Default)]
pub struct TickCounter {
    ticks: AtomicU32,
}

impl TickCounter {
    /// Counter starting at zero.
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU32::new(0),
        }
    }

    /// Advance by one tick. Call from the tick interrupt.
    pub fn tick(&self) {
        // fetch_add wraps on overflow.
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }
}

impl TimeSource for TickCounter {
    fn now(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }
}
