//! Leveled serial trace lines
//!
//! The application's ordinary UART log, the one the crash dump later takes
//! over. Every line carries a header the host tool parses:
//!
//! ```text
//! [0000012345:3:1:src/main.rs:42] radio up
//!  └ ticks ─┘ │ │ └─ file ───┘ └line
//!             │ └ level (0 verbose .. 4 fatal)
//!             └ queue depth
//! ```
//!
//! Use the macros (`log_info!` and friends) so file and line are filled in
//! at the call site.

use core::fmt::{self, Write};

use platform::{QueueDepth, TimeSource};

/// Severity, written as a single digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Level {
    /// Chatty development output.
    Verbose = 0,
    /// Normal operation.
    Info = 1,
    /// Something unexpected but handled.
    Warning = 2,
    /// An operation failed.
    Error = 3,
    /// The device cannot continue.
    Fatal = 4,
}

impl Level {
    /// Numeric code used on the wire.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Level for a wire code.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Verbose),
            1 => Some(Self::Info),
            2 => Some(Self::Warning),
            3 => Some(Self::Error),
            4 => Some(Self::Fatal),
            _ => None,
        }
    }
}

/// Formats trace lines into a text sink.
pub struct Tracer<W, T, Q> {
    out: W,
    clock: T,
    queue: Q,
    min_level: Level,
}

impl<W, T, Q> Tracer<W, T, Q>
where
    W: Write,
    T: TimeSource,
    Q: QueueDepth,
{
    /// Tracer that emits every level.
    pub const fn new(out: W, clock: T, queue: Q) -> Self {
        Self {
            out,
            clock,
            queue,
            min_level: Level::Verbose,
        }
    }

    /// Drop lines below `level`.
    #[must_use]
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Whether `level` would be written.
    pub fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    /// Write one headed line.
    ///
    /// # Errors
    ///
    /// Whatever the underlying writer reports.
    pub fn log(
        &mut self,
        level: Level,
        file: &str,
        line: u32,
        args: fmt::Arguments<'_>,
    ) -> fmt::Result {
        if !self.enabled(level) {
            return Ok(());
        }
        // Sample the queue before writing so the line does not count itself.
        let depth = self.queue.depth();
        write!(
            self.out,
            "[{:010}:{}:{}:{}:{}] {}\r\n",
            self.clock.now(),
            depth,
            level.code(),
            file,
            line,
            args
        )
    }

    /// Write the message alone, no header.
    ///
    /// # Errors
    ///
    /// Whatever the underlying writer reports.
    pub fn raw(&mut self, args: fmt::Arguments<'_>) -> fmt::Result {
        write!(self.out, "{args}\r\n")
    }

    /// Give the writer back.
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Log at an explicit [`Level`](crate::trace::Level).
#[macro_export]
macro_rules! trace_at {
    ($tracer:expr, $level:expr, $($arg:tt)+) => {{
        let _ = $tracer.log($level, file!(), line!(), format_args!($($arg)+));
    }};
}

/// Log at level 0.
#[macro_export]
macro_rules! log_verbose {
    ($tracer:expr, $($arg:tt)+) => {
        $crate::trace_at!($tracer, $crate::trace::Level::Verbose, $($arg)+)
    };
}

/// Log at level 1.
#[macro_export]
macro_rules! log_info {
    ($tracer:expr, $($arg:tt)+) => {
        $crate::trace_at!($tracer, $crate::trace::Level::Info, $($arg)+)
    };
}

/// Log at level 2.
#[macro_export]
macro_rules! log_warn {
    ($tracer:expr, $($arg:tt)+) => {
        $crate::trace_at!($tracer, $crate::trace::Level::Warning, $($arg)+)
    };
}

/// Log at level 3.
#[macro_export]
macro_rules! log_error {
    ($tracer:expr, $($arg:tt)+) => {
        $crate::trace_at!($tracer, $crate::trace::Level::Error, $($arg)+)
    };
}

/// Log at level 4.
#[macro_export]
macro_rules! log_fatal {
    ($tracer:expr, $($arg:tt)+) => {
        $crate::trace_at!($tracer, $crate::trace::Level::Fatal, $($arg)+)
    };
}

/// Message plus line end, no header.
#[macro_export]
macro_rules! log_raw {
    ($tracer:expr, $($arg:tt)+) => {{
        let _ = $tracer.raw(format_args!($($arg)+));
    }};
}
