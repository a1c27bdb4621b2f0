//! Buffered application logging channel
//!
//! During normal operation the application log is queued into a
//! [`BufferedLogChannel`] and drained to the UART one byte at a time by the
//! transmit path (UART interrupt or main-loop pump). The crash-dump path
//! takes the same UART away from it: after a grace period the channel is
//! flushed and closed through the [`LogChannel`] trait, and only then is the
//! peripheral reprogrammed for raw polling.
//!
//! The queue lives behind an `embassy-sync` blocking mutex over a
//! critical section, so it can be a plain `static` shared between thread
//! mode and interrupt handlers.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Deque;

/// Owner of a shared channel in its logging role.
///
/// Implemented by whatever currently drives the UART for ordinary logs.
/// The crash-dump transport calls `flush` then `close`, in that order,
/// before touching the peripheral.
pub trait LogChannel {
    /// Drop any output still queued. Must not block.
    fn flush(&mut self);

    /// Stop using the channel. Subsequent log writes are discarded.
    fn close(&mut self);

    /// Whether the channel still accepts log output.
    fn is_open(&self) -> bool;
}

impl<L: LogChannel + ?Sized> LogChannel for &mut L {
    fn flush(&mut self) {
        (**self).flush();
    }

    fn close(&mut self) {
        (**self).close();
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

/// Placeholder owner for builds where the UART is never used for logging.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLogChannel;

impl LogChannel for NoLogChannel {
    fn flush(&mut self) {}

    fn close(&mut self) {}

    fn is_open(&self) -> bool {
        false
    }
}

/// Instantaneous depth of a work or output queue.
///
/// Reported alongside every trace line so load spikes are visible in the log.
pub trait QueueDepth {
    /// Number of entries currently queued.
    fn depth(&self) -> u32;
}

impl<Q: QueueDepth + ?Sized> QueueDepth for &Q {
    fn depth(&self) -> u32 {
        (**self).depth()
    }
}

impl QueueDepth for () {
    fn depth(&self) -> u32 {
        0
    }
}

struct Inner<const N: usize> {
    queue: Deque<u8, N>,
    open: bool,
    dropped: u32,
}

/// Interrupt-safe byte queue feeding the logging UART.
///
/// Writes never block: bytes that do not fit are counted in
/// [`dropped`](Self::dropped) and discarded.
pub struct BufferedLogChannel<const N: usize> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner<N>>>,
}

impl<const N: usize> BufferedLogChannel<N> {
    /// Create an open, empty channel. Usable in `static` initialisers.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                queue: Deque::new(),
                open: true,
                dropped: 0,
            })),
        }
    }

    /// Queue as much of `bytes` as fits. Returns the number accepted.
    ///
    /// A closed channel accepts nothing and does not count drops.
    pub fn write(&self, bytes: &[u8]) -> usize {
        self.inner.lock(|cell| {
            let mut inner = cell.borrow_mut();
            if !inner.open {
                return 0;
            }
            let mut accepted = 0usize;
            for &byte in bytes {
                if inner.queue.push_back(byte).is_err() {
                    inner.dropped = inner.dropped.saturating_add(1);
                } else {
                    accepted = accepted.saturating_add(1);
                }
            }
            accepted
        })
    }

    /// Take the next byte for transmission.
    pub fn pop(&self) -> Option<u8> {
        self.inner.lock(|cell| cell.borrow_mut().queue.pop_front())
    }

    /// Bytes currently queued.
    pub fn len(&self) -> usize {
        self.inner.lock(|cell| cell.borrow().queue.len())
    }

    /// `true` when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queue capacity in bytes.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bytes discarded because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.inner.lock(|cell| cell.borrow().dropped)
    }

    /// Discard everything still queued.
    pub fn flush(&self) {
        self.inner.lock(|cell| cell.borrow_mut().queue.clear());
    }

    /// Refuse all further writes. Irreversible.
    pub fn close(&self) {
        self.inner.lock(|cell| cell.borrow_mut().open = false);
    }

    /// Whether writes are still accepted.
    pub fn is_open(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().open)
    }

    /// A `core::fmt::Write` handle onto this channel.
    pub fn writer(&self) -> LogWriter<'_, N> {
        LogWriter { channel: self }
    }
}

impl<const N: usize> Default for BufferedLogChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LogChannel for &BufferedLogChannel<N> {
    fn flush(&mut self) {
        BufferedLogChannel::flush(self);
    }

    fn close(&mut self) {
        BufferedLogChannel::close(self);
    }

    fn is_open(&self) -> bool {
        BufferedLogChannel::is_open(self)
    }
}

impl<const N: usize> QueueDepth for BufferedLogChannel<N> {
    fn depth(&self) -> u32 {
        u32::try_from(self.len()).unwrap_or(u32::MAX)
    }
}

/// Formatting handle returned by [`BufferedLogChannel::writer`].
///
/// Overflow is not an error: the tail of a long line is dropped and counted.
pub struct LogWriter<'a, const N: usize> {
    channel: &'a BufferedLogChannel<N>,
}

impl<const N: usize> core::fmt::Write for LogWriter<'_, N> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.channel.write(s.as_bytes());
        Ok(())
    }
}
