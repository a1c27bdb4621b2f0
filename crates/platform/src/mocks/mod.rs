//! Mock implementations for testing
//!
//! All mocks append to one shared [`EventLog`], so a test can assert the
//! relative order of calls made to different collaborators (delay, log
//! owner, sink). That ordering is what the crash-dump transport guarantees.

#![cfg(any(test, feature = "std"))]

use std::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::clock::TimeSource;
use crate::log_channel::{LogChannel, QueueDepth};
use crate::peripheral::UartConfig;
use crate::sink::{ByteSink, DumpChannel};

/// One observable interaction with a mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `DelayNs` call, normalised to nanoseconds.
    DelayNs(u64),
    /// `LogChannel::flush`
    LogFlush,
    /// `LogChannel::close`
    LogClose,
    /// `DumpChannel::configure`
    Configure(UartConfig),
    /// `ByteSink::begin_burst`
    BeginBurst,
    /// `ByteSink::end_burst`
    EndBurst,
    /// `ByteSink::put_byte`
    Byte(u8),
}

/// Shared, clonable event recorder.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<Event>>>,
}

impl EventLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    /// Snapshot without `Byte` events, which dominate any real transcript.
    pub fn control_events(&self) -> Vec<Event> {
        self.events
            .borrow()
            .iter()
            .filter(|e| !matches!(e, Event::Byte(_)))
            .cloned()
            .collect()
    }

    /// Position of the first event matching `pred`.
    pub fn position(&self, pred: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events.borrow().iter().position(pred)
    }

    /// Number of events matching `pred`.
    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }

    /// Total delay requested, in milliseconds (truncated).
    pub fn total_delay_ms(&self) -> u64 {
        self.events
            .borrow()
            .iter()
            .map(|e| match e {
                Event::DelayNs(ns) => *ns,
                _ => 0,
            })
            .sum::<u64>()
            / 1_000_000
    }

    /// Discard recorded events.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// In-memory byte sink that records every transmitted byte.
pub struct MockSink {
    log: EventLog,
    output: Vec<u8>,
    config: Option<UartConfig>,
    in_burst: bool,
}

impl MockSink {
    /// Create a sink recording into `log`.
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            output: Vec::new(),
            config: None,
            in_burst: false,
        }
    }

    /// Everything transmitted so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Transmitted bytes as text (lossy).
    pub fn output_str(&self) -> std::string::String {
        std::string::String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Last configuration applied via [`DumpChannel::configure`].
    pub fn config(&self) -> Option<UartConfig> {
        self.config
    }

    /// Whether a burst is currently open.
    pub fn in_burst(&self) -> bool {
        self.in_burst
    }
}

impl ByteSink for MockSink {
    fn put_byte(&mut self, byte: u8) {
        self.output.push(byte);
        self.log.push(Event::Byte(byte));
    }

    fn begin_burst(&mut self) {
        self.in_burst = true;
        self.log.push(Event::BeginBurst);
    }

    fn end_burst(&mut self) {
        self.in_burst = false;
        self.log.push(Event::EndBurst);
    }
}

impl DumpChannel for MockSink {
    fn configure(&mut self, config: &UartConfig) {
        self.config = Some(*config);
        self.log.push(Event::Configure(*config));
    }
}

/// Logging owner that records flush/close calls.
pub struct MockLogChannel {
    log: EventLog,
    open: bool,
    pending: usize,
}

impl MockLogChannel {
    /// Open channel with `pending` bytes still queued.
    pub fn new(log: &EventLog, pending: usize) -> Self {
        Self {
            log: log.clone(),
            open: true,
            pending,
        }
    }

    /// Bytes still queued (zero after a flush).
    pub fn pending(&self) -> usize {
        self.pending
    }
}

impl LogChannel for MockLogChannel {
    fn flush(&mut self) {
        self.pending = 0;
        self.log.push(Event::LogFlush);
    }

    fn close(&mut self) {
        self.open = false;
        self.log.push(Event::LogClose);
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl QueueDepth for MockLogChannel {
    fn depth(&self) -> u32 {
        u32::try_from(self.pending).unwrap_or(u32::MAX)
    }
}

/// Delay provider that records instead of sleeping.
pub struct MockDelay {
    log: EventLog,
}

impl MockDelay {
    /// Create a delay recording into `log`.
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.push(Event::DelayNs(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        self.log.push(Event::DelayNs(u64::from(us) * 1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.push(Event::DelayNs(u64::from(ms) * 1_000_000));
    }
}

/// Clock that returns a fixed, settable tick count.
#[derive(Debug, Default)]
pub struct MockClock {
    now: std::cell::Cell<u32>,
}

impl MockClock {
    /// Clock frozen at `now`.
    pub fn at(now: u32) -> Self {
        Self {
            now: std::cell::Cell::new(now),
        }
    }

    /// Move the clock.
    pub fn set(&self, now: u32) {
        self.now.set(now);
    }
}

impl TimeSource for MockClock {
    fn now(&self) -> u32 {
        self.now.get()
    }
}
