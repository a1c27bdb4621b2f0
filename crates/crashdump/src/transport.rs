//! Transport lifecycle: taking the UART away from the logger
//!
//! ```text
//! LoggingActive ──open()──▶ Draining ──configure──▶ DumpActive ──finish()──▶ DumpActive
//!                                                      ▲
//! Closed ─────────open()──────────────configure────────┘
//! ```
//!
//! The transition into `DumpActive` happens once per boot and is not
//! reversible: after a crash dump the device is expected to halt or reset,
//! so nothing restores the logging configuration.
//!
//! # Ordering
//!
//! When a logging owner exists, `open()` always runs:
//!
//! 1. grace period (`drain_grace_ms`) so in-flight buffered output can
//!    finish on the wire,
//! 2. `LogChannel::flush`,
//! 3. `LogChannel::close`,
//! 4. `DumpChannel::configure`,
//! 5. crash banner.
//!
//! Reprogramming the peripheral while the logging driver still owns its
//! interrupt and buffer state would have two drivers poking the same
//! registers.

use embedded_hal::delay::DelayNs;
use platform::{DumpChannel, LogChannel, NoLogChannel, UartConfig};

use crate::hex::HexEncoder;
use crate::wire::{CRASH_BANNER, END_MARKER};

/// Timing and framing of the dump link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportConfig {
    /// Wait before cutting off the logging owner, in milliseconds.
    pub drain_grace_ms: u32,
    /// Wait before the end marker, in milliseconds.
    pub end_delay_ms: u32,
    /// Framing of the raw dump link.
    pub uart: UartConfig,
}

impl TransportConfig {
    /// 500 ms grace, 100 ms end delay, 1 Mbaud 8N1.
    pub const DEFAULT: Self = Self {
        drain_grace_ms: 500,
        end_delay_ms: 100,
        uart: UartConfig::DUMP_1M,
    };
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Who currently drives the shared channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelMode {
    /// Ordinary buffered logging owns the UART.
    LoggingActive,
    /// Logging output is being allowed to drain before the takeover.
    Draining,
    /// Raw polling transmission for the crash transcript.
    DumpActive,
    /// Nobody has opened the channel yet.
    Closed,
}

impl ChannelMode {
    /// Short name for log lines.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoggingActive => "logging",
            Self::Draining => "draining",
            Self::DumpActive => "dump",
            Self::Closed => "closed",
        }
    }
}

/// What the capture engine should do after `dump_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Disposition {
    /// The dump is complete; halt or reset.
    Exit,
    /// Run the whole dump again.
    Retry,
}

/// Owns the dump channel for one crash.
pub struct DumpTransport<C, L, D> {
    channel: C,
    logging: L,
    delay: D,
    config: TransportConfig,
    mode: ChannelMode,
}

impl<C, D> DumpTransport<C, NoLogChannel, D>
where
    C: DumpChannel,
    D: DelayNs,
{
    /// Transport for a channel that was never used for logging.
    ///
    /// Starts in [`ChannelMode::Closed`]; `open()` skips the drain.
    pub fn without_logging(channel: C, delay: D, config: TransportConfig) -> Self {
        Self {
            channel,
            logging: NoLogChannel,
            delay,
            config,
            mode: ChannelMode::Closed,
        }
    }
}

impl<C, L, D> DumpTransport<C, L, D>
where
    C: DumpChannel,
    L: LogChannel,
    D: DelayNs,
{
    /// Transport taking `channel` over from `logging`.
    ///
    /// Starts in [`ChannelMode::LoggingActive`] if the logging owner is
    /// still open, [`ChannelMode::Closed`] otherwise.
    pub fn new(channel: C, logging: L, delay: D, config: TransportConfig) -> Self {
        let mode = if logging.is_open() {
            ChannelMode::LoggingActive
        } else {
            ChannelMode::Closed
        };
        Self {
            channel,
            logging,
            delay,
            config,
            mode,
        }
    }

    /// Current channel mode.
    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    /// Configuration in use.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Take the channel (once) and emit the crash banner.
    ///
    /// Calling this again in `DumpActive` only re-emits the banner, which
    /// is what a retried dump needs.
    pub fn open(&mut self) {
        self.acquire();
        self.channel.put_bytes(CRASH_BANNER);
    }

    /// Emit the end marker after the configured delay.
    ///
    /// Always answers [`Disposition::Exit`].
    pub fn finish(&mut self) -> Disposition {
        self.delay.delay_ms(self.config.end_delay_ms);
        self.channel.put_bytes(END_MARKER);
        #[cfg(feature = "defmt")]
        defmt::info!("crash dump: transcript complete");
        Disposition::Exit
    }

    /// Encoder writing into the dump channel.
    pub fn encoder(&mut self) -> HexEncoder<&mut C> {
        HexEncoder::new(&mut self.channel)
    }

    /// Direct access to the channel, for callers adding their own text.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Tear the transport apart (tests inspect the parts).
    pub fn into_parts(self) -> (C, L, D) {
        (self.channel, self.logging, self.delay)
    }

    fn acquire(&mut self) {
        match self.mode {
            ChannelMode::DumpActive => return,
            ChannelMode::LoggingActive | ChannelMode::Draining => {
                self.mode = ChannelMode::Draining;
                self.delay.delay_ms(self.config.drain_grace_ms);
                self.logging.flush();
                self.logging.close();
            }
            ChannelMode::Closed => {}
        }

        #[cfg(feature = "defmt")]
        defmt::info!(
            "crash dump: taking channel from {=str} at {=u32} baud",
            self.mode.as_str(),
            self.config.uart.baud_rate
        );

        self.channel.configure(&self.config.uart);
        self.mode = ChannelMode::DumpActive;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use platform::mocks::{Event, EventLog, MockDelay, MockLogChannel, MockSink};

    fn transport(
        log: &EventLog,
    ) -> DumpTransport<MockSink, MockLogChannel, MockDelay> {
        DumpTransport::new(
            MockSink::new(log),
            MockLogChannel::new(log, 40),
            MockDelay::new(log),
            TransportConfig::DEFAULT,
        )
    }

    #[test]
    fn starts_in_logging_mode_when_owner_is_open() {
        let log = EventLog::new();
        assert_eq!(transport(&log).mode(), ChannelMode::LoggingActive);
    }

    #[test]
    fn open_drains_flushes_closes_then_configures() {
        let log = EventLog::new();
        let mut t = transport(&log);
        t.open();

        let control = log.control_events();
        assert_eq!(
            &control[..5],
            &[
                Event::DelayNs(500_000_000),
                Event::LogFlush,
                Event::LogClose,
                Event::Configure(UartConfig::DUMP_1M),
                Event::BeginBurst,
            ]
        );
        assert_eq!(t.mode(), ChannelMode::DumpActive);

        let (sink, owner, _) = t.into_parts();
        assert_eq!(sink.output(), CRASH_BANNER);
        assert_eq!(owner.pending(), 0);
        assert!(!owner.is_open());
    }

    #[test]
    fn closed_channel_skips_drain() {
        let log = EventLog::new();
        let mut t = DumpTransport::without_logging(
            MockSink::new(&log),
            MockDelay::new(&log),
            TransportConfig::DEFAULT,
        );
        assert_eq!(t.mode(), ChannelMode::Closed);
        t.open();
        assert_eq!(log.total_delay_ms(), 0);
        assert_eq!(log.count(|e| *e == Event::LogFlush), 0);
        assert_eq!(t.mode(), ChannelMode::DumpActive);
    }

    #[test]
    fn second_open_only_repeats_banner() {
        let log = EventLog::new();
        let mut t = transport(&log);
        t.open();
        t.open();
        assert_eq!(log.count(|e| matches!(e, Event::Configure(_))), 1);
        assert_eq!(log.count(|e| *e == Event::LogClose), 1);
        let (sink, _, _) = t.into_parts();
        assert_eq!(sink.output().len(), 2 * CRASH_BANNER.len());
    }

    #[test]
    fn finish_waits_then_emits_end_marker_and_exits() {
        let log = EventLog::new();
        let mut t = transport(&log);
        t.open();
        log.clear();

        assert_eq!(t.finish(), Disposition::Exit);
        assert_eq!(log.events().first(), Some(&Event::DelayNs(100_000_000)));
        let (sink, _, _) = t.into_parts();
        assert!(sink.output().ends_with(END_MARKER));
    }

    #[test]
    fn custom_grace_period_is_honoured() {
        let log = EventLog::new();
        let config = TransportConfig {
            drain_grace_ms: 20,
            ..TransportConfig::DEFAULT
        };
        let mut t = DumpTransport::new(
            MockSink::new(&log),
            MockLogChannel::new(&log, 0),
            MockDelay::new(&log),
            config,
        );
        t.open();
        assert_eq!(log.total_delay_ms(), 20);
    }

    #[test]
    fn closed_logging_owner_starts_closed() {
        let log = EventLog::new();
        let mut owner = MockLogChannel::new(&log, 0);
        owner.close();
        let t = DumpTransport::new(
            MockSink::new(&log),
            owner,
            MockDelay::new(&log),
            TransportConfig::DEFAULT,
        );
        assert_eq!(t.mode(), ChannelMode::Closed);
    }

    #[test]
    fn mode_names() {
        assert_eq!(ChannelMode::DumpActive.as_str(), "dump");
        assert_eq!(ChannelMode::LoggingActive.as_str(), "logging");
    }
}
