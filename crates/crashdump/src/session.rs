//! Dump session: the boundary the capture engine calls into
//!
//! The engine decides *when* things happen; the session only turns each
//! call into bytes:
//!
//! | engine call        | on the wire                                   |
//! |--------------------|-----------------------------------------------|
//! | `dump_start`       | (channel takeover) `\r\n\r\n###CRASH###\r\n`  |
//! | `memory_regions`   | nothing                                       |
//! | `dump_memory`      | hex transcript of the chunk, then `\r\n`      |
//! | `dump_end`         | (end delay) `###END###\r\n`                   |
//!
//! Call order is the engine's responsibility and is not checked here.

use embedded_hal::delay::DelayNs;
use platform::{DumpChannel, LogChannel, NoLogChannel};

use crate::chunk::MemoryChunk;
use crate::region::RegionTable;
use crate::transport::{ChannelMode, Disposition, DumpTransport, TransportConfig};

/// What the engine knows about the fault when it starts a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CrashInfo {
    /// Stack pointer at the time of the fault.
    pub stack_pointer: usize,
    /// The fault was a debug breakpoint rather than a real crash.
    pub breakpoint: bool,
}

/// Engine boundary: the four callbacks of a crash dump.
pub trait CrashDumpHandler {
    /// Take over the channel and announce the dump.
    fn dump_start(&mut self, info: &CrashInfo);

    /// Regions the engine should hand back through [`dump_memory`].
    ///
    /// [`dump_memory`]: CrashDumpHandler::dump_memory
    fn memory_regions(&self) -> RegionTable<'_>;

    /// Encode one chunk followed by a single line terminator.
    fn dump_memory(&mut self, chunk: MemoryChunk<'_>);

    /// Close the transcript and tell the engine what to do next.
    fn dump_end(&mut self) -> Disposition;
}

/// Everything a session needs besides its hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpConfig<'r> {
    /// Regions reported to the engine.
    pub regions: RegionTable<'r>,
    /// Link timing and framing.
    pub transport: TransportConfig,
}

impl<'r> DumpConfig<'r> {
    /// Default transport settings around `regions`.
    pub const fn new(regions: RegionTable<'r>) -> Self {
        Self {
            regions,
            transport: TransportConfig::DEFAULT,
        }
    }
}

/// One crash dump, from banner to end marker.
///
/// Lives on the faulting context's stack; nothing survives it.
pub struct CrashDumpSession<'r, C, L, D> {
    regions: RegionTable<'r>,
    transport: DumpTransport<C, L, D>,
}

impl<'r, C, D> CrashDumpSession<'r, C, NoLogChannel, D>
where
    C: DumpChannel,
    D: DelayNs,
{
    /// Session on a channel nobody logged through.
    pub fn without_logging(channel: C, delay: D, config: DumpConfig<'r>) -> Self {
        Self {
            regions: config.regions,
            transport: DumpTransport::without_logging(channel, delay, config.transport),
        }
    }
}

impl<'r, C, L, D> CrashDumpSession<'r, C, L, D>
where
    C: DumpChannel,
    L: LogChannel,
    D: DelayNs,
{
    /// Session that takes `channel` over from `logging`.
    pub fn new(channel: C, logging: L, delay: D, config: DumpConfig<'r>) -> Self {
        Self {
            regions: config.regions,
            transport: DumpTransport::new(channel, logging, delay, config.transport),
        }
    }

    /// Current channel mode.
    pub fn mode(&self) -> ChannelMode {
        self.transport.mode()
    }

    /// The underlying transport.
    pub fn transport_mut(&mut self) -> &mut DumpTransport<C, L, D> {
        &mut self.transport
    }

    /// Hand back the channel, logging owner and delay.
    pub fn into_parts(self) -> (C, L, D) {
        self.transport.into_parts()
    }
}

impl<C, L, D> CrashDumpHandler for CrashDumpSession<'_, C, L, D>
where
    C: DumpChannel,
    L: LogChannel,
    D: DelayNs,
{
    fn dump_start(&mut self, info: &CrashInfo) {
        #[cfg(feature = "defmt")]
        defmt::warn!(
            "crash dump: sp={=usize:#x} breakpoint={=bool}",
            info.stack_pointer,
            info.breakpoint
        );
        #[cfg(not(feature = "defmt"))]
        let _ = info;

        self.transport.open();
    }

    fn memory_regions(&self) -> RegionTable<'_> {
        self.regions
    }

    fn dump_memory(&mut self, chunk: MemoryChunk<'_>) {
        let mut encoder = self.transport.encoder();
        encoder.chunk(&chunk);
        encoder.line_end();
    }

    fn dump_end(&mut self) -> Disposition {
        self.transport.finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::region::{ElementWidth, MemoryRegion};
    use crate::wire::{CRASH_BANNER, END_MARKER};
    use platform::mocks::{Event, EventLog, MockDelay, MockLogChannel, MockSink};

    fn session<'r>(
        log: &EventLog,
        regions: RegionTable<'r>,
    ) -> CrashDumpSession<'r, MockSink, MockLogChannel, MockDelay> {
        CrashDumpSession::new(
            MockSink::new(log),
            MockLogChannel::new(log, 3),
            MockDelay::new(log),
            DumpConfig::new(regions),
        )
    }

    // ── Test A ──
    // Four bytes dumped verbatim produce the exact transcript.
    #[test]
    fn test_deadbeef_transcript() {
        let log = EventLog::new();
        let mut s = session(&log, RegionTable::empty());
        let data = [0xDEu8, 0xAD, 0xBE, 0xEF];

        s.dump_start(&CrashInfo::default());
        s.dump_memory(MemoryChunk::bytes(&data));
        assert_eq!(s.dump_end(), Disposition::Exit);

        let (sink, _, _) = s.into_parts();
        assert_eq!(
            sink.output_str(),
            "\r\n\r\n###CRASH###\r\nDEADBEEF\r\n###END###\r\n"
        );
    }

    // ── Test B ──
    // memory_regions hands back the injected table untouched.
    #[test]
    fn test_regions_are_passed_through() {
        let regions = [
            MemoryRegion::new(0x2000_0000, 0x2000_0100, ElementWidth::Word),
            MemoryRegion::SENTINEL,
        ];
        let table = RegionTable::new(&regions).unwrap();
        let log = EventLog::new();
        let s = session(&log, table);
        assert_eq!(s.memory_regions(), table);
        assert!(log.events().is_empty());
    }

    // ── Test C ──
    // Each chunk is terminated by exactly one line end.
    #[test]
    fn test_each_chunk_gets_one_terminator() {
        let log = EventLog::new();
        let mut s = session(&log, RegionTable::empty());
        s.dump_start(&CrashInfo::default());
        s.dump_memory(MemoryChunk::bytes(&[0x01]));
        s.dump_memory(MemoryChunk::bytes(&[]));
        s.dump_memory(MemoryChunk::bytes(&[0x02]));
        s.dump_end();

        let (sink, _, _) = s.into_parts();
        let text = sink.output_str();
        let body = text
            .strip_prefix("\r\n\r\n###CRASH###\r\n")
            .unwrap()
            .strip_suffix("###END###\r\n")
            .unwrap();
        assert_eq!(body, "01\r\n\r\n02\r\n");
    }

    // ── Test D ──
    // Banner precedes every chunk byte; end marker follows the last one.
    #[test]
    fn test_banner_and_marker_frame_the_chunks() {
        let words = [0x1111_1111u32; 6];
        let log = EventLog::new();
        let mut s = session(&log, RegionTable::empty());
        s.dump_start(&CrashInfo {
            stack_pointer: 0x2000_8000,
            breakpoint: false,
        });
        s.dump_memory(MemoryChunk::words(&words));
        s.dump_end();

        let (sink, _, _) = s.into_parts();
        let out = sink.output();
        assert!(out.starts_with(CRASH_BANNER));
        assert!(out.ends_with(END_MARKER));
        assert_eq!(out.windows(CRASH_BANNER.len()).filter(|w| *w == CRASH_BANNER).count(), 1);
    }

    // ── Test E ──
    // The end delay runs before the end marker, after the last chunk.
    #[test]
    fn test_end_delay_precedes_marker() {
        let log = EventLog::new();
        let mut s = session(&log, RegionTable::empty());
        s.dump_start(&CrashInfo::default());
        s.dump_memory(MemoryChunk::bytes(&[0xAA]));
        log.clear();
        s.dump_end();

        let events = log.events();
        assert_eq!(events.first(), Some(&Event::DelayNs(100_000_000)));
        assert_eq!(events.get(1), Some(&Event::BeginBurst));
        assert_eq!(events.get(2), Some(&Event::Byte(b'#')));
    }

    #[test]
    fn test_without_logging_starts_closed() {
        let log = EventLog::new();
        let mut s = CrashDumpSession::without_logging(
            MockSink::new(&log),
            MockDelay::new(&log),
            DumpConfig::new(RegionTable::empty()),
        );
        assert_eq!(s.mode(), ChannelMode::Closed);
        s.dump_start(&CrashInfo::default());
        assert_eq!(s.mode(), ChannelMode::DumpActive);
        assert_eq!(log.total_delay_ms(), 0);
    }
}
