//! Host-side reading of serial captures
//!
//! A capture from the device's UART is a mix of trace lines and, after a
//! fault, one crash transcript:
//!
//! ```text
//! [0000001200:0:1:src/main.rs:40] boot
//!
//!
//! ###CRASH###
//! 0000002000A1B2C3...
//! DEADBEEF
//! ###END###
//! ```
//!
//! [`CaptureScanner`] splits the two line by line. The lines between the
//! markers form a [`CrashDump`], which can be written out for a GDB stub or
//! decoded back to bytes.

use std::io;

use thiserror::Error;

use crate::trace::Level;
use crate::wire::{CRASH_TAG, END_TAG};

/// One parsed trace line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Device tick count.
    pub timestamp: u64,
    /// Queue depth when the line was written.
    pub queue_depth: u32,
    /// Raw level digit.
    pub level_code: u8,
    /// Source file.
    pub file: String,
    /// Source line.
    pub line: u32,
    /// Message text.
    pub message: String,
}

impl LogRecord {
    /// Parse the first `[ts:depth:level:file:line] message` header found in
    /// `text`.
    ///
    /// Text in front of the header (for example the tail of a line that
    /// was cut off) is ignored. Returns `None` when no header is present.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_end_matches(['\r', '\n']);
        text.match_indices('[')
            .find_map(|(at, _)| text.get(at.saturating_add(1)..).and_then(Self::parse_header))
    }

    /// Severity, when the digit names a known level.
    pub fn level(&self) -> Option<Level> {
        Level::from_code(self.level_code)
    }

    fn parse_header(rest: &str) -> Option<Self> {
        let mut fields = rest.splitn(4, ':');
        let timestamp = digits(fields.next()?)?.parse().ok()?;
        let queue_depth = digits(fields.next()?)?.parse().ok()?;
        let level_field = fields.next()?;
        if level_field.len() != 1 {
            return None;
        }
        let level_code = digits(level_field)?.parse().ok()?;
        let tail = fields.next()?;

        // The file name is the shortest prefix followed by `:<digits>] `.
        for (close, _) in tail.match_indices("] ") {
            let head = tail.get(..close)?;
            let Some((file, line)) = head.rsplit_once(':') else {
                continue;
            };
            if file.is_empty() {
                continue;
            }
            let Some(line) = digits(line).and_then(|l| l.parse().ok()) else {
                continue;
            };
            let message = tail.get(close.saturating_add(2)..)?;
            return Some(Self {
                timestamp,
                queue_depth,
                level_code,
                file: file.to_string(),
                line,
                message: message.to_string(),
            });
        }
        None
    }
}

/// `Some(s)` when `s` is a non-empty run of ASCII digits.
fn digits(s: &str) -> Option<&str> {
    (!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())).then_some(s)
}

/// Why a transcript could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    /// A character that is not an uppercase or lowercase hex digit.
    #[error("line {line}, column {column}: {found:?} is not a hex digit")]
    InvalidDigit {
        /// 1-based line within the dump.
        line: usize,
        /// 1-based column.
        column: usize,
        /// The offending character.
        found: char,
    },
    /// A line that does not hold whole bytes.
    #[error("line {line}: odd number of hex digits")]
    OddDigitCount {
        /// 1-based line within the dump.
        line: usize,
    },
}

/// The lines between `###CRASH###` and `###END###`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrashDump {
    lines: Vec<String>,
}

impl CrashDump {
    /// Dump made of `lines` (terminators already stripped).
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Transcript lines, blank separators included.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Decode every line back to the bytes that were dumped.
    ///
    /// Blank lines (chunk separators, empty chunks) contribute nothing.
    ///
    /// # Errors
    ///
    /// [`TranscriptError`] on the first malformed line.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TranscriptError> {
        let mut out = Vec::new();
        for (index, text) in self.lines.iter().enumerate() {
            let line = index.saturating_add(1);
            let digits = text.trim_end();
            let mut high = None;
            for (col, ch) in digits.chars().enumerate() {
                let nibble = ch.to_digit(16).ok_or(TranscriptError::InvalidDigit {
                    line,
                    column: col.saturating_add(1),
                    found: ch,
                })?;
                // to_digit(16) is < 16
                #[allow(clippy::cast_possible_truncation)]
                let nibble = nibble as u8;
                match high.take() {
                    None => high = Some(nibble),
                    Some(h) => out.push((h << 4) | nibble),
                }
            }
            if high.is_some() {
                return Err(TranscriptError::OddDigitCount { line });
            }
        }
        Ok(out)
    }

    /// Write the transcript in the line format CrashDebug reads.
    ///
    /// # Errors
    ///
    /// I/O errors from `out`.
    pub fn write_to<W: io::Write>(&self, mut out: W) -> io::Result<()> {
        for line in &self.lines {
            out.write_all(line.as_bytes())?;
            out.write_all(b"\r\n")?;
        }
        out.flush()
    }
}

/// What one captured line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A trace line.
    Log(LogRecord),
    /// Anything else outside a dump.
    Text(String),
    /// The crash banner was seen.
    DumpStarted,
    /// A line was added to the dump in progress.
    DumpLine,
    /// The end marker closed the dump.
    DumpComplete(CrashDump),
}

/// Line-by-line splitter for serial captures.
#[derive(Debug, Default)]
pub struct CaptureScanner {
    dump: Option<Vec<String>>,
}

impl CaptureScanner {
    /// Scanner outside any dump.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify one line (terminator optional).
    pub fn feed(&mut self, line: &str) -> ScanEvent {
        let line = line.trim_end_matches(['\r', '\n']);
        match self.dump.as_mut() {
            Some(lines) => {
                if line.contains(END_TAG) {
                    let lines = self.dump.take().unwrap_or_default();
                    ScanEvent::DumpComplete(CrashDump { lines })
                } else {
                    lines.push(line.to_string());
                    ScanEvent::DumpLine
                }
            }
            None if line.contains(CRASH_TAG) => {
                self.dump = Some(Vec::new());
                ScanEvent::DumpStarted
            }
            None => LogRecord::parse(line)
                .map_or_else(|| ScanEvent::Text(line.to_string()), ScanEvent::Log),
        }
    }

    /// Whether a dump has started but not ended.
    pub fn in_dump(&self) -> bool {
        self.dump.is_some()
    }

    /// End of capture: return whatever partial dump is pending.
    pub fn finish(self) -> Option<CrashDump> {
        self.dump.map(|lines| CrashDump { lines })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;
    use crate::chunk::MemoryChunk;
    use crate::session::{CrashDumpHandler, CrashDumpSession, CrashInfo, DumpConfig};
    use crate::region::RegionTable;
    use platform::mocks::{EventLog, MockDelay, MockLogChannel, MockSink};

    #[test]
    fn test_parse_trace_line() {
        let r = LogRecord::parse("[0000012345:3:2:src/radio.rs:77] tx timeout\r\n").unwrap();
        assert_eq!(r.timestamp, 12_345);
        assert_eq!(r.queue_depth, 3);
        assert_eq!(r.level(), Some(Level::Warning));
        assert_eq!(r.file, "src/radio.rs");
        assert_eq!(r.line, 77);
        assert_eq!(r.message, "tx timeout");
    }

    #[test]
    fn test_parse_skips_garbage_prefix_and_keeps_brackets_in_message() {
        let r = LogRecord::parse("\u{0}xx[0000000001:0:0:a:b.rs:9] got [1] ok").unwrap();
        assert_eq!(r.file, "a:b.rs");
        assert_eq!(r.line, 9);
        assert_eq!(r.message, "got [1] ok");
    }

    #[test]
    fn test_parse_rejects_plain_text() {
        assert_eq!(LogRecord::parse("hello"), None);
        assert_eq!(LogRecord::parse("[abc:1:1:f:1] x"), None);
        assert_eq!(LogRecord::parse("[1:1:12:f:1] x"), None);
        assert_eq!(LogRecord::parse("[1:1:1:f:x] y"), None);
    }

    #[test]
    fn test_unknown_level_digit_is_kept() {
        let r = LogRecord::parse("[1:0:7:f.rs:1] m").unwrap();
        assert_eq!(r.level_code, 7);
        assert_eq!(r.level(), None);
    }

    #[test]
    fn test_scanner_splits_logs_and_dump() {
        let capture = "[0000000010:0:1:main.rs:1] boot\r\n\
                       \r\n\
                       \r\n\
                       ###CRASH###\r\n\
                       0A1B\r\n\
                       \r\n\
                       ###END###\r\n\
                       after\r\n";
        let mut scanner = CaptureScanner::new();
        let events: Vec<ScanEvent> = capture.split_inclusive('\n').map(|l| scanner.feed(l)).collect();

        assert!(matches!(events[0], ScanEvent::Log(_)));
        assert_eq!(events[1], ScanEvent::Text(String::new()));
        assert_eq!(events[3], ScanEvent::DumpStarted);
        assert_eq!(events[4], ScanEvent::DumpLine);
        let ScanEvent::DumpComplete(dump) = &events[6] else {
            panic!("expected a complete dump, got {:?}", events[6]);
        };
        assert_eq!(dump.lines(), ["0A1B", ""]);
        assert_eq!(dump.to_bytes().unwrap(), vec![0x0A, 0x1B]);
        assert_eq!(events[7], ScanEvent::Text("after".to_string()));
        assert!(!scanner.in_dump());
    }

    #[test]
    fn test_truncated_capture_yields_partial_dump() {
        let mut scanner = CaptureScanner::new();
        scanner.feed("###CRASH###");
        scanner.feed("FFEE");
        assert!(scanner.in_dump());
        assert_eq!(scanner.finish(), Some(CrashDump::from_lines(["FFEE"])));
    }

    #[test]
    fn test_decode_errors_point_at_the_line() {
        let dump = CrashDump::from_lines(["00", "0G"]);
        assert_eq!(
            dump.to_bytes(),
            Err(TranscriptError::InvalidDigit {
                line: 2,
                column: 2,
                found: 'G'
            })
        );
        let dump = CrashDump::from_lines(["ABC"]);
        assert_eq!(dump.to_bytes(), Err(TranscriptError::OddDigitCount { line: 1 }));
    }

    #[test]
    fn test_non_ascii_noise_is_an_invalid_digit() {
        // Two bytes of UTF-8 plus one digit: an even byte count, two chars.
        let dump = CrashDump::from_lines(["\u{e9}A"]);
        assert_eq!(
            dump.to_bytes(),
            Err(TranscriptError::InvalidDigit {
                line: 1,
                column: 1,
                found: '\u{e9}'
            })
        );
        let dump = CrashDump::from_lines(["0A", "\u{e9}"]);
        assert!(matches!(
            dump.to_bytes(),
            Err(TranscriptError::InvalidDigit { line: 2, .. })
        ));
    }

    #[test]
    fn test_write_to_uses_crlf() {
        let dump = CrashDump::from_lines(["AA", "BB"]);
        let mut out = Vec::new();
        dump.write_to(&mut out).unwrap();
        assert_eq!(out, b"AA\r\nBB\r\n");
    }

    // ── End to end ──
    // Session output fed back through the scanner decodes to the memory.
    #[test]
    fn test_session_output_decodes_to_original_memory() {
        let bytes: Vec<u8> = (0u8..=40).collect();
        let words = [0x0102_0304u32, 0xA0B0_C0D0, 0xFFFF_0000, 1, 2];

        let log = EventLog::new();
        let mut session = CrashDumpSession::new(
            MockSink::new(&log),
            MockLogChannel::new(&log, 0),
            MockDelay::new(&log),
            DumpConfig::new(RegionTable::empty()),
        );
        session.dump_start(&CrashInfo::default());
        session.dump_memory(MemoryChunk::bytes(&bytes));
        session.dump_memory(MemoryChunk::words(&words));
        session.dump_end();
        let (sink, _, _) = session.into_parts();

        let mut scanner = CaptureScanner::new();
        let mut dump = None;
        for line in sink.output_str().split_inclusive('\n') {
            if let ScanEvent::DumpComplete(d) = scanner.feed(line) {
                dump = Some(d);
            }
        }
        let decoded = dump.unwrap().to_bytes().unwrap();

        let mut expected = bytes.clone();
        for w in words {
            expected.extend_from_slice(&w.to_ne_bytes());
        }
        assert_eq!(decoded, expected);
    }
}
