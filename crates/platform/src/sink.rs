//! Blocking byte sinks
//!
//! A [`ByteSink`] is the lowest layer of the crash-dump path: one channel,
//! one byte at a time, no buffering. Implementations busy-wait until the
//! peripheral reports the byte consumed.
//!
//! # No timeouts
//!
//! `put_byte` has no timeout. A channel that never signals completion hangs
//! the caller forever. In a fault handler that is the accepted outcome: an
//! observable hang is preferred over a silently truncated transcript that a
//! host tool would take for a valid, shorter dump.

use core::convert::Infallible;

use crate::peripheral::UartConfig;

/// Blocking, unbuffered output channel.
pub trait ByteSink {
    /// Transmit one byte, spinning until the channel reports it consumed.
    fn put_byte(&mut self, byte: u8);

    /// Signal the start of a coherent burst of bytes.
    fn begin_burst(&mut self) {}

    /// Signal the end of a burst started with [`begin_burst`](Self::begin_burst).
    fn end_burst(&mut self) {}

    /// Transmit `bytes` in order, bracketed by `begin_burst`/`end_burst`.
    fn put_bytes(&mut self, bytes: &[u8]) {
        self.begin_burst();
        for &byte in bytes {
            self.put_byte(byte);
        }
        self.end_burst();
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn put_byte(&mut self, byte: u8) {
        (**self).put_byte(byte);
    }

    fn begin_burst(&mut self) {
        (**self).begin_burst();
    }

    fn end_burst(&mut self) {
        (**self).end_burst();
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        (**self).put_bytes(bytes);
    }
}

/// A byte sink that can be (re)configured for raw polling transmission.
///
/// `configure` is called exactly once per dump, after the logging owner of
/// the same peripheral has been flushed and closed.
pub trait DumpChannel: ByteSink {
    /// Reprogram the peripheral for blocking, interrupt-free transmission.
    fn configure(&mut self, config: &UartConfig);
}

impl<C: DumpChannel + ?Sized> DumpChannel for &mut C {
    fn configure(&mut self, config: &UartConfig) {
        (**self).configure(config);
    }
}

/// Adapter that lets formatted text share a [`ByteSink`].
///
/// Each `write_str` / `write` call is one burst.
pub struct SinkWriter<S> {
    sink: S,
}

impl<S: ByteSink> SinkWriter<S> {
    /// Wrap a sink.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Give the sink back.
    pub fn into_inner(self) -> S {
        self.sink
    }
}

impl<S: ByteSink> core::fmt::Write for SinkWriter<S> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.sink.put_bytes(s.as_bytes());
        Ok(())
    }
}

impl<S> embedded_io::ErrorType for SinkWriter<S> {
    type Error = Infallible;
}

impl<S: ByteSink> embedded_io::Write for SinkWriter<S> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.sink.put_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // put_byte only returns once the byte has left the peripheral.
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::{Event, EventLog, MockSink};
    use core::fmt::Write as _;

    #[test]
    fn put_bytes_brackets_the_burst() {
        let log = EventLog::new();
        let mut sink = MockSink::new(&log);

        sink.put_bytes(b"AB");

        assert_eq!(
            log.events(),
            vec![
                Event::BeginBurst,
                Event::Byte(b'A'),
                Event::Byte(b'B'),
                Event::EndBurst,
            ]
        );
    }

    #[test]
    fn forwarding_through_mut_ref_keeps_bursts() {
        let log = EventLog::new();
        let mut sink = MockSink::new(&log);
        {
            let mut by_ref = &mut sink;
            by_ref.put_bytes(b"Z");
        }
        assert_eq!(sink.output(), b"Z");
        assert_eq!(log.count(|e| *e == Event::BeginBurst), 1);
    }

    #[test]
    fn sink_writer_formats_text() {
        let log = EventLog::new();
        let mut writer = SinkWriter::new(MockSink::new(&log));
        write!(writer, "pc={:#010X}", 0x0800_1234u32).unwrap();
        assert_eq!(writer.into_inner().output(), b"pc=0x08001234");
    }

    #[test]
    fn sink_writer_embedded_io_reports_full_length() {
        let log = EventLog::new();
        let mut writer = SinkWriter::new(MockSink::new(&log));
        let written = embedded_io::Write::write(&mut writer, b"\r\n").unwrap();
        assert_eq!(written, 2);
        embedded_io::Write::flush(&mut writer).unwrap();
    }
}
