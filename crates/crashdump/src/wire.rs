//! Bytes that appear on the wire verbatim
//!
//! Host tooling matches these byte-for-byte; changing any of them breaks
//! every capture script in the field.

/// Emitted once the channel is in dump mode, before any chunk.
///
/// The leading blank lines push the marker onto its own line even when the
/// logging channel was cut off mid-line.
pub const CRASH_BANNER: &[u8; 17] = b"\r\n\r\n###CRASH###\r\n";

/// Emitted after the last chunk.
pub const END_MARKER: &[u8; 11] = b"###END###\r\n";

/// Line terminator used for wrapping and chunk separation.
pub const LINE_END: &[u8; 2] = b"\r\n";

/// Text a host scanner looks for to detect the start of a transcript.
pub const CRASH_TAG: &str = "###CRASH###";

/// Text a host scanner looks for to detect the end of a transcript.
pub const END_TAG: &str = "###END###";

/// Uppercase hex alphabet, indexed by nibble.
pub const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Encoded bytes carried by every full transcript line, whatever the width.
pub const BYTES_PER_LINE: usize = 16;
