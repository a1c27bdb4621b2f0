//! Hex transcript encoder
//!
//! Turns memory into uppercase ASCII hex, two digits per byte, high nibble
//! first, in native memory order. Lines wrap after a width-dependent number
//! of elements so every full line carries 16 bytes:
//!
//! | width    | elements / line | digits / line |
//! |----------|-----------------|---------------|
//! | 8-bit    | 16              | 32            |
//! | 16-bit   | 8               | 32            |
//! | 32-bit   | 4               | 32            |
//!
//! A break is written *before* an element that starts a new line, never
//! before the first element and never inside an element's digit group.
//! The encoder writes no trailing terminator; the session adds one per
//! chunk.

use heapless::Vec;
use platform::ByteSink;

use crate::chunk::{Element, MemoryChunk};
use crate::region::ElementWidth;
use crate::wire::{HEX_DIGITS, LINE_END};

/// Largest element is a word: 4 bytes, 8 digits.
const MAX_DIGITS: usize = 8;

/// Two uppercase hex digits for `byte`, high nibble first.
#[allow(clippy::indexing_slicing)] // nibbles are < 16
pub const fn hex_pair(byte: u8) -> [u8; 2] {
    [
        HEX_DIGITS[(byte >> 4) as usize],
        HEX_DIGITS[(byte & 0x0F) as usize],
    ]
}

/// Streams hex text for memory elements into a [`ByteSink`].
pub struct HexEncoder<S> {
    sink: S,
}

impl<S: ByteSink> HexEncoder<S> {
    /// Encoder writing to `sink`.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Give the sink back.
    pub fn into_inner(self) -> S {
        self.sink
    }

    /// Encode 8-bit elements, 16 per line.
    pub fn bytes<I: IntoIterator<Item = u8>>(&mut self, data: I) {
        self.elements(data);
    }

    /// Encode 16-bit elements, 8 per line.
    pub fn halfwords<I: IntoIterator<Item = u16>>(&mut self, data: I) {
        self.elements(data);
    }

    /// Encode 32-bit elements, 4 per line.
    pub fn words<I: IntoIterator<Item = u32>>(&mut self, data: I) {
        self.elements(data);
    }

    /// Encode any element type with its width's line period.
    pub fn elements<T: Element, I: IntoIterator<Item = T>>(&mut self, data: I) {
        let per_line = T::WIDTH.elements_per_line();
        for (index, value) in data.into_iter().enumerate() {
            if index != 0 && index.checked_rem(per_line) == Some(0) {
                self.line_end();
            }
            self.element(value.native_bytes().as_ref());
        }
    }

    /// Encode a chunk with the routine matching its width.
    pub fn chunk(&mut self, chunk: &MemoryChunk<'_>) {
        match chunk.width() {
            ElementWidth::Byte => {
                if let Some(elements) = chunk.elements::<u8>() {
                    self.bytes(elements);
                }
            }
            ElementWidth::Halfword => {
                if let Some(elements) = chunk.elements::<u16>() {
                    self.halfwords(elements);
                }
            }
            ElementWidth::Word => {
                if let Some(elements) = chunk.elements::<u32>() {
                    self.words(elements);
                }
            }
        }
    }

    /// Write `\r\n`.
    pub fn line_end(&mut self) {
        self.sink.put_bytes(LINE_END);
    }

    /// One element's digit group, sent as a single burst.
    fn element(&mut self, bytes: &[u8]) {
        let mut digits: Vec<u8, MAX_DIGITS> = Vec::new();
        for &byte in bytes {
            for digit in hex_pair(byte) {
                // Capacity covers the widest element.
                let _ = digits.push(digit);
            }
        }
        self.sink.put_bytes(&digits);
    }
}
