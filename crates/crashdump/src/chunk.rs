//! Typed views of memory handed to the encoder
//!
//! A [`MemoryChunk`] is what the capture engine passes to `dump_memory`:
//! a base address, an [`ElementWidth`] and an element count. It can only be
//! built from a typed slice (safe) or from a raw address plus a width
//! (unsafe), so an unsupported width cannot reach the encoder.
//!
//! Every element is read with one volatile load of its native width. The
//! compiler may not merge, split or elide those loads, which matters for
//! peripheral registers that fault on narrower or wider accesses.

use core::marker::PhantomData;

use crate::region::ElementWidth;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
}

/// A fixed-width element that can be dumped verbatim.
pub trait Element: Copy + sealed::Sealed {
    /// Width tag for this element type.
    const WIDTH: ElementWidth;

    /// In-memory byte representation.
    type Bytes: AsRef<[u8]>;

    /// Bytes in native memory order: no swapping, no interpretation.
    fn native_bytes(self) -> Self::Bytes;
}

impl Element for u8 {
    const WIDTH: ElementWidth = ElementWidth::Byte;
    type Bytes = [u8; 1];

    fn native_bytes(self) -> [u8; 1] {
        [self]
    }
}

impl Element for u16 {
    const WIDTH: ElementWidth = ElementWidth::Halfword;
    type Bytes = [u8; 2];

    fn native_bytes(self) -> [u8; 2] {
        self.to_ne_bytes()
    }
}

impl Element for u32 {
    const WIDTH: ElementWidth = ElementWidth::Word;
    type Bytes = [u8; 4];

    fn native_bytes(self) -> [u8; 4] {
        self.to_ne_bytes()
    }
}

/// `count` elements of `width` starting at `base`.
#[derive(Debug, Clone, Copy)]
pub struct MemoryChunk<'a> {
    base: *const u8,
    width: ElementWidth,
    count: usize,
    _memory: PhantomData<&'a [u8]>,
}

impl<'a> MemoryChunk<'a> {
    /// Chunk of 8-bit elements.
    pub fn bytes(data: &'a [u8]) -> Self {
        Self::from_slice(data)
    }

    /// Chunk of 16-bit elements.
    pub fn halfwords(data: &'a [u16]) -> Self {
        Self::from_slice(data)
    }

    /// Chunk of 32-bit elements.
    pub fn words(data: &'a [u32]) -> Self {
        Self::from_slice(data)
    }

    /// Chunk covering any element slice.
    pub fn from_slice<T: Element>(data: &'a [T]) -> Self {
        Self {
            base: data.as_ptr().cast::<u8>(),
            width: T::WIDTH,
            count: data.len(),
            _memory: PhantomData,
        }
    }

    /// Chunk over raw memory.
    ///
    /// # Safety
    ///
    /// `count` elements of `width` starting at `address` must be readable
    /// with loads of that width for `'a`, and `address` must be aligned to
    /// `width`. A zero `count` places no requirement on `address`.
    pub unsafe fn from_raw(address: usize, width: ElementWidth, count: usize) -> Self {
        Self {
            base: address as *const u8,
            width,
            count,
            _memory: PhantomData,
        }
    }

    /// Element width.
    pub const fn width(&self) -> ElementWidth {
        self.width
    }

    /// Number of elements.
    pub const fn len(&self) -> usize {
        self.count
    }

    /// `true` for a zero-element chunk.
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Base address.
    pub fn address(&self) -> usize {
        self.base as usize
    }

    /// Iterate the elements as `T`, one volatile load each.
    ///
    /// Returns `None` when `T` does not match the chunk's width.
    pub fn elements<T: Element>(&self) -> Option<Elements<'a, T>> {
        if T::WIDTH != self.width {
            return None;
        }
        Some(Elements {
            next: self.base.cast::<T>(),
            remaining: self.count,
            _memory: PhantomData,
        })
    }
}

/// Iterator returned by [`MemoryChunk::elements`].
pub struct Elements<'a, T> {
    next: *const T,
    remaining: usize,
    _memory: PhantomData<&'a [T]>,
}

impl<T: Element> Iterator for Elements<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        // SAFETY: `MemoryChunk` is built either from a live `&'a [T]` or via
        // `from_raw`, whose contract guarantees `remaining` aligned, readable
        // elements from `next` onward.
        let value = unsafe { core::ptr::read_volatile(self.next) };
        // Raw chunks may cover MMIO or the top of RAM, so no allocation rule.
        self.next = self.next.wrapping_add(1);
        self.remaining = self.remaining.saturating_sub(1);
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Element> ExactSizeIterator for Elements<'_, T> {}
