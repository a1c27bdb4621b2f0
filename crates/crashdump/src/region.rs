//! Memory regions and region tables
//!
//! A region table is the compiled-in list of address ranges worth dumping.
//! It is ordered, non-overlapping and always terminated by
//! [`MemoryRegion::SENTINEL`], whose bounds are both all-bits-set.
//!
//! [`RegionTable::new`] is a `const fn`, so a board can validate its table
//! in a `const` item and a malformed table fails the build instead of the
//! crash handler:
//!
//! ```
//! use crashdump::region::{ElementWidth, MemoryRegion, RegionTable};
//!
//! const TABLE: &[MemoryRegion] = &[
//!     MemoryRegion::new(0x2000_0000, 0x2000_1000, ElementWidth::Byte),
//!     MemoryRegion::SENTINEL,
//! ];
//!
//! const REGIONS: RegionTable<'static> = match RegionTable::new(TABLE) {
//!     Ok(table) => table,
//!     Err(_) => panic!("invalid region table"),
//! };
//!
//! assert_eq!(REGIONS.iter().count(), 1);
//! ```

use thiserror::Error;

use crate::chunk::MemoryChunk;
use crate::wire::BYTES_PER_LINE;

/// Read/encode granularity of a region.
///
/// Some peripheral registers only tolerate accesses of their native width,
/// so every element is read with exactly one load of this size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ElementWidth {
    /// 8-bit elements.
    Byte = 1,
    /// 16-bit elements.
    Halfword = 2,
    /// 32-bit elements.
    Word = 4,
}

impl ElementWidth {
    /// Size of one element in bytes.
    pub const fn bytes(self) -> usize {
        self as usize
    }

    /// Size of one element in bits.
    pub const fn bits(self) -> u32 {
        (self as u32) * 8
    }

    /// Elements per transcript line: 16, 8 or 4.
    ///
    /// Every full line carries [`BYTES_PER_LINE`] encoded bytes whatever
    /// the width.
    pub const fn elements_per_line(self) -> usize {
        match self {
            Self::Byte => BYTES_PER_LINE,
            Self::Halfword => BYTES_PER_LINE / 2,
            Self::Word => BYTES_PER_LINE / 4,
        }
    }
}

/// One address range to dump: `[start, end)` read as `width` elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryRegion {
    /// First address (inclusive).
    pub start: usize,
    /// One past the last address.
    pub end: usize,
    /// Element width used for reads and line wrapping.
    pub width: ElementWidth,
}

impl MemoryRegion {
    /// Reserved "invalid" address that marks the end of a table.
    pub const INVALID_ADDRESS: usize = usize::MAX;

    /// Table terminator.
    pub const SENTINEL: Self = Self {
        start: Self::INVALID_ADDRESS,
        end: Self::INVALID_ADDRESS,
        width: ElementWidth::Byte,
    };

    /// Describe `[start, end)` read as `width` elements.
    pub const fn new(start: usize, end: usize, width: ElementWidth) -> Self {
        Self { start, end, width }
    }

    /// Region covering exactly the memory of `data`.
    ///
    /// Used by host tests and by firmware that wants to dump a static
    /// buffer without spelling out its address.
    pub fn from_slice<T: crate::chunk::Element>(data: &[T]) -> Self {
        let start = data.as_ptr() as usize;
        Self {
            start,
            end: start.wrapping_add(core::mem::size_of_val(data)),
            width: T::WIDTH,
        }
    }

    /// Whether this is the table terminator.
    pub const fn is_sentinel(&self) -> bool {
        self.start == Self::INVALID_ADDRESS && self.end == Self::INVALID_ADDRESS
    }

    /// Length in bytes (zero for reversed bounds).
    pub const fn len_bytes(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Number of whole elements in the region.
    pub const fn element_count(&self) -> usize {
        self.len_bytes() / self.width.bytes()
    }

    /// View the region's memory as a dump chunk.
    ///
    /// # Safety
    ///
    /// `[start, end)` must be mapped and readable with loads of `width`
    /// for as long as the chunk is used, and `start` must be aligned to
    /// `width`. Tables accepted by [`RegionTable::new`] satisfy the
    /// alignment part.
    pub unsafe fn chunk(&self) -> MemoryChunk<'static> {
        // SAFETY: forwarded to the caller.
        unsafe { MemoryChunk::from_raw(self.start, self.width, self.element_count()) }
    }
}

/// Why a region table was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegionTableError {
    /// No entries at all, not even the sentinel.
    #[error("region table is empty")]
    Empty,
    /// The last entry is not [`MemoryRegion::SENTINEL`].
    #[error("region table does not end with the sentinel region")]
    MissingSentinel,
    /// A sentinel appears before the last entry.
    #[error("sentinel at index {index} before the end of the table")]
    EarlySentinel {
        /// Offending entry.
        index: usize,
    },
    /// `start >= end`.
    #[error("region {index} is empty or reversed")]
    EmptyRegion {
        /// Offending entry.
        index: usize,
    },
    /// A bound is not a multiple of the element width.
    #[error("region {index} is not aligned to its element width")]
    Misaligned {
        /// Offending entry.
        index: usize,
    },
    /// The region starts before the previous one ended.
    #[error("region {index} overlaps or precedes region {}", .index.wrapping_sub(1))]
    Overlap {
        /// Offending entry.
        index: usize,
    },
}

/// Validated, sentinel-terminated list of regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionTable<'a> {
    regions: &'a [MemoryRegion],
}

impl<'a> RegionTable<'a> {
    /// Validate `regions`.
    ///
    /// # Errors
    ///
    /// See [`RegionTableError`] for the rules that are checked.
    #[allow(clippy::indexing_slicing, clippy::arithmetic_side_effects)] // `i < len` loop bound
    pub const fn new(regions: &'a [MemoryRegion]) -> Result<Self, RegionTableError> {
        let len = regions.len();
        if len == 0 {
            return Err(RegionTableError::Empty);
        }
        if !regions[len - 1].is_sentinel() {
            return Err(RegionTableError::MissingSentinel);
        }

        let mut previous_end = 0usize;
        let mut i = 0;
        while i < len - 1 {
            let region = &regions[i];
            if region.is_sentinel() {
                return Err(RegionTableError::EarlySentinel { index: i });
            }
            if region.start >= region.end {
                return Err(RegionTableError::EmptyRegion { index: i });
            }
            let align = region.width.bytes();
            if region.start % align != 0 || region.end % align != 0 {
                return Err(RegionTableError::Misaligned { index: i });
            }
            if i > 0 && region.start < previous_end {
                return Err(RegionTableError::Overlap { index: i });
            }
            previous_end = region.end;
            i += 1;
        }

        Ok(Self { regions })
    }

    /// The table only holding the sentinel: nothing but registers get dumped.
    pub const fn empty() -> RegionTable<'static> {
        RegionTable {
            regions: &[MemoryRegion::SENTINEL],
        }
    }

    /// Regions before the sentinel, in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'a MemoryRegion> + 'a {
        self.regions.iter().take_while(|r| !r.is_sentinel())
    }

    /// The raw table, sentinel included.
    pub const fn as_slice(&self) -> &'a [MemoryRegion] {
        self.regions
    }

    /// Number of regions, not counting the sentinel.
    pub const fn len(&self) -> usize {
        self.regions.len().saturating_sub(1)
    }

    /// `true` when only the sentinel is present.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes covered by all regions.
    pub fn total_bytes(&self) -> usize {
        self.iter()
            .fold(0usize, |acc, r| acc.saturating_add(r.len_bytes()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn width_governs_line_period() {
        assert_eq!(ElementWidth::Byte.elements_per_line(), 16);
        assert_eq!(ElementWidth::Halfword.elements_per_line(), 8);
        assert_eq!(ElementWidth::Word.elements_per_line(), 4);
        for w in [ElementWidth::Byte, ElementWidth::Halfword, ElementWidth::Word] {
            assert_eq!(w.elements_per_line() * w.bytes(), BYTES_PER_LINE);
            assert_eq!(w.bits() as usize, w.bytes() * 8);
        }
    }

    #[test]
    fn sentinel_is_all_bits_set() {
        assert!(MemoryRegion::SENTINEL.is_sentinel());
        assert_eq!(MemoryRegion::SENTINEL.start, usize::MAX);
        assert_eq!(MemoryRegion::SENTINEL.end, usize::MAX);
        assert_eq!(MemoryRegion::SENTINEL.element_count(), 0);
    }

    #[test]
    fn element_count_uses_width() {
        let r = MemoryRegion::new(0x1000, 0x1010, ElementWidth::Word);
        assert_eq!(r.len_bytes(), 16);
        assert_eq!(r.element_count(), 4);
    }

    #[test]
    fn board_style_table_is_accepted() {
        let regions = [
            MemoryRegion::new(0x2000_2558, 0x2001_0000, ElementWidth::Byte),
            MemoryRegion::SENTINEL,
        ];
        let table = RegionTable::new(&regions).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.total_bytes(), 0x2001_0000 - 0x2000_2558);
    }

    #[test]
    fn iteration_stops_at_sentinel() {
        let regions = [
            MemoryRegion::new(0x100, 0x110, ElementWidth::Byte),
            MemoryRegion::new(0x200, 0x220, ElementWidth::Word),
            MemoryRegion::SENTINEL,
        ];
        let table = RegionTable::new(&regions).unwrap();
        let starts: Vec<usize> = table.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![0x100, 0x200]);
        assert_eq!(table.as_slice().len(), 3);
    }

    #[test]
    fn rejects_empty_table() {
        assert_eq!(RegionTable::new(&[]), Err(RegionTableError::Empty));
    }

    #[test]
    fn rejects_missing_sentinel() {
        let regions = [MemoryRegion::new(0x100, 0x110, ElementWidth::Byte)];
        assert_eq!(
            RegionTable::new(&regions),
            Err(RegionTableError::MissingSentinel)
        );
    }

    #[test]
    fn rejects_early_sentinel() {
        let regions = [
            MemoryRegion::SENTINEL,
            MemoryRegion::new(0x100, 0x110, ElementWidth::Byte),
            MemoryRegion::SENTINEL,
        ];
        assert_eq!(
            RegionTable::new(&regions),
            Err(RegionTableError::EarlySentinel { index: 0 })
        );
    }

    #[test]
    fn rejects_reversed_region() {
        let regions = [
            MemoryRegion::new(0x200, 0x100, ElementWidth::Byte),
            MemoryRegion::SENTINEL,
        ];
        assert_eq!(
            RegionTable::new(&regions),
            Err(RegionTableError::EmptyRegion { index: 0 })
        );
    }

    #[test]
    fn rejects_misaligned_word_region() {
        let regions = [
            MemoryRegion::new(0x102, 0x110, ElementWidth::Word),
            MemoryRegion::SENTINEL,
        ];
        assert_eq!(
            RegionTable::new(&regions),
            Err(RegionTableError::Misaligned { index: 0 })
        );
    }

    #[test]
    fn rejects_overlap() {
        let regions = [
            MemoryRegion::new(0x100, 0x180, ElementWidth::Byte),
            MemoryRegion::new(0x170, 0x200, ElementWidth::Byte),
            MemoryRegion::SENTINEL,
        ];
        assert_eq!(
            RegionTable::new(&regions),
            Err(RegionTableError::Overlap { index: 1 })
        );
    }

    #[test]
    fn empty_table_holds_only_sentinel() {
        let table = RegionTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
    }

    #[test]
    fn from_slice_covers_buffer() {
        let words = [0u32; 4];
        let r = MemoryRegion::from_slice(&words);
        assert_eq!(r.width, ElementWidth::Word);
        assert_eq!(r.len_bytes(), 16);
        assert_eq!(r.element_count(), 4);
    }

    #[test]
    fn error_messages_name_the_entry() {
        let msg = std::format!("{}", RegionTableError::Overlap { index: 3 });
        assert_eq!(msg, "region 3 overlaps or precedes region 2");
    }
}
