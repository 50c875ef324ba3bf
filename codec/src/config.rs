//! Configuration for length-prefixed values.

use core::ops::{Bound, RangeBounds};

/// Configuration for limiting the range of a decoded length.
///
/// Length prefixes come from untrusted input. Bounding them before any bytes are
/// viewed or copied keeps a malformed prefix from requesting an arbitrary allocation.
///
/// # Examples
///
/// ```
/// use bytecraft_codec::RangeCfg;
///
/// let cfg = RangeCfg::new(0..=1024);
/// assert!(cfg.contains(500));
/// assert!(!cfg.contains(2000));
///
/// let any: RangeCfg = (..).into();
/// assert!(any.contains(usize::MAX));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RangeCfg {
    start: Bound<usize>,
    end: Bound<usize>,
}

macro_rules! impl_range_from {
    ($($range:ty),*) => {
        $(
            impl From<$range> for RangeCfg {
                fn from(r: $range) -> Self {
                    Self::new(r)
                }
            }
        )*
    };
}

impl_range_from!(
    core::ops::Range<usize>,
    core::ops::RangeInclusive<usize>,
    core::ops::RangeFrom<usize>,
    core::ops::RangeTo<usize>,
    core::ops::RangeToInclusive<usize>,
    core::ops::RangeFull
);

impl RangeCfg {
    /// Creates a new `RangeCfg` from any range of lengths.
    pub fn new(r: impl RangeBounds<usize>) -> Self {
        RangeCfg {
            start: r.start_bound().cloned(),
            end: r.end_bound().cloned(),
        }
    }

    /// Creates a `RangeCfg` that only accepts exactly `len`.
    pub fn exact(len: usize) -> Self {
        Self {
            start: Bound::Included(len),
            end: Bound::Included(len),
        }
    }

    /// Returns true if `len` is within this range.
    pub fn contains(&self, len: usize) -> bool {
        match self.start {
            Bound::Included(s) if len < s => return false,
            Bound::Excluded(s) if len <= s => return false,
            _ => {}
        }
        match self.end {
            Bound::Included(e) if len > e => return false,
            Bound::Excluded(e) if len >= e => return false,
            _ => {}
        }
        true
    }
}

impl Default for RangeCfg {
    fn default() -> Self {
        Self::new(..)
    }
}

/// Width and byte order of an integer length prefix.
///
/// Variable-length values (bytes, text) are never null-terminated: they are preceded by
/// their byte length, written with a width chosen by the format author.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LengthPrefix {
    U8,
    U16,
    U16Le,
    U32,
    U32Le,
    U64,
    U64Le,
}

impl LengthPrefix {
    /// Number of bytes occupied by the prefix itself.
    pub const fn width(self) -> usize {
        match self {
            LengthPrefix::U8 => 1,
            LengthPrefix::U16 | LengthPrefix::U16Le => 2,
            LengthPrefix::U32 | LengthPrefix::U32Le => 4,
            LengthPrefix::U64 | LengthPrefix::U64Le => 8,
        }
    }
}
