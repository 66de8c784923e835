//! Limits applied while decoding untrusted input.
//!
//! Every size resolved during a decode (the payload length of a buffer or string, the item
//! count or byte budget of an array, the count of a reserved field) is checked against
//! [Config::lengths] before any byte is read or any memory is reserved. Encoding and
//! length calculation are not constrained.

use crate::Error;
use core::ops::{Bound, RangeBounds};

/// Range of sizes accepted by a decoder.
///
/// # Examples
///
/// ```
/// use wireform_codec::RangeCfg;
///
/// let cfg = RangeCfg::new(0..=1024);
/// assert!(cfg.contains(500));
/// assert!(!cfg.contains(2000));
///
/// let cfg_min = RangeCfg::from(1..);
/// assert!(cfg_min.contains(1));
/// assert!(!cfg_min.contains(0));
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
    /// Creates a new `RangeCfg` from any type implementing `RangeBounds<usize>`.
    pub fn new(r: impl RangeBounds<usize>) -> Self {
        Self {
            start: r.start_bound().cloned(),
            end: r.end_bound().cloned(),
        }
    }

    /// Accepts any size.
    pub const fn unbounded() -> Self {
        Self {
            start: Bound::Unbounded,
            end: Bound::Unbounded,
        }
    }

    /// Returns true if `value` is within this range.
    pub fn contains(&self, value: usize) -> bool {
        match self.start {
            Bound::Included(s) if value < s => return false,
            Bound::Excluded(s) if value <= s => return false,
            _ => {}
        }
        match self.end {
            Bound::Included(e) if value > e => return false,
            Bound::Excluded(e) if value >= e => return false,
            _ => {}
        }
        true
    }
}

impl Default for RangeCfg {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl RangeBounds<usize> for RangeCfg {
    fn start_bound(&self) -> Bound<&usize> {
        self.start.as_ref()
    }

    fn end_bound(&self) -> Bound<&usize> {
        self.end.as_ref()
    }
}

/// Decoder configuration, carried by the traversal [crate::Context].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Config {
    /// Sizes (lengths, counts and byte budgets) a decoder will accept.
    pub lengths: RangeCfg,
}

impl Config {
    /// Creates a configuration that bounds every decoded size by `lengths`.
    pub fn new(lengths: impl Into<RangeCfg>) -> Self {
        Self {
            lengths: lengths.into(),
        }
    }

    /// Returns `len` if it is an accepted size.
    pub fn check(&self, len: usize) -> Result<usize, Error> {
        if !self.lengths.contains(len) {
            return Err(Error::InvalidLength(len));
        }
        Ok(len)
    }
}
