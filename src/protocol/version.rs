//! Version ranges.
//!
//! A [`VersionRange`] says "this feature is supported for any version in this
//! closed interval". Endpoints exchange ranges and settle on the highest version
//! both of them cover, which lets clients and servers from different releases
//! keep talking to each other.
use std::fmt;

use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::serializer::{BinarySerializer, Primitive};

/// An unsigned integer usable as a version number.
pub trait VersionNumber: Primitive + Ord + Default + Into<u64> + fmt::Display {}

impl VersionNumber for u8 {}
impl VersionNumber for u16 {}
impl VersionNumber for u32 {}
impl VersionNumber for u64 {}

/// Inclusive `[min, max]` range of supported versions, `min <= max` always holds.
///
/// On the wire a range is two consecutive values of `T`, `min` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VersionRange<T> {
    min: T,
    max: T,
}

impl<T> VersionRange<T> {
    /// Builds a range without checking `min <= max`.
    /// Only used for compile-time constants that are known to be ordered.
    pub(crate) const fn new_unchecked(min: T, max: T) -> Self {
        Self { min, max }
    }
}

impl<T: VersionNumber> VersionRange<T> {
    pub fn new(min: T, max: T) -> ProtocolResult<Self> {
        if min > max {
            return Err(ProtocolError::InvalidVersionRange {
                min: min.into(),
                max: max.into(),
            });
        }
        Ok(Self { min, max })
    }

    /// A range covering exactly one version.
    pub fn single(version: T) -> Self {
        Self {
            min: version,
            max: version,
        }
    }

    pub fn min(&self) -> T {
        self.min
    }

    pub fn max(&self) -> T {
        self.max
    }

    pub fn contains(&self, version: T) -> bool {
        self.min <= version && version <= self.max
    }

    /// The versions covered by both ranges, if any.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        if min <= max {
            Some(Self { min, max })
        } else {
            None
        }
    }

    /// The highest version both ranges cover.
    pub fn negotiate(&self, other: &Self) -> Option<T> {
        self.intersect(other).map(|common| common.max)
    }

    /// Reads or writes `min` then `max`.
    ///
    /// A decoded range with `min > max` is rejected as malformed.
    pub fn serialize(&mut self, serializer: &mut BinarySerializer<'_>) -> ProtocolResult<()> {
        serializer.serialize(&mut self.min)?;
        serializer.serialize(&mut self.max)?;
        if self.min > self.max {
            return Err(ProtocolError::MalformedPacket("version range with min > max"));
        }
        Ok(())
    }
}

impl<T: fmt::Display> fmt::Display for VersionRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
