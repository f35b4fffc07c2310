//! Unix timestamps and transaction validity windows.
//!
//! Transactions in the current protocol layout carry a [`TimeRange`]: the
//! network only executes them inside `[valid_from, valid_until]`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::SystemTime;

/// A Unix timestamp in seconds since 1970-01-01T00:00:00Z.
///
/// Serialized as a JSON number, as the network expects for `validFrom`
/// and `validUntil`.
#[derive(
    Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnixTimestamp(u64);

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

impl UnixTimestamp {
    /// The latest representable timestamp.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates a new [`UnixTimestamp`] from a raw seconds value.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the current system time as a [`UnixTimestamp`].
    ///
    /// A clock set before the epoch reads as zero.
    #[must_use]
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self(now)
    }

    /// Returns the timestamp as raw seconds since the Unix epoch.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }
}

/// Validity window of a transaction, both bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    /// Earliest execution time.
    pub valid_from: UnixTimestamp,
    /// Latest execution time.
    pub valid_until: UnixTimestamp,
}

impl Default for TimeRange {
    /// A window that is always open.
    fn default() -> Self {
        Self {
            valid_from: UnixTimestamp::from_secs(0),
            valid_until: UnixTimestamp::MAX,
        }
    }
}

impl TimeRange {
    /// Creates a window from raw seconds.
    #[must_use]
    pub const fn new(valid_from: u64, valid_until: u64) -> Self {
        Self {
            valid_from: UnixTimestamp::from_secs(valid_from),
            valid_until: UnixTimestamp::from_secs(valid_until),
        }
    }

    /// A window opening now and closing after `secs` seconds.
    #[must_use]
    pub fn valid_for(secs: u64) -> Self {
        let now = UnixTimestamp::now();
        Self {
            valid_from: now,
            valid_until: now + secs,
        }
    }

    /// Returns `true` if `at` lies inside the window.
    #[must_use]
    pub fn contains(&self, at: UnixTimestamp) -> bool {
        self.valid_from <= at && at <= self.valid_until
    }

    /// Encodes the window as `valid_from ‖ valid_until`, 8 bytes each, big-endian.
    #[must_use]
    pub fn to_be_bytes(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[..8].copy_from_slice(&self.valid_from.as_secs().to_be_bytes());
        out[8..].copy_from_slice(&self.valid_until.as_secs().to_be_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_range_is_open() {
        let range = TimeRange::default();
        assert!(range.contains(UnixTimestamp::now()));
        assert_eq!(
            range.to_be_bytes(),
            [0, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn test_range_bytes_are_big_endian() {
        let bytes = TimeRange::new(0x0102, 0x0304).to_be_bytes();
        assert_eq!(bytes[6..8], [0x01, 0x02]);
        assert_eq!(bytes[14..], [0x03, 0x04]);
    }

    #[test]
    fn test_range_serializes_as_numbers() {
        let json = serde_json::to_string(&TimeRange::new(10, 20)).unwrap();
        assert_eq!(json, r#"{"validFrom":10,"validUntil":20}"#);
    }

    #[test]
    fn test_add_saturates() {
        assert_eq!(UnixTimestamp::MAX + 5, UnixTimestamp::MAX);
    }
}
