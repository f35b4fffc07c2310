//! Protocol versions of the signing payload.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version byte written after the opcode by [`ProtocolVersion::Current`].
pub const CURRENT_TX_VERSION: u8 = 1;

/// Layout family of the binary signing payload.
///
/// The network changed the payload when it added NFTs and swaps: opcodes
/// moved to `0xff - type`, a version byte was added, token ids grew from
/// two to four bytes, and most transactions gained a validity time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProtocolVersion {
    /// Original layout: type byte as opcode, 2-byte token ids, no time range.
    Legacy,
    /// Layout after the NFT upgrade.
    #[default]
    Current,
}

impl ProtocolVersion {
    /// Width in bytes of a token id field.
    #[must_use]
    pub const fn token_id_width(&self) -> usize {
        match self {
            Self::Legacy => 2,
            Self::Current => 4,
        }
    }

    /// Largest token id representable in the token id field.
    #[must_use]
    pub const fn max_token_id(&self) -> u64 {
        match self {
            Self::Legacy => u16::MAX as u64,
            Self::Current => u32::MAX as u64,
        }
    }

    /// Returns `true` if payloads carry a version byte and a time range.
    #[must_use]
    pub const fn has_time_range(&self) -> bool {
        matches!(self, Self::Current)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => f.write_str("legacy"),
            Self::Current => f.write_str("current"),
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(Self::Legacy),
            "current" => Ok(Self::Current),
            other => Err(format!("unknown protocol version '{other}'")),
        }
    }
}
