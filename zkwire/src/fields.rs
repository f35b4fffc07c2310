//! Typed scalar fields and their fixed-width wire encodings.
//!
//! Every field of a signing payload is big-endian and zero-padded to a
//! width fixed by the protocol version. Range checks happen here so that an
//! invalid field is rejected before anything is handed to a signer.

use alloy_primitives::{Address, hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;

use crate::error::EncodingError;
use crate::version::ProtocolVersion;

/// Prefix of L2 public-key hashes in text form.
pub const PUBKEY_HASH_PREFIX: &str = "sync:";

/// Prefix of Ethereum addresses in text form.
pub const ADDRESS_PREFIX: &str = "0x";

/// Largest account id accepted by the account tree (`2^24 - 1`).
pub const MAX_ACCOUNT_ID: u32 = (1 << 24) - 1;

/// Byte length of addresses and public-key hashes.
pub const ADDRESS_LEN: usize = 20;

macro_rules! numeric_field {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Returns the raw value.
            #[must_use]
            pub const fn inner(&self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl TryFrom<i64> for $name {
            type Error = EncodingError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                <$inner>::try_from(value)
                    .map(Self)
                    .map_err(|_| EncodingError::FieldOutOfRange {
                        field: stringify!($name),
                        value: value.to_string(),
                        max: u64::from(<$inner>::MAX),
                    })
            }
        }
    };
}

numeric_field!(
    /// Account index in the L2 account tree.
    AccountId(u32)
);

numeric_field!(
    /// Token identifier. Ids below `65536` are fungible tokens, the rest NFTs.
    TokenId(u32)
);

numeric_field!(
    /// Per-account replay counter.
    Nonce(u32)
);

/// Encodes an account id as 4 big-endian bytes.
///
/// # Errors
///
/// Returns [`EncodingError::FieldOutOfRange`] for ids above [`MAX_ACCOUNT_ID`].
pub fn account_id_bytes(account_id: AccountId) -> Result<[u8; 4], EncodingError> {
    if account_id.0 > MAX_ACCOUNT_ID {
        return Err(EncodingError::FieldOutOfRange {
            field: "accountId",
            value: account_id.to_string(),
            max: u64::from(MAX_ACCOUNT_ID),
        });
    }
    Ok(account_id.0.to_be_bytes())
}

/// Encodes a token id using the width of the given protocol version.
///
/// # Errors
///
/// Returns [`EncodingError::FieldOutOfRange`] if the id does not fit.
pub fn token_id_bytes(token: TokenId, version: ProtocolVersion) -> Result<Vec<u8>, EncodingError> {
    if u64::from(token.0) > version.max_token_id() {
        return Err(EncodingError::FieldOutOfRange {
            field: "tokenId",
            value: token.to_string(),
            max: version.max_token_id(),
        });
    }
    let bytes = token.0.to_be_bytes();
    Ok(bytes[bytes.len() - version.token_id_width()..].to_vec())
}

/// Encodes a nonce as 4 big-endian bytes.
#[must_use]
pub const fn nonce_bytes(nonce: Nonce) -> [u8; 4] {
    nonce.0.to_be_bytes()
}

/// Decodes a `0x` or `sync:` prefixed 20-byte hex string.
///
/// # Errors
///
/// Returns [`EncodingError::InvalidAddressFormat`] if the prefix is unknown,
/// the hex is malformed, or the decoded length is not 20 bytes.
pub fn decode_address_like(s: &str) -> Result<[u8; ADDRESS_LEN], EncodingError> {
    let body = s
        .strip_prefix(ADDRESS_PREFIX)
        .or_else(|| s.strip_prefix(PUBKEY_HASH_PREFIX))
        .ok_or_else(|| EncodingError::InvalidAddressFormat(format!("unknown prefix in {s:?}")))?;
    let bytes = hex::decode(body)
        .map_err(|e| EncodingError::InvalidAddressFormat(format!("{s:?}: {e}")))?;
    <[u8; ADDRESS_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
        EncodingError::InvalidAddressFormat(format!(
            "{s:?} decodes to {} bytes, expected {ADDRESS_LEN}",
            bytes.len()
        ))
    })
}

/// Parses an Ethereum address from its `0x` form.
///
/// # Errors
///
/// Returns [`EncodingError::InvalidAddressFormat`] on malformed input.
pub fn parse_address(s: &str) -> Result<Address, EncodingError> {
    if !s.starts_with(ADDRESS_PREFIX) {
        return Err(EncodingError::InvalidAddressFormat(format!(
            "address {s:?} must start with {ADDRESS_PREFIX}"
        )));
    }
    decode_address_like(s).map(Address::from)
}

/// Formats an address as lowercase `0x` hex, the form used in messages and JSON.
#[must_use]
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

/// Hash of an L2 public key, the compact identifier of an account's signing key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PubKeyHash(pub [u8; ADDRESS_LEN]);

impl PubKeyHash {
    /// All-zero hash, meaning no signing key is set.
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    /// Builds a hash from a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::InvalidAddressFormat`] unless the slice is 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, EncodingError> {
        <[u8; ADDRESS_LEN]>::try_from(bytes).map(Self).map_err(|_| {
            EncodingError::InvalidAddressFormat(format!(
                "pubkey hash must be {ADDRESS_LEN} bytes, got {}",
                bytes.len()
            ))
        })
    }

    /// Raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Lowercase hex without prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Returns `true` for the all-zero hash.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for PubKeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PUBKEY_HASH_PREFIX}{}", self.to_hex())
    }
}

impl fmt::Debug for PubKeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PubKeyHash({self})")
    }
}

impl FromStr for PubKeyHash {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with(PUBKEY_HASH_PREFIX) {
            return Err(EncodingError::InvalidAddressFormat(format!(
                "pubkey hash {s:?} must start with {PUBKEY_HASH_PREFIX}"
            )));
        }
        decode_address_like(s).map(Self)
    }
}

impl Serialize for PubKeyHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PubKeyHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(de::Error::custom)
    }
}

/// Serde adapter writing addresses as lowercase `0x` hex.
pub mod lowercase_address {
    use super::{Address, format_address, parse_address};
    use serde::{Deserialize, Deserializer, Serializer, de};

    /// Serializes an address in lowercase form.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(address: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_address(address))
    }

    /// Deserializes a `0x` address, accepting any letter case.
    ///
    /// # Errors
    ///
    /// Fails on anything that is not a 20-byte `0x` hex string.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_address(&s).map_err(de::Error::custom)
    }
}
