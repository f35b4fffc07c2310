//! Signature values attached to transactions.

use alloy_primitives::{Bytes, Signature, hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;

/// Length of a packed L2 public key.
pub const PUBKEY_LEN: usize = 32;

/// Length of a packed L2 signature.
pub const SIGNATURE_LEN: usize = 64;

/// Length of an `r ‖ s ‖ v` Ethereum signature.
pub const ETH_SIGNATURE_LEN: usize = 65;

macro_rules! hex_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Builds the value from a slice of the exact length.
            ///
            /// # Errors
            ///
            /// Returns the actual length when it is wrong.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, usize> {
                <[u8; $len]>::try_from(bytes).map(Self).map_err(|_| bytes.len())
            }

            /// Raw bytes.
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(self.0))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(self.0))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                let bytes = hex::decode(&s).map_err(de::Error::custom)?;
                Self::from_slice(&bytes).map_err(|len| {
                    de::Error::custom(format!(
                        "{} must be {} bytes, got {len}",
                        stringify!($name),
                        $len
                    ))
                })
            }
        }
    };
}

hex_bytes!(
    /// Packed L2 public key, serialized as bare hex.
    PackedPublicKey,
    PUBKEY_LEN
);

hex_bytes!(
    /// Packed L2 signature, serialized as bare hex.
    PackedSignature,
    SIGNATURE_LEN
);

/// L2 signature attached to a transaction: the signer's key and the signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxSignature {
    /// Public key the signature verifies against.
    pub pub_key: PackedPublicKey,
    /// The signature bytes.
    pub signature: PackedSignature,
}

/// A 65-byte `r ‖ s ‖ v` Ethereum signature, serialized as `0x` hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedEthSignature(pub [u8; ETH_SIGNATURE_LEN]);

impl PackedEthSignature {
    /// Parses the signature into its components.
    ///
    /// # Errors
    ///
    /// Fails if `v` or the scalars are malformed.
    pub fn to_signature(&self) -> Result<Signature, alloy_primitives::SignatureError> {
        Signature::from_raw(&self.0)
    }

    /// Raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ETH_SIGNATURE_LEN] {
        &self.0
    }
}

impl From<Signature> for PackedEthSignature {
    fn from(signature: Signature) -> Self {
        Self(signature.as_bytes())
    }
}

impl fmt::Debug for PackedEthSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackedEthSignature(0x{})", hex::encode(self.0))
    }
}

impl Serialize for PackedEthSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for PackedEthSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(de::Error::custom)?;
        <[u8; ETH_SIGNATURE_LEN]>::try_from(bytes.as_slice())
            .map(Self)
            .map_err(|_| {
                de::Error::custom(format!(
                    "eth signature must be {ETH_SIGNATURE_LEN} bytes, got {}",
                    bytes.len()
                ))
            })
    }
}

/// An L1 signature over a transaction message.
///
/// A missing signature (an account whose address is derived with CREATE2)
/// is represented as `Option::None` by the holders of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "signature")]
pub enum TxEthSignature {
    /// ECDSA signature of an externally owned account.
    EthereumSignature(PackedEthSignature),
    /// Signature checked by the account contract through EIP-1271.
    #[serde(rename = "EIP1271Signature")]
    Eip1271Signature(Bytes),
}

impl TxEthSignature {
    /// Raw signature bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::EthereumSignature(sig) => sig.as_bytes(),
            Self::Eip1271Signature(bytes) => bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_signature_json() {
        let signature = TxSignature {
            pub_key: PackedPublicKey([0x11; PUBKEY_LEN]),
            signature: PackedSignature([0x22; SIGNATURE_LEN]),
        };
        let json = serde_json::to_value(signature).unwrap();
        assert_eq!(json["pubKey"], "11".repeat(PUBKEY_LEN));
        assert_eq!(json["signature"], "22".repeat(SIGNATURE_LEN));
        let back: TxSignature = serde_json::from_value(json).unwrap();
        assert_eq!(back, signature);
    }

    #[test]
    fn test_eth_signature_json() {
        let sig = TxEthSignature::EthereumSignature(PackedEthSignature([0xab; ETH_SIGNATURE_LEN]));
        let json = serde_json::to_value(&sig).unwrap();
        assert_eq!(json["type"], "EthereumSignature");
        assert_eq!(json["signature"], format!("0x{}", "ab".repeat(ETH_SIGNATURE_LEN)));

        let contract = TxEthSignature::Eip1271Signature(Bytes::from(vec![1u8, 2, 3]));
        let json = serde_json::to_value(&contract).unwrap();
        assert_eq!(json["type"], "EIP1271Signature");
        assert_eq!(json["signature"], "0x010203");
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(serde_json::from_str::<PackedPublicKey>("\"abcd\"").is_err());
        assert_eq!(PackedSignature::from_slice(&[0u8; 3]), Err(3));
    }
}
