use alloy_primitives::{Address, B256, U256, keccak256};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use std::fmt;

use crate::error::{EncodingError, SigningError};
use crate::fields::{
    AccountId, Nonce, PubKeyHash, TokenId, account_id_bytes, lowercase_address, nonce_bytes,
    token_id_bytes,
};
use crate::pack::pack_fee_checked;
use crate::timestamp::TimeRange;
use crate::token::Token;
use crate::tx::{PackedEthSignature, TxSignature, TxType, fee_line, push_time_range, with_nonce};
use crate::version::ProtocolVersion;

/// Parameters of an account whose address was derived with CREATE2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Create2Data {
    /// Factory that deployed the account contract.
    #[serde(with = "lowercase_address")]
    pub creator_address: Address,
    /// Salt argument mixed with the public-key hash.
    pub salt_arg: B256,
    /// Hash of the account contract init code.
    pub code_hash: B256,
}

impl Create2Data {
    /// Salt used for deployment: `keccak256(saltArg ‖ pkHash)`.
    #[must_use]
    pub fn salt(&self, pk_hash: &PubKeyHash) -> B256 {
        let mut preimage = [0u8; 52];
        preimage[..32].copy_from_slice(self.salt_arg.as_slice());
        preimage[32..].copy_from_slice(pk_hash.as_bytes());
        keccak256(preimage)
    }

    /// Address of the account bound to `pk_hash`.
    #[must_use]
    pub fn address(&self, pk_hash: &PubKeyHash) -> Address {
        self.creator_address
            .create2(self.salt(pk_hash), self.code_hash)
    }
}

/// How an account proves it owns the L1 address behind a key change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuthorizationVariant {
    /// The key hash was registered by an L1 contract call beforehand.
    Onchain,
    /// The L1 key signs the change.
    #[serde(rename = "ECDSA")]
    Ecdsa,
    /// The address is a CREATE2 derivation of the new key; no signature.
    #[serde(rename = "CREATE2")]
    Create2(Create2Data),
}

impl AuthorizationVariant {
    /// Name in the wire and config form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Onchain => "Onchain",
            Self::Ecdsa => "ECDSA",
            Self::Create2(_) => "CREATE2",
        }
    }

    /// Parses a variant name. `CREATE2` needs its derivation parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::UnknownAuthorizationVariant`] for any other
    /// name, or for `CREATE2` without parameters.
    pub fn parse(name: &str, create2: Option<Create2Data>) -> Result<Self, SigningError> {
        match (name.to_ascii_uppercase().as_str(), create2) {
            ("ONCHAIN", _) => Ok(Self::Onchain),
            ("ECDSA", _) => Ok(Self::Ecdsa),
            ("CREATE2", Some(data)) => Ok(Self::Create2(data)),
            ("CREATE2", None) => Err(SigningError::UnknownAuthorizationVariant(
                "CREATE2 without creator address, salt and code hash".to_string(),
            )),
            _ => Err(SigningError::UnknownAuthorizationVariant(name.to_string())),
        }
    }
}

impl fmt::Display for AuthorizationVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization attached to a signed key change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ChangePubKeyAuthData {
    /// Registered on L1 beforehand.
    Onchain,
    /// Signed by the L1 key.
    #[serde(rename = "ECDSA")]
    Ecdsa {
        /// Signature over the eth signed data.
        eth_signature: PackedEthSignature,
        /// Hash of the enclosing batch, zero outside batches.
        batch_hash: B256,
    },
    /// CREATE2 derivation.
    #[serde(rename = "CREATE2")]
    Create2(Create2Data),
}

impl ChangePubKeyAuthData {
    /// The 32 bytes bound into the eth signed data.
    #[must_use]
    pub const fn auth_bytes(&self) -> B256 {
        match self {
            Self::Onchain => B256::ZERO,
            Self::Ecdsa { batch_hash, .. } => *batch_hash,
            Self::Create2(data) => data.salt_arg,
        }
    }
}

/// Auth bytes for a variant before any signature exists.
#[must_use]
pub(crate) const fn variant_auth_bytes(
    variant: &AuthorizationVariant,
    batch_hash: Option<B256>,
) -> B256 {
    match variant {
        AuthorizationVariant::Onchain => B256::ZERO,
        AuthorizationVariant::Ecdsa => match batch_hash {
            Some(hash) => hash,
            None => B256::ZERO,
        },
        AuthorizationVariant::Create2(data) => data.salt_arg,
    }
}

/// Sets a new L2 signing key for an account.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePubKey {
    /// Account id.
    pub account_id: AccountId,
    /// Account address.
    #[serde(with = "lowercase_address")]
    pub account: Address,
    /// Hash of the new L2 public key.
    pub new_pk_hash: PubKeyHash,
    /// Token the fee is paid in.
    pub fee_token: TokenId,
    /// Fee in base units of `fee_token`.
    #[serde_as(as = "DisplayFromStr")]
    pub fee: U256,
    /// Account nonce.
    pub nonce: Nonce,
    /// Validity window, current layout only.
    #[serde(flatten)]
    pub time_range: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<TxSignature>,
    /// L1 signature in the legacy layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    eth_signature: Option<PackedEthSignature>,
    /// L1 authorization in the current layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    eth_auth_data: Option<ChangePubKeyAuthData>,
}

impl ChangePubKey {
    /// Creates an unsigned key change.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        account_id: AccountId,
        account: Address,
        new_pk_hash: PubKeyHash,
        fee_token: TokenId,
        fee: U256,
        nonce: Nonce,
        time_range: Option<TimeRange>,
    ) -> Self {
        Self {
            account_id,
            account,
            new_pk_hash,
            fee_token,
            fee,
            nonce,
            time_range,
            signature: None,
            eth_signature: None,
            eth_auth_data: None,
        }
    }

    /// The L2 signature, once attached.
    #[must_use]
    pub const fn signature(&self) -> Option<&TxSignature> {
        self.signature.as_ref()
    }

    pub(crate) fn set_signature(&mut self, signature: TxSignature) {
        self.signature = Some(signature);
    }

    /// L1 signature of a legacy key change.
    #[must_use]
    pub const fn eth_signature(&self) -> Option<&PackedEthSignature> {
        self.eth_signature.as_ref()
    }

    /// L1 authorization of a current key change.
    #[must_use]
    pub const fn eth_auth_data(&self) -> Option<&ChangePubKeyAuthData> {
        self.eth_auth_data.as_ref()
    }

    pub(crate) fn set_eth_authorization(
        &mut self,
        version: ProtocolVersion,
        auth_data: ChangePubKeyAuthData,
    ) {
        match version {
            ProtocolVersion::Legacy => {
                if let ChangePubKeyAuthData::Ecdsa { eth_signature, .. } = auth_data {
                    self.eth_signature = Some(eth_signature);
                }
            }
            ProtocolVersion::Current => self.eth_auth_data = Some(auth_data),
        }
    }

    /// Encodes the signing payload.
    ///
    /// # Errors
    ///
    /// Fails if a field is out of range or the fee is not packable.
    pub fn get_bytes(&self, version: ProtocolVersion) -> Result<Vec<u8>, EncodingError> {
        let mut out = TxType::ChangePubKey.header(version)?;
        out.extend_from_slice(&account_id_bytes(self.account_id)?);
        out.extend_from_slice(self.account.as_slice());
        out.extend_from_slice(self.new_pk_hash.as_bytes());
        out.extend_from_slice(&token_id_bytes(self.fee_token, version)?);
        out.extend_from_slice(&pack_fee_checked(self.fee)?);
        out.extend_from_slice(&nonce_bytes(self.nonce));
        push_time_range(&mut out, version, self.time_range);
        Ok(out)
    }

    /// Data the L1 key signs to authorize the change.
    ///
    /// The current layout binds `pkHash ‖ nonce ‖ accountId ‖ authBytes`
    /// (60 bytes); the legacy layout signs a fixed text.
    ///
    /// # Errors
    ///
    /// Fails if the account id is out of range.
    pub fn get_eth_signed_data(
        &self,
        version: ProtocolVersion,
        auth_bytes: B256,
    ) -> Result<Vec<u8>, EncodingError> {
        let account_id = account_id_bytes(self.account_id)?;
        match version {
            ProtocolVersion::Current => {
                let mut out = Vec::with_capacity(60);
                out.extend_from_slice(self.new_pk_hash.as_bytes());
                out.extend_from_slice(&nonce_bytes(self.nonce));
                out.extend_from_slice(&account_id);
                out.extend_from_slice(auth_bytes.as_slice());
                Ok(out)
            }
            ProtocolVersion::Legacy => Ok(format!(
                "Register zkSync pubkey:\n\n{}\nnonce: 0x{:08x}\naccount id: 0x{:08x}\n\n\
                 Only sign this message for a trusted client!",
                self.new_pk_hash.to_hex(),
                self.nonce.inner(),
                self.account_id.inner(),
            )
            .into_bytes()),
        }
    }

    /// Message part for the L1 signer.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::Amount`] if the token's decimals cannot be
    /// rendered.
    pub fn ethereum_sign_message_part(&self, token: &Token) -> Result<String, EncodingError> {
        let mut message = format!("Set signing key: {}", self.new_pk_hash.to_hex());
        message.push_str(&fee_line(self.fee, token)?);
        Ok(message)
    }

    /// Full message for the L1 signer.
    ///
    /// # Errors
    ///
    /// Fails like [`ethereum_sign_message_part`](Self::ethereum_sign_message_part).
    pub fn ethereum_sign_message(&self, token: &Token) -> Result<String, EncodingError> {
        Ok(with_nonce(&self.ethereum_sign_message_part(token)?, self.nonce))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, hex};

    fn change_pubkey() -> ChangePubKey {
        ChangePubKey::new(
            AccountId(44),
            address!("0xede35562d3555e61120a151b3c8e8e91d83a378a"),
            PubKeyHash([0x33; 20]),
            TokenId(0),
            U256::from(1_000u64),
            Nonce(3),
            Some(TimeRange::default()),
        )
    }

    fn create2() -> Create2Data {
        Create2Data {
            creator_address: address!("0x5fbdb2315678afecb367f032d93f642f64180aa3"),
            salt_arg: B256::repeat_byte(0x11),
            code_hash: B256::repeat_byte(0x22),
        }
    }

    #[test]
    fn test_current_layout() {
        let bytes = change_pubkey().get_bytes(ProtocolVersion::Current).unwrap();
        let expected = hex::decode(concat!(
            "f801",
            "0000002c",
            "ede35562d3555e61120a151b3c8e8e91d83a378a",
            "3333333333333333333333333333333333333333",
            "00000000",
            "00be",
            "00000003",
            "0000000000000000ffffffffffffffff",
        ))
        .unwrap();
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_legacy_layout() {
        let bytes = change_pubkey().get_bytes(ProtocolVersion::Legacy).unwrap();
        assert_eq!(bytes[0], 0x07);
        assert_eq!(bytes.len(), 1 + 4 + 20 + 20 + 2 + 2 + 4);
    }

    #[test]
    fn test_eth_signed_data_current() {
        let data = change_pubkey()
            .get_eth_signed_data(ProtocolVersion::Current, B256::repeat_byte(0x44))
            .unwrap();
        assert_eq!(data.len(), 60);
        assert_eq!(data[..20], [0x33; 20]);
        assert_eq!(data[20..24], [0, 0, 0, 3]);
        assert_eq!(data[24..28], [0, 0, 0, 44]);
        assert_eq!(data[28..], [0x44; 32]);
    }

    #[test]
    fn test_eth_signed_data_legacy() {
        let data = change_pubkey()
            .get_eth_signed_data(ProtocolVersion::Legacy, B256::ZERO)
            .unwrap();
        assert_eq!(
            String::from_utf8(data).unwrap(),
            "Register zkSync pubkey:\n\n\
             3333333333333333333333333333333333333333\n\
             nonce: 0x00000003\n\
             account id: 0x0000002c\n\n\
             Only sign this message for a trusted client!"
        );
    }

    #[test]
    fn test_message() {
        assert_eq!(
            change_pubkey().ethereum_sign_message(&Token::eth()).unwrap(),
            "Set signing key: 3333333333333333333333333333333333333333\n\
             Fee: 0.000000000000001 ETH\n\
             Nonce: 3"
        );
    }

    #[test]
    fn test_create2_address() {
        let data = create2();
        let pk_hash = PubKeyHash([0x33; 20]);
        assert_eq!(
            data.salt(&pk_hash),
            b256!("0xfcb74519dea4f650589ce7913235709b83946be26b09b1bad984c7c75ccf593f")
        );
        assert_eq!(
            data.address(&pk_hash),
            address!("0xfaa50dec0efd0e039cc9a2f14309980c7a83dfbe")
        );
    }

    #[test]
    fn test_auth_bytes() {
        assert_eq!(ChangePubKeyAuthData::Onchain.auth_bytes(), B256::ZERO);
        assert_eq!(
            ChangePubKeyAuthData::Create2(create2()).auth_bytes(),
            B256::repeat_byte(0x11)
        );
        assert_eq!(
            variant_auth_bytes(&AuthorizationVariant::Ecdsa, None),
            B256::ZERO
        );
        assert_eq!(
            variant_auth_bytes(&AuthorizationVariant::Ecdsa, Some(B256::repeat_byte(9))),
            B256::repeat_byte(9)
        );
    }

    #[test]
    fn test_parse_authorization_variant() {
        assert_eq!(
            AuthorizationVariant::parse("ECDSA", None).unwrap(),
            AuthorizationVariant::Ecdsa
        );
        assert_eq!(
            AuthorizationVariant::parse("onchain", None).unwrap(),
            AuthorizationVariant::Onchain
        );
        assert!(matches!(
            AuthorizationVariant::parse("CREATE2", Some(create2())),
            Ok(AuthorizationVariant::Create2(_))
        ));
        assert!(matches!(
            AuthorizationVariant::parse("CREATE2", None),
            Err(SigningError::UnknownAuthorizationVariant(_))
        ));
        assert!(matches!(
            AuthorizationVariant::parse("Multisig", None),
            Err(SigningError::UnknownAuthorizationVariant(name)) if name == "Multisig"
        ));
    }

    #[test]
    fn test_auth_data_json() {
        let json = serde_json::to_value(ChangePubKeyAuthData::Create2(create2())).unwrap();
        assert_eq!(json["type"], "CREATE2");
        assert_eq!(
            json["creatorAddress"],
            "0x5fbdb2315678afecb367f032d93f642f64180aa3"
        );
        assert_eq!(json["saltArg"], format!("0x{}", "11".repeat(32)));

        let ecdsa = ChangePubKeyAuthData::Ecdsa {
            eth_signature: PackedEthSignature([1; 65]),
            batch_hash: B256::ZERO,
        };
        let json = serde_json::to_value(ecdsa).unwrap();
        assert_eq!(json["type"], "ECDSA");
        assert!(json.get("ethSignature").is_some());
        assert!(json.get("batchHash").is_some());

        let onchain: ChangePubKeyAuthData = serde_json::from_str(r#"{"type":"Onchain"}"#).unwrap();
        assert_eq!(onchain, ChangePubKeyAuthData::Onchain);
    }
}
