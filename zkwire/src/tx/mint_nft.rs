use alloy_primitives::{Address, B256, U256, hex};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::error::EncodingError;
use crate::fields::{
    AccountId, Nonce, TokenId, account_id_bytes, format_address, lowercase_address, nonce_bytes,
    token_id_bytes,
};
use crate::pack::pack_fee_checked;
use crate::token::Token;
use crate::tx::{TxSignature, TxType, fee_line, with_nonce};
use crate::version::ProtocolVersion;

/// Creates an NFT identified by `content_hash` and credits it to `recipient`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintNft {
    /// Creator account id.
    pub creator_id: AccountId,
    /// Creator address.
    #[serde(with = "lowercase_address")]
    pub creator_address: Address,
    /// Hash of the NFT content.
    pub content_hash: B256,
    /// Receiver of the new token.
    #[serde(with = "lowercase_address")]
    pub recipient: Address,
    /// Fee in base units of `fee_token`.
    #[serde_as(as = "DisplayFromStr")]
    pub fee: U256,
    /// Token the fee is paid in.
    pub fee_token: TokenId,
    /// Creator nonce.
    pub nonce: Nonce,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<TxSignature>,
}

impl MintNft {
    /// Creates an unsigned mint.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        creator_id: AccountId,
        creator_address: Address,
        content_hash: B256,
        recipient: Address,
        fee: U256,
        fee_token: TokenId,
        nonce: Nonce,
    ) -> Self {
        Self {
            creator_id,
            creator_address,
            content_hash,
            recipient,
            fee,
            fee_token,
            nonce,
            signature: None,
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

    /// Encodes the signing payload. Mints carry no time range.
    ///
    /// # Errors
    ///
    /// Fails in the legacy layout, for out-of-range fields, or for an
    /// unpackable fee.
    pub fn get_bytes(&self, version: ProtocolVersion) -> Result<Vec<u8>, EncodingError> {
        let mut out = TxType::MintNft.header(version)?;
        out.extend_from_slice(&account_id_bytes(self.creator_id)?);
        out.extend_from_slice(self.creator_address.as_slice());
        out.extend_from_slice(self.content_hash.as_slice());
        out.extend_from_slice(self.recipient.as_slice());
        out.extend_from_slice(&token_id_bytes(self.fee_token, version)?);
        out.extend_from_slice(&pack_fee_checked(self.fee)?);
        out.extend_from_slice(&nonce_bytes(self.nonce));
        Ok(out)
    }

    /// Message part for the L1 signer.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::Amount`] if the token's decimals cannot be
    /// rendered.
    pub fn ethereum_sign_message_part(&self, token: &Token) -> Result<String, EncodingError> {
        let mut message = format!(
            "MintNFT 0x{} for: {}",
            hex::encode(self.content_hash),
            format_address(&self.recipient)
        );
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
