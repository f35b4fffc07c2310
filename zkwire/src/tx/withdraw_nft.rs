use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::error::EncodingError;
use crate::fields::{
    AccountId, Nonce, TokenId, account_id_bytes, format_address, lowercase_address, nonce_bytes,
    token_id_bytes,
};
use crate::pack::pack_fee_checked;
use crate::timestamp::TimeRange;
use crate::token::Token;
use crate::tx::{TxSignature, TxType, fee_line, push_time_range, with_nonce};
use crate::version::ProtocolVersion;

/// Withdraws an NFT to an L1 address.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawNft {
    /// Owner account id.
    pub account_id: AccountId,
    /// Owner address.
    #[serde(with = "lowercase_address")]
    pub from: Address,
    /// L1 recipient.
    #[serde(with = "lowercase_address")]
    pub to: Address,
    /// NFT token id.
    pub token: TokenId,
    /// Token the fee is paid in.
    pub fee_token: TokenId,
    /// Fee in base units of `fee_token`.
    #[serde_as(as = "DisplayFromStr")]
    pub fee: U256,
    /// Owner nonce.
    pub nonce: Nonce,
    /// Validity window.
    #[serde(flatten)]
    pub time_range: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<TxSignature>,
}

impl WithdrawNft {
    /// Creates an unsigned NFT withdrawal.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        account_id: AccountId,
        from: Address,
        to: Address,
        token: TokenId,
        fee_token: TokenId,
        fee: U256,
        nonce: Nonce,
        time_range: Option<TimeRange>,
    ) -> Self {
        Self {
            account_id,
            from,
            to,
            token,
            fee_token,
            fee,
            nonce,
            time_range,
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

    /// Encodes the signing payload.
    ///
    /// # Errors
    ///
    /// Fails in the legacy layout, for out-of-range fields, or for an
    /// unpackable fee.
    pub fn get_bytes(&self, version: ProtocolVersion) -> Result<Vec<u8>, EncodingError> {
        let mut out = TxType::WithdrawNft.header(version)?;
        out.extend_from_slice(&account_id_bytes(self.account_id)?);
        out.extend_from_slice(self.from.as_slice());
        out.extend_from_slice(self.to.as_slice());
        out.extend_from_slice(&token_id_bytes(self.token, version)?);
        out.extend_from_slice(&token_id_bytes(self.fee_token, version)?);
        out.extend_from_slice(&pack_fee_checked(self.fee)?);
        out.extend_from_slice(&nonce_bytes(self.nonce));
        push_time_range(&mut out, version, self.time_range);
        Ok(out)
    }

    /// Message part for the L1 signer; `fee_token` prices the fee line.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::Amount`] if the fee token's decimals cannot
    /// be rendered.
    pub fn ethereum_sign_message_part(
        &self,
        fee_token: &Token,
    ) -> Result<String, EncodingError> {
        let mut message = format!(
            "WithdrawNFT {} to: {}",
            self.token,
            format_address(&self.to)
        );
        message.push_str(&fee_line(self.fee, fee_token)?);
        Ok(message)
    }

    /// Full message for the L1 signer.
    ///
    /// # Errors
    ///
    /// Fails like [`ethereum_sign_message_part`](Self::ethereum_sign_message_part).
    pub fn ethereum_sign_message(&self, fee_token: &Token) -> Result<String, EncodingError> {
        Ok(with_nonce(&self.ethereum_sign_message_part(fee_token)?, self.nonce))
    }
}
