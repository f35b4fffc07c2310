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

/// Withdraws the whole `token` balance of a target account to L1, on the
/// initiator's request. The initiator pays the fee.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForcedExit {
    /// Account paying the fee.
    pub initiator_account_id: AccountId,
    /// Account being exited.
    #[serde(with = "lowercase_address")]
    pub target: Address,
    /// Token withdrawn.
    pub token: TokenId,
    /// Fee in base units of `token`.
    #[serde_as(as = "DisplayFromStr")]
    pub fee: U256,
    /// Initiator nonce.
    pub nonce: Nonce,
    /// Validity window, current layout only.
    #[serde(flatten)]
    pub time_range: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<TxSignature>,
}

impl ForcedExit {
    /// Creates an unsigned forced exit.
    #[must_use]
    pub const fn new(
        initiator_account_id: AccountId,
        target: Address,
        token: TokenId,
        fee: U256,
        nonce: Nonce,
        time_range: Option<TimeRange>,
    ) -> Self {
        Self {
            initiator_account_id,
            target,
            token,
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
    /// Fails if a field is out of range or the fee is not packable.
    pub fn get_bytes(&self, version: ProtocolVersion) -> Result<Vec<u8>, EncodingError> {
        let mut out = TxType::ForcedExit.header(version)?;
        out.extend_from_slice(&account_id_bytes(self.initiator_account_id)?);
        out.extend_from_slice(self.target.as_slice());
        out.extend_from_slice(&token_id_bytes(self.token, version)?);
        out.extend_from_slice(&pack_fee_checked(self.fee)?);
        out.extend_from_slice(&nonce_bytes(self.nonce));
        push_time_range(&mut out, version, self.time_range);
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
            "ForcedExit {} to: {}",
            token.symbol,
            format_address(&self.target)
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
