use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::error::EncodingError;
use crate::fields::{
    AccountId, Nonce, TokenId, account_id_bytes, lowercase_address, nonce_bytes, token_id_bytes,
};
use crate::pack::{pack_amount_checked, pack_fee_checked};
use crate::token::Token;
use crate::tx::{Order, TxSignature, TxType, with_nonce};
use crate::version::ProtocolVersion;

/// Settles two matching orders; the submitter pays the fee.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Swap {
    /// Submitter account id.
    pub submitter_id: AccountId,
    /// Submitter address.
    #[serde(with = "lowercase_address")]
    pub submitter_address: Address,
    /// Submitter nonce.
    pub nonce: Nonce,
    /// The two orders, each signed by its maker.
    pub orders: (Order, Order),
    /// Amount filled from each order.
    #[serde_as(as = "(DisplayFromStr, DisplayFromStr)")]
    pub amounts: (U256, U256),
    /// Fee in base units of `fee_token`.
    #[serde_as(as = "DisplayFromStr")]
    pub fee: U256,
    /// Token the fee is paid in.
    pub fee_token: TokenId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<TxSignature>,
}

impl Swap {
    /// Creates an unsigned swap.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        submitter_id: AccountId,
        submitter_address: Address,
        nonce: Nonce,
        orders: (Order, Order),
        amounts: (U256, U256),
        fee: U256,
        fee_token: TokenId,
    ) -> Self {
        Self {
            submitter_id,
            submitter_address,
            nonce,
            orders,
            amounts,
            fee,
            fee_token,
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

    /// Concatenated payloads of both orders, the input of the orders hash.
    ///
    /// # Errors
    ///
    /// Propagates encoding failures of either order.
    pub fn orders_bytes(&self, version: ProtocolVersion) -> Result<Vec<u8>, EncodingError> {
        let mut out = self.orders.0.get_bytes(version)?;
        out.extend_from_slice(&self.orders.1.get_bytes(version)?);
        Ok(out)
    }

    /// Encodes the signing payload around a precomputed orders hash.
    ///
    /// # Errors
    ///
    /// Fails in the legacy layout, for out-of-range fields, or for an
    /// unpackable fee or amount.
    pub fn get_bytes(
        &self,
        version: ProtocolVersion,
        orders_hash: &[u8],
    ) -> Result<Vec<u8>, EncodingError> {
        let mut out = TxType::Swap.header(version)?;
        out.extend_from_slice(&account_id_bytes(self.submitter_id)?);
        out.extend_from_slice(self.submitter_address.as_slice());
        out.extend_from_slice(&nonce_bytes(self.nonce));
        out.extend_from_slice(orders_hash);
        out.extend_from_slice(&token_id_bytes(self.fee_token, version)?);
        out.extend_from_slice(&pack_fee_checked(self.fee)?);
        out.extend_from_slice(&pack_amount_checked(self.amounts.0)?);
        out.extend_from_slice(&pack_amount_checked(self.amounts.1)?);
        Ok(out)
    }

    /// Message part for the submitter's L1 signature.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::Amount`] if the fee token's decimals cannot
    /// be rendered.
    pub fn ethereum_sign_message_part(
        &self,
        fee_token: &Token,
    ) -> Result<String, EncodingError> {
        Ok(format!("Swap fee: {} {}", fee_token.format(self.fee)?, fee_token.symbol))
    }

    /// Full message for the submitter's L1 signature.
    ///
    /// # Errors
    ///
    /// Fails like [`ethereum_sign_message_part`](Self::ethereum_sign_message_part).
    pub fn ethereum_sign_message(&self, fee_token: &Token) -> Result<String, EncodingError> {
        Ok(with_nonce(&self.ethereum_sign_message_part(fee_token)?, self.nonce))
    }

    pub(crate) fn orders_mut(&mut self) -> (&mut Order, &mut Order) {
        (&mut self.orders.0, &mut self.orders.1)
    }
}
