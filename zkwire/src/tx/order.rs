use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::error::EncodingError;
use crate::fields::{
    AccountId, Nonce, TokenId, account_id_bytes, format_address, lowercase_address, nonce_bytes,
    token_id_bytes,
};
use crate::pack::pack_amount_checked;
use crate::timestamp::TimeRange;
use crate::token::Token;
use crate::tx::{TxSignature, TxType, push_time_range};
use crate::version::ProtocolVersion;

/// Width of one ratio component.
pub const RATIO_BYTES: usize = 15;

/// Encodes a ratio component as 15 big-endian bytes.
///
/// # Errors
///
/// Returns [`EncodingError::FieldTooLarge`] above `2^120 - 1`.
pub fn ratio_bytes(value: U256) -> Result<[u8; RATIO_BYTES], EncodingError> {
    let full = value.to_be_bytes::<32>();
    let (high, low) = full.split_at(32 - RATIO_BYTES);
    if high.iter().any(|b| *b != 0) {
        return Err(EncodingError::FieldTooLarge {
            field: "ratio",
            width: RATIO_BYTES,
        });
    }
    let mut out = [0u8; RATIO_BYTES];
    out.copy_from_slice(low);
    Ok(out)
}

/// A limit order: sell `token_sell` for `token_buy` at `ratio`.
///
/// Orders are signed on their own and settled by a [`Swap`](super::Swap).
/// A zero `amount` leaves the order open for any fill size.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Maker account id.
    pub account_id: AccountId,
    /// Receiver of the bought token.
    #[serde(with = "lowercase_address")]
    pub recipient: Address,
    /// Maker nonce.
    pub nonce: Nonce,
    /// Token bought.
    pub token_buy: TokenId,
    /// Token sold.
    pub token_sell: TokenId,
    /// `sell:buy` exchange ratio in base units.
    #[serde_as(as = "(DisplayFromStr, DisplayFromStr)")]
    pub ratio: (U256, U256),
    /// Amount sold, zero for a limit order.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: U256,
    /// Validity window.
    #[serde(flatten)]
    pub time_range: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<TxSignature>,
}

impl Order {
    /// Creates an unsigned order.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        account_id: AccountId,
        recipient: Address,
        nonce: Nonce,
        token_sell: TokenId,
        token_buy: TokenId,
        ratio: (U256, U256),
        amount: U256,
        time_range: Option<TimeRange>,
    ) -> Self {
        Self {
            account_id,
            recipient,
            nonce,
            token_buy,
            token_sell,
            ratio,
            amount,
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
    /// Fails in the legacy layout, for out-of-range fields or ratios, or
    /// for an unpackable amount.
    pub fn get_bytes(&self, version: ProtocolVersion) -> Result<Vec<u8>, EncodingError> {
        let mut out = TxType::Order.header(version)?;
        out.extend_from_slice(&account_id_bytes(self.account_id)?);
        out.extend_from_slice(self.recipient.as_slice());
        out.extend_from_slice(&nonce_bytes(self.nonce));
        out.extend_from_slice(&token_id_bytes(self.token_sell, version)?);
        out.extend_from_slice(&token_id_bytes(self.token_buy, version)?);
        out.extend_from_slice(&ratio_bytes(self.ratio.0)?);
        out.extend_from_slice(&ratio_bytes(self.ratio.1)?);
        out.extend_from_slice(&pack_amount_checked(self.amount)?);
        push_time_range(&mut out, version, self.time_range);
        Ok(out)
    }

    /// Full message for the L1 signer. Orders carry their own nonce line.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::Amount`] if the sold token's decimals cannot
    /// be rendered.
    pub fn ethereum_sign_message(
        &self,
        token_sell: &Token,
        token_buy: &Token,
    ) -> Result<String, EncodingError> {
        let head = if self.amount.is_zero() {
            format!("Limit order for {} -> {}", token_sell.symbol, token_buy.symbol)
        } else {
            format!(
                "Order for {} {} -> {}",
                token_sell.format(self.amount)?,
                token_sell.symbol,
                token_buy.symbol
            )
        };
        Ok(format!(
            "{head}\nRatio: {}:{}\nAddress: {}\nNonce: {}",
            self.ratio.0,
            self.ratio.1,
            format_address(&self.recipient),
            self.nonce
        ))
    }
}
