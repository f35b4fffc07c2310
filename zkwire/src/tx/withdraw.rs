use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::error::EncodingError;
use crate::fields::{
    AccountId, Nonce, TokenId, account_id_bytes, format_address, lowercase_address, nonce_bytes,
    token_id_bytes,
};
use crate::pack::{full_amount_bytes, pack_fee_checked};
use crate::timestamp::TimeRange;
use crate::token::Token;
use crate::tx::{TxSignature, TxType, fee_line, push_time_range, with_nonce};
use crate::version::ProtocolVersion;

/// Withdraws `amount` of `token` from L2 to an L1 address.
///
/// The amount travels at full 16-byte width, only the fee is packed.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdraw {
    /// Sender account id.
    pub account_id: AccountId,
    /// Sender L2 address.
    #[serde(with = "lowercase_address")]
    pub from: Address,
    /// L1 recipient.
    #[serde(with = "lowercase_address")]
    pub to: Address,
    /// Withdrawn token.
    pub token: TokenId,
    /// Amount in base units.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: U256,
    /// Fee in base units of `token`.
    #[serde_as(as = "DisplayFromStr")]
    pub fee: U256,
    /// Sender nonce.
    pub nonce: Nonce,
    /// Validity window, current layout only.
    #[serde(flatten)]
    pub time_range: Option<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<TxSignature>,
}

impl Withdraw {
    /// Creates an unsigned withdrawal.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        account_id: AccountId,
        from: Address,
        to: Address,
        token: TokenId,
        amount: U256,
        fee: U256,
        nonce: Nonce,
        time_range: Option<TimeRange>,
    ) -> Self {
        Self {
            account_id,
            from,
            to,
            token,
            amount,
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
    /// Fails if a field is out of range, the amount exceeds 128 bits, or the
    /// fee is not packable.
    pub fn get_bytes(&self, version: ProtocolVersion) -> Result<Vec<u8>, EncodingError> {
        let mut out = TxType::Withdraw.header(version)?;
        out.extend_from_slice(&account_id_bytes(self.account_id)?);
        out.extend_from_slice(self.from.as_slice());
        out.extend_from_slice(self.to.as_slice());
        out.extend_from_slice(&token_id_bytes(self.token, version)?);
        out.extend_from_slice(&full_amount_bytes(self.amount)?);
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
            "Withdraw {} {} to: {}",
            token.format(self.amount)?,
            token.symbol,
            format_address(&self.to)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::PackError;
    use alloy_primitives::{address, hex};

    fn withdraw(amount: U256) -> Withdraw {
        Withdraw::new(
            AccountId(7),
            address!("0xede35562d3555e61120a151b3c8e8e91d83a378a"),
            address!("0x19aa2ed8712072e918632259780e587698ef58df"),
            TokenId(2),
            amount,
            U256::from(1_000_000u64),
            Nonce(1),
            Some(TimeRange::new(1, 2)),
        )
    }

    #[test]
    fn test_current_layout_uses_full_amount() {
        let bytes = withdraw(U256::from(1_000_000_000_000u64))
            .get_bytes(ProtocolVersion::Current)
            .unwrap();
        let expected = hex::decode(concat!(
            "fc01",
            "00000007",
            "ede35562d3555e61120a151b3c8e8e91d83a378a",
            "19aa2ed8712072e918632259780e587698ef58df",
            "00000002",
            "0000000000000000000000e8d4a51000",
            "c0be",
            "00000001",
            "0000000000000001",
            "0000000000000002",
        ))
        .unwrap();
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_legacy_layout() {
        let bytes = withdraw(U256::from(1u8))
            .get_bytes(ProtocolVersion::Legacy)
            .unwrap();
        assert_eq!(bytes[0], 0x03);
        // opcode, account, two addresses, token, amount, fee, nonce
        assert_eq!(bytes.len(), 1 + 4 + 20 + 20 + 2 + 16 + 2 + 4);
        assert_eq!(bytes[45..47], [0, 2]);
    }

    #[test]
    fn test_amount_above_128_bits_is_rejected() {
        let err = withdraw(U256::from(u128::MAX) + U256::from(1u8))
            .get_bytes(ProtocolVersion::Current)
            .unwrap_err();
        assert!(matches!(err, EncodingError::Pack(PackError::ValueTooLarge { .. })));
    }

    #[test]
    fn test_message() {
        let token = Token::new(TokenId(2), Address::ZERO, "USDC", 6);
        let message = withdraw(U256::from(2_500_000u64))
            .ethereum_sign_message(&token)
            .unwrap();
        assert_eq!(
            message,
            "Withdraw 2.5 USDC to: 0x19aa2ed8712072e918632259780e587698ef58df\n\
             Fee: 1.0 USDC\n\
             Nonce: 1"
        );
    }
}
