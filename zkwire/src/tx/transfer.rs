use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};

use crate::error::EncodingError;
use crate::fields::{
    AccountId, Nonce, TokenId, account_id_bytes, format_address, lowercase_address, nonce_bytes,
    token_id_bytes,
};
use crate::pack::{pack_amount_checked, pack_fee_checked};
use crate::timestamp::TimeRange;
use crate::token::Token;
use crate::tx::{TxSignature, TxType, fee_line, push_time_range, with_nonce};
use crate::version::ProtocolVersion;

/// Moves `amount` of `token` between two L2 accounts.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    /// Sender account id.
    pub account_id: AccountId,
    /// Sender address.
    #[serde(with = "lowercase_address")]
    pub from: Address,
    /// Recipient address.
    #[serde(with = "lowercase_address")]
    pub to: Address,
    /// Transferred token.
    pub token: TokenId,
    /// Amount in base units; must be packable.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: U256,
    /// Fee in base units of `token`; must be packable.
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

impl Transfer {
    /// Creates an unsigned transfer.
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
    /// Fails if a field is out of range or the amount or fee is not packable.
    pub fn get_bytes(&self, version: ProtocolVersion) -> Result<Vec<u8>, EncodingError> {
        let mut out = TxType::Transfer.header(version)?;
        out.extend_from_slice(&account_id_bytes(self.account_id)?);
        out.extend_from_slice(self.from.as_slice());
        out.extend_from_slice(self.to.as_slice());
        out.extend_from_slice(&token_id_bytes(self.token, version)?);
        out.extend_from_slice(&pack_amount_checked(self.amount)?);
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
            "Transfer {} {} to: {}",
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
    use crate::amount::AmountError;
    use crate::pack::PackError;
    use alloy_primitives::{address, hex};

    const FROM: Address = address!("0xede35562d3555e61120a151b3c8e8e91d83a378a");
    const TO: Address = address!("0x19aa2ed8712072e918632259780e587698ef58df");

    fn transfer(fee: U256) -> Transfer {
        Transfer::new(
            AccountId(44),
            FROM,
            TO,
            TokenId(0),
            U256::from(1_000_000_000_000u64),
            fee,
            Nonce(12),
            Some(TimeRange::default()),
        )
    }

    #[test]
    fn test_current_layout() {
        let bytes = transfer(U256::from(1_000_000u64))
            .get_bytes(ProtocolVersion::Current)
            .unwrap();
        let expected = hex::decode(concat!(
            "fa01",
            "0000002c",
            "ede35562d3555e61120a151b3c8e8e91d83a378a",
            "19aa2ed8712072e918632259780e587698ef58df",
            "00000000",
            "40013e8152",
            "c0be",
            "0000000c",
            "0000000000000000ffffffffffffffff",
        ))
        .unwrap();
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_legacy_layout() {
        let bytes = transfer(U256::from(1_000_000u64))
            .get_bytes(ProtocolVersion::Legacy)
            .unwrap();
        let expected = hex::decode(concat!(
            "05",
            "0000002c",
            "ede35562d3555e61120a151b3c8e8e91d83a378a",
            "19aa2ed8712072e918632259780e587698ef58df",
            "0000",
            "40013e8152",
            "c0be",
            "0000000c",
        ))
        .unwrap();
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_message() {
        let message = transfer(U256::from(1_000_000u64))
            .ethereum_sign_message(&Token::eth())
            .unwrap();
        assert_eq!(
            message,
            "Transfer 0.000001 ETH to: 0x19aa2ed8712072e918632259780e587698ef58df\n\
             Fee: 0.000000000001 ETH\n\
             Nonce: 12"
        );
    }

    #[test]
    fn test_zero_fee_message_has_no_fee_line() {
        let message = transfer(U256::ZERO)
            .ethereum_sign_message_part(&Token::eth())
            .unwrap();
        assert_eq!(
            message,
            "Transfer 0.000001 ETH to: 0x19aa2ed8712072e918632259780e587698ef58df"
        );
    }

    #[test]
    fn test_message_rejects_token_wider_than_18_decimals() {
        let token = Token::new(TokenId(0), Address::ZERO, "WIDE", 19);
        let err = transfer(U256::ZERO)
            .ethereum_sign_message(&token)
            .unwrap_err();
        assert!(matches!(
            err,
            EncodingError::Amount(AmountError::UnsupportedDecimals(19))
        ));
    }

    #[test]
    fn test_unpackable_fee_is_rejected() {
        let err = transfer(U256::from(12_345u64))
            .get_bytes(ProtocolVersion::Current)
            .unwrap_err();
        assert!(matches!(
            err,
            EncodingError::Pack(PackError::ValueNotPackable { .. })
        ));
    }

    #[test]
    fn test_json_form() {
        let json = serde_json::to_value(transfer(U256::from(1_000_000u64))).unwrap();
        assert_eq!(json["accountId"], 44);
        assert_eq!(json["amount"], "1000000000000");
        assert_eq!(json["fee"], "1000000");
        assert_eq!(json["to"], "0x19aa2ed8712072e918632259780e587698ef58df");
        assert_eq!(json["validFrom"], 0);
        assert_eq!(json["validUntil"], u64::MAX);
        assert!(json.get("signature").is_none());

        let back: Transfer = serde_json::from_value(json).unwrap();
        assert_eq!(back, transfer(U256::from(1_000_000u64)));
    }
}
