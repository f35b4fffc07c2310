//! Transaction variants, their signing payloads and their L1 messages.
//!
//! Each variant encodes itself with `get_bytes(version)` into the exact byte
//! string the L2 signer signs, and renders the message part the L1 signer is
//! asked to approve. Field checks run while encoding, so an invalid
//! transaction never reaches a signer.

mod change_pubkey;
mod forced_exit;
mod mint_nft;
mod order;
mod signature;
mod swap;
mod transfer;
mod withdraw;
mod withdraw_nft;

pub use change_pubkey::{AuthorizationVariant, ChangePubKey, ChangePubKeyAuthData, Create2Data};
pub(crate) use change_pubkey::variant_auth_bytes;
pub use forced_exit::ForcedExit;
pub use mint_nft::MintNft;
pub use order::{Order, RATIO_BYTES, ratio_bytes};
pub use signature::{
    ETH_SIGNATURE_LEN, PUBKEY_LEN, PackedEthSignature, PackedPublicKey, PackedSignature,
    SIGNATURE_LEN, TxEthSignature, TxSignature,
};
pub use swap::Swap;
pub use transfer::Transfer;
pub use withdraw::Withdraw;
pub use withdraw_nft::WithdrawNft;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::AmountError;
use crate::error::EncodingError;
use crate::fields::{AccountId, Nonce};
use crate::token::Token;
use crate::version::{CURRENT_TX_VERSION, ProtocolVersion};

/// Kind of an L2 operation, identified on the wire by its type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxType {
    /// Withdrawal to L1.
    Withdraw,
    /// L2 transfer.
    Transfer,
    /// Signing key rotation.
    ChangePubKey,
    /// Withdrawal forced by another account.
    ForcedExit,
    /// NFT creation.
    MintNft,
    /// NFT withdrawal to L1.
    WithdrawNft,
    /// Atomic exchange of two orders.
    Swap,
    /// Limit order, signed on its own and settled by a swap.
    Order,
}

impl TxType {
    /// The type byte of the operation.
    #[must_use]
    pub const fn type_byte(&self) -> u8 {
        match self {
            Self::Withdraw => 3,
            Self::Transfer => 5,
            Self::ChangePubKey => 7,
            Self::ForcedExit => 8,
            Self::MintNft => 9,
            Self::WithdrawNft => 10,
            Self::Swap => 11,
            Self::Order => b'o',
        }
    }

    /// Returns `true` if the operation has a layout in `version`.
    #[must_use]
    pub const fn is_supported_by(&self, version: ProtocolVersion) -> bool {
        match version {
            ProtocolVersion::Current => true,
            ProtocolVersion::Legacy => matches!(
                self,
                Self::Withdraw | Self::Transfer | Self::ChangePubKey | Self::ForcedExit
            ),
        }
    }

    /// Leading bytes of the payload: the opcode, then the version byte in
    /// the current layout.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::UnsupportedTransactionType`] if the
    /// operation does not exist in `version`.
    pub fn header(&self, version: ProtocolVersion) -> Result<Vec<u8>, EncodingError> {
        if !self.is_supported_by(version) {
            return Err(EncodingError::UnsupportedTransactionType {
                tx_type: *self,
                version,
            });
        }
        Ok(match (version, self) {
            (ProtocolVersion::Legacy, _) => vec![self.type_byte()],
            (ProtocolVersion::Current, Self::Order) => vec![self.type_byte(), CURRENT_TX_VERSION],
            (ProtocolVersion::Current, _) => vec![0xff - self.type_byte(), CURRENT_TX_VERSION],
        })
    }

    /// Name used in the `type` field of the JSON form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Withdraw => "Withdraw",
            Self::Transfer => "Transfer",
            Self::ChangePubKey => "ChangePubKey",
            Self::ForcedExit => "ForcedExit",
            Self::MintNft => "MintNFT",
            Self::WithdrawNft => "WithdrawNFT",
            Self::Swap => "Swap",
            Self::Order => "Order",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appends the time range to `out` when the layout carries one.
pub(crate) fn push_time_range(
    out: &mut Vec<u8>,
    version: ProtocolVersion,
    time_range: Option<crate::timestamp::TimeRange>,
) {
    if version.has_time_range() {
        out.extend_from_slice(&time_range.unwrap_or_default().to_be_bytes());
    }
}

/// `"\nFee: {fee} {symbol}"`, or nothing for a zero fee.
pub(crate) fn fee_line(fee: U256, token: &Token) -> Result<String, AmountError> {
    if fee.is_zero() {
        Ok(String::new())
    } else {
        Ok(format!("\nFee: {} {}", token.format(fee)?, token.symbol))
    }
}

/// Completes a message part with the nonce line.
#[must_use]
pub fn with_nonce(part: &str, nonce: Nonce) -> String {
    format!("{part}\nNonce: {nonce}")
}

/// Message signed once for a batch: every part on its own line, then the
/// nonce of the first transaction.
#[must_use]
pub fn batch_message<S: AsRef<str>>(parts: &[S], first_nonce: Nonce) -> String {
    let body = parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    with_nonce(&body, first_nonce)
}

/// A submittable L2 transaction in its JSON wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ZkSyncTx {
    /// L2 transfer.
    Transfer(Box<Transfer>),
    /// Withdrawal to L1.
    Withdraw(Box<Withdraw>),
    /// Signing key rotation.
    ChangePubKey(Box<ChangePubKey>),
    /// Forced withdrawal.
    ForcedExit(Box<ForcedExit>),
    /// NFT creation.
    #[serde(rename = "MintNFT")]
    MintNft(Box<MintNft>),
    /// NFT withdrawal.
    #[serde(rename = "WithdrawNFT")]
    WithdrawNft(Box<WithdrawNft>),
    /// Order settlement.
    Swap(Box<Swap>),
}

impl ZkSyncTx {
    /// Kind of the transaction.
    #[must_use]
    pub const fn tx_type(&self) -> TxType {
        match self {
            Self::Transfer(_) => TxType::Transfer,
            Self::Withdraw(_) => TxType::Withdraw,
            Self::ChangePubKey(_) => TxType::ChangePubKey,
            Self::ForcedExit(_) => TxType::ForcedExit,
            Self::MintNft(_) => TxType::MintNft,
            Self::WithdrawNft(_) => TxType::WithdrawNft,
            Self::Swap(_) => TxType::Swap,
        }
    }

    /// Nonce of the sending account.
    #[must_use]
    pub fn nonce(&self) -> Nonce {
        match self {
            Self::Transfer(tx) => tx.nonce,
            Self::Withdraw(tx) => tx.nonce,
            Self::ChangePubKey(tx) => tx.nonce,
            Self::ForcedExit(tx) => tx.nonce,
            Self::MintNft(tx) => tx.nonce,
            Self::WithdrawNft(tx) => tx.nonce,
            Self::Swap(tx) => tx.nonce,
        }
    }

    /// Account that pays the fee and signs the transaction.
    #[must_use]
    pub fn account_id(&self) -> AccountId {
        match self {
            Self::Transfer(tx) => tx.account_id,
            Self::Withdraw(tx) => tx.account_id,
            Self::ChangePubKey(tx) => tx.account_id,
            Self::ForcedExit(tx) => tx.initiator_account_id,
            Self::MintNft(tx) => tx.creator_id,
            Self::WithdrawNft(tx) => tx.account_id,
            Self::Swap(tx) => tx.submitter_id,
        }
    }

    /// The L2 signature, once attached.
    #[must_use]
    pub fn signature(&self) -> Option<&TxSignature> {
        match self {
            Self::Transfer(tx) => tx.signature(),
            Self::Withdraw(tx) => tx.signature(),
            Self::ChangePubKey(tx) => tx.signature(),
            Self::ForcedExit(tx) => tx.signature(),
            Self::MintNft(tx) => tx.signature(),
            Self::WithdrawNft(tx) => tx.signature(),
            Self::Swap(tx) => tx.signature(),
        }
    }

    pub(crate) fn set_signature(&mut self, signature: TxSignature) {
        match self {
            Self::Transfer(tx) => tx.set_signature(signature),
            Self::Withdraw(tx) => tx.set_signature(signature),
            Self::ChangePubKey(tx) => tx.set_signature(signature),
            Self::ForcedExit(tx) => tx.set_signature(signature),
            Self::MintNft(tx) => tx.set_signature(signature),
            Self::WithdrawNft(tx) => tx.set_signature(signature),
            Self::Swap(tx) => tx.set_signature(signature),
        }
    }

    /// Message part shown to the L1 signer. `token` is the token the
    /// amount or fee is denominated in.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::Amount`] if the token's decimals cannot be
    /// rendered.
    pub fn ethereum_sign_message_part(&self, token: &Token) -> Result<String, EncodingError> {
        match self {
            Self::Transfer(tx) => tx.ethereum_sign_message_part(token),
            Self::Withdraw(tx) => tx.ethereum_sign_message_part(token),
            Self::ChangePubKey(tx) => tx.ethereum_sign_message_part(token),
            Self::ForcedExit(tx) => tx.ethereum_sign_message_part(token),
            Self::MintNft(tx) => tx.ethereum_sign_message_part(token),
            Self::WithdrawNft(tx) => tx.ethereum_sign_message_part(token),
            Self::Swap(tx) => tx.ethereum_sign_message_part(token),
        }
    }
}

macro_rules! impl_into_tx {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for ZkSyncTx {
                fn from(tx: $ty) -> Self {
                    Self::$variant(Box::new(tx))
                }
            }
        )*
    };
}

impl_into_tx!(
    Transfer(Transfer),
    Withdraw(Withdraw),
    ChangePubKey(ChangePubKey),
    ForcedExit(ForcedExit),
    MintNft(MintNft),
    WithdrawNft(WithdrawNft),
    Swap(Swap),
);

/// A transaction with every required signature attached.
///
/// Only the signature coordinator builds these, and only once all
/// signatures succeeded. `eth_signatures` is positional: one entry for
/// ordinary transactions, `[submitter, order0, order1]` for swaps. An
/// entry is `None` when the signer's account needs no L1 signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedZkSyncTx {
    tx: ZkSyncTx,
    eth_signatures: Vec<Option<TxEthSignature>>,
}

impl SignedZkSyncTx {
    pub(crate) const fn new(tx: ZkSyncTx, eth_signatures: Vec<Option<TxEthSignature>>) -> Self {
        Self { tx, eth_signatures }
    }

    /// The signed transaction.
    #[must_use]
    pub const fn tx(&self) -> &ZkSyncTx {
        &self.tx
    }

    /// The L1 signature of the submitter.
    #[must_use]
    pub fn eth_signature(&self) -> Option<&TxEthSignature> {
        self.eth_signatures.first().and_then(Option::as_ref)
    }

    /// All L1 signatures, positional.
    #[must_use]
    pub fn eth_signatures(&self) -> &[Option<TxEthSignature>] {
        &self.eth_signatures
    }

    /// Splits into the transaction and its L1 signatures.
    #[must_use]
    pub fn into_parts(self) -> (ZkSyncTx, Vec<Option<TxEthSignature>>) {
        (self.tx, self.eth_signatures)
    }
}

/// A batch of transactions sharing one L1 signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedBatch {
    txs: Vec<ZkSyncTx>,
    eth_signature: Option<TxEthSignature>,
}

impl SignedBatch {
    pub(crate) const fn new(txs: Vec<ZkSyncTx>, eth_signature: Option<TxEthSignature>) -> Self {
        Self { txs, eth_signature }
    }

    /// Transactions in submission order.
    #[must_use]
    pub fn txs(&self) -> &[ZkSyncTx] {
        &self.txs
    }

    /// The batch signature, absent for CREATE2 accounts.
    #[must_use]
    pub const fn eth_signature(&self) -> Option<&TxEthSignature> {
        self.eth_signature.as_ref()
    }
}
