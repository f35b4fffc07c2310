//! Network access capability.
//!
//! A [`Provider`] reads account state, token lists and fee quotes, and
//! submits signed transactions. The transport lives in a separate crate;
//! this module only defines the types that cross the boundary.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use std::fmt;
use std::sync::Arc;

use crate::error::ErrorKind;
use crate::fields::{AccountId, Nonce, PubKeyHash, lowercase_address};
use crate::signer::BoxFuture;
use crate::token::{TokenLike, Tokens};
use crate::tx::{AuthorizationVariant, SignedBatch, SignedZkSyncTx};

/// Failures reported by a provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The request did not reach the network or timed out.
    #[error("transport error: {0}")]
    Transport(String),
    /// The network answered with a structured error.
    #[error("protocol error {code}: {message}")]
    Protocol {
        /// Server error code.
        code: i64,
        /// Server error message.
        message: String,
    },
    /// The response did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) | Self::Decode(_) => ErrorKind::Transport,
            Self::Protocol { .. } => ErrorKind::Rejected,
        }
    }
}

/// Account state at one confirmation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    /// Next nonce.
    pub nonce: Nonce,
    /// Hash of the registered signing key, zero if none.
    pub pub_key_hash: PubKeyHash,
}

/// Account summary returned by the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// Account address.
    #[serde(with = "lowercase_address")]
    pub address: Address,
    /// Account id, absent until the account receives its first deposit.
    #[serde(default)]
    pub id: Option<AccountId>,
    /// State including pending blocks.
    pub committed: AccountState,
    /// State proven on L1.
    pub verified: AccountState,
}

/// Authorization kind a key-change fee is quoted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangePubKeyFeeType {
    /// Key hash registered on L1.
    Onchain,
    /// Signed by the L1 key.
    #[serde(rename = "ECDSA")]
    Ecdsa,
    /// CREATE2 account.
    #[serde(rename = "CREATE2")]
    Create2,
}

impl From<&AuthorizationVariant> for ChangePubKeyFeeType {
    fn from(variant: &AuthorizationVariant) -> Self {
        match variant {
            AuthorizationVariant::Onchain => Self::Onchain,
            AuthorizationVariant::Ecdsa => Self::Ecdsa,
            AuthorizationVariant::Create2(_) => Self::Create2,
        }
    }
}

/// Kind of transaction a fee is quoted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxFeeType {
    /// Transfer.
    Transfer,
    /// Withdrawal with normal processing.
    Withdraw,
    /// Withdrawal processed in the next block.
    FastWithdraw,
    /// Key change.
    ChangePubKey(ChangePubKeyFeeType),
    /// NFT mint.
    #[serde(rename = "MintNFT")]
    MintNft,
    /// NFT withdrawal.
    #[serde(rename = "WithdrawNFT")]
    WithdrawNft,
    /// NFT withdrawal processed in the next block.
    #[serde(rename = "FastWithdrawNFT")]
    FastWithdrawNft,
    /// Swap.
    Swap,
}

/// A fee quote.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    /// Quoted transaction kind.
    pub fee_type: TxFeeType,
    /// L1 gas the transaction costs.
    #[serde_as(as = "DisplayFromStr")]
    pub gas_tx_amount: U256,
    /// Gas price in wei.
    #[serde_as(as = "DisplayFromStr")]
    pub gas_price_wei: U256,
    /// Gas part of the fee, in fee token units.
    #[serde_as(as = "DisplayFromStr")]
    pub gas_fee: U256,
    /// Proving part of the fee, in fee token units.
    #[serde_as(as = "DisplayFromStr")]
    pub zkp_fee: U256,
    /// Amount to put in the transaction's fee field.
    #[serde_as(as = "DisplayFromStr")]
    pub total_fee: U256,
}

/// Identifier of a submitted transaction, e.g. `sync-tx:...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capability to query the network and submit transactions.
pub trait Provider: Send + Sync {
    /// Current state of `address`.
    fn account_info(&self, address: Address) -> BoxFuture<'_, Result<AccountInfo, ProviderError>>;

    /// Tokens supported by the network.
    fn tokens(&self) -> BoxFuture<'_, Result<Tokens, ProviderError>>;

    /// Fee quote for a transaction of `fee_type` sent to `address`.
    fn get_tx_fee<'a>(
        &'a self,
        fee_type: TxFeeType,
        address: Address,
        token: &'a TokenLike,
    ) -> BoxFuture<'a, Result<Fee, ProviderError>>;

    /// Submits a signed transaction.
    fn submit_tx<'a>(
        &'a self,
        tx: &'a SignedZkSyncTx,
        fast_processing: bool,
    ) -> BoxFuture<'a, Result<TxHash, ProviderError>>;

    /// Submits a signed batch; hashes come back in batch order.
    fn submit_batch<'a>(
        &'a self,
        batch: &'a SignedBatch,
    ) -> BoxFuture<'a, Result<Vec<TxHash>, ProviderError>>;
}

impl<T: Provider + ?Sized> Provider for Arc<T> {
    fn account_info(&self, address: Address) -> BoxFuture<'_, Result<AccountInfo, ProviderError>> {
        (**self).account_info(address)
    }

    fn tokens(&self) -> BoxFuture<'_, Result<Tokens, ProviderError>> {
        (**self).tokens()
    }

    fn get_tx_fee<'a>(
        &'a self,
        fee_type: TxFeeType,
        address: Address,
        token: &'a TokenLike,
    ) -> BoxFuture<'a, Result<Fee, ProviderError>> {
        (**self).get_tx_fee(fee_type, address, token)
    }

    fn submit_tx<'a>(
        &'a self,
        tx: &'a SignedZkSyncTx,
        fast_processing: bool,
    ) -> BoxFuture<'a, Result<TxHash, ProviderError>> {
        (**self).submit_tx(tx, fast_processing)
    }

    fn submit_batch<'a>(
        &'a self,
        batch: &'a SignedBatch,
    ) -> BoxFuture<'a, Result<Vec<TxHash>, ProviderError>> {
        (**self).submit_batch(batch)
    }
}

/// In-memory provider for tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::token::Token;
    use crate::tx::ZkSyncTx;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    pub struct FakeProvider {
        pub info: Mutex<AccountInfo>,
        pub tokens: Tokens,
        pub fee: U256,
        pub submitted: Mutex<Vec<(ZkSyncTx, bool)>>,
        pub account_info_calls: AtomicUsize,
        pub fee_requests: Mutex<Vec<TxFeeType>>,
    }

    impl FakeProvider {
        pub fn new(address: Address, id: Option<AccountId>, nonce: u32) -> Self {
            let state = AccountState {
                nonce: Nonce(nonce),
                pub_key_hash: PubKeyHash::ZERO,
            };
            Self {
                info: Mutex::new(AccountInfo {
                    address,
                    id,
                    committed: state,
                    verified: state,
                }),
                tokens: Tokens::new([
                    Token::eth(),
                    Token::new(
                        crate::fields::TokenId(2),
                        alloy_primitives::address!("0x1111111111111111111111111111111111111111"),
                        "USDC",
                        6,
                    ),
                ]),
                fee: U256::from(1_000_000u64),
                submitted: Mutex::new(Vec::new()),
                account_info_calls: AtomicUsize::new(0),
                fee_requests: Mutex::new(Vec::new()),
            }
        }

        pub fn with_pub_key_hash(self, hash: PubKeyHash) -> Self {
            {
                let mut info = self.info.lock().unwrap();
                info.committed.pub_key_hash = hash;
            }
            self
        }
    }

    impl Provider for FakeProvider {
        fn account_info(
            &self,
            _address: Address,
        ) -> BoxFuture<'_, Result<AccountInfo, ProviderError>> {
            Box::pin(async move {
                self.account_info_calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.info.lock().unwrap().clone())
            })
        }

        fn tokens(&self) -> BoxFuture<'_, Result<Tokens, ProviderError>> {
            Box::pin(async move { Ok(self.tokens.clone()) })
        }

        fn get_tx_fee<'a>(
            &'a self,
            fee_type: TxFeeType,
            _address: Address,
            _token: &'a TokenLike,
        ) -> BoxFuture<'a, Result<Fee, ProviderError>> {
            Box::pin(async move {
                self.fee_requests.lock().unwrap().push(fee_type);
                Ok(Fee {
                    fee_type,
                    gas_tx_amount: U256::ZERO,
                    gas_price_wei: U256::ZERO,
                    gas_fee: U256::ZERO,
                    zkp_fee: self.fee,
                    total_fee: self.fee,
                })
            })
        }

        fn submit_tx<'a>(
            &'a self,
            tx: &'a SignedZkSyncTx,
            fast_processing: bool,
        ) -> BoxFuture<'a, Result<TxHash, ProviderError>> {
            Box::pin(async move {
                let mut submitted = self.submitted.lock().unwrap();
                submitted.push((tx.tx().clone(), fast_processing));
                Ok(TxHash(format!("sync-tx:{:064x}", submitted.len())))
            })
        }

        fn submit_batch<'a>(
            &'a self,
            batch: &'a SignedBatch,
        ) -> BoxFuture<'a, Result<Vec<TxHash>, ProviderError>> {
            Box::pin(async move {
                let mut submitted = self.submitted.lock().unwrap();
                let mut hashes = Vec::new();
                for tx in batch.txs() {
                    submitted.push((tx.clone(), false));
                    hashes.push(TxHash(format!("sync-tx:{:064x}", submitted.len())));
                }
                Ok(hashes)
            })
        }
    }
}
