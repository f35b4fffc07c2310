//! Blocking wallet facade.
//!
//! Wraps the async [`Wallet`](crate::wallet::Wallet) with a current-thread
//! tokio runtime and blocks on every operation. Do not call it from inside
//! an async runtime; use the async wallet there.

use alloy_primitives::{Address, B256, U256};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

use crate::config::WalletConfig;
use crate::coordinator::SignedOrder;
use crate::fields::{AccountId, TokenId};
use crate::provider::{AccountInfo, Provider, TxHash};
use crate::signer::{EthSigner, L2Signer};
use crate::timestamp::TimeRange;
use crate::token::{Token, TokenLike};
use crate::tx::ZkSyncTx;
use crate::wallet::{self, WalletError};

/// Synchronous counterpart of [`wallet::Wallet`].
pub struct Wallet<E, P> {
    inner: wallet::Wallet<E, P>,
    runtime: Runtime,
}

impl<E, P> fmt::Debug for Wallet<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("blocking::Wallet")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<E: EthSigner, P: Provider> Wallet<E, P> {
    /// Creates a blocking wallet with its own runtime.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the runtime cannot be started.
    pub fn new(config: WalletConfig, eth_signer: E, provider: P) -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            inner: wallet::Wallet::new(config, eth_signer, provider),
            runtime,
        })
    }

    /// Adds the L2 signing capability.
    #[must_use]
    pub fn with_l2_signer(mut self, l2_signer: Arc<dyn L2Signer>) -> Self {
        self.inner = self.inner.with_l2_signer(l2_signer);
        self
    }

    /// The wrapped async wallet.
    #[must_use]
    pub const fn inner(&self) -> &wallet::Wallet<E, P> {
        &self.inner
    }

    /// The account's L1 address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.inner.address()
    }

    /// See [`wallet::Wallet::account_info`].
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] on failure.
    pub fn account_info(&self) -> Result<AccountInfo, WalletError> {
        self.runtime.block_on(self.inner.account_info())
    }

    /// See [`wallet::Wallet::account_id`].
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] on failure.
    pub fn account_id(&self) -> Result<AccountId, WalletError> {
        self.runtime.block_on(self.inner.account_id())
    }

    /// See [`wallet::Wallet::is_signing_key_set`].
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] on failure.
    pub fn is_signing_key_set(&self) -> Result<bool, WalletError> {
        self.runtime.block_on(self.inner.is_signing_key_set())
    }

    /// See [`wallet::Wallet::transfer`].
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] on failure.
    pub fn transfer(
        &self,
        to: Address,
        token: TokenLike,
        amount: U256,
        fee: Option<U256>,
        time_range: Option<TimeRange>,
    ) -> Result<TxHash, WalletError> {
        self.runtime
            .block_on(self.inner.transfer(to, token, amount, fee, time_range))
    }

    /// See [`wallet::Wallet::withdraw`].
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] on failure.
    pub fn withdraw(
        &self,
        to: Address,
        token: TokenLike,
        amount: U256,
        fee: Option<U256>,
        time_range: Option<TimeRange>,
    ) -> Result<TxHash, WalletError> {
        self.runtime
            .block_on(self.inner.withdraw(to, token, amount, fee, time_range))
    }

    /// See [`wallet::Wallet::forced_exit`].
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] on failure.
    pub fn forced_exit(
        &self,
        target: Address,
        token: TokenLike,
        fee: Option<U256>,
        time_range: Option<TimeRange>,
    ) -> Result<TxHash, WalletError> {
        self.runtime
            .block_on(self.inner.forced_exit(target, token, fee, time_range))
    }

    /// See [`wallet::Wallet::change_pubkey`].
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] on failure.
    pub fn change_pubkey(
        &self,
        fee_token: TokenLike,
        fee: Option<U256>,
        time_range: Option<TimeRange>,
    ) -> Result<TxHash, WalletError> {
        self.runtime
            .block_on(self.inner.change_pubkey(fee_token, fee, time_range))
    }

    /// See [`wallet::Wallet::mint_nft`].
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] on failure.
    pub fn mint_nft(
        &self,
        recipient: Address,
        content_hash: B256,
        fee_token: TokenLike,
        fee: Option<U256>,
    ) -> Result<TxHash, WalletError> {
        self.runtime
            .block_on(self.inner.mint_nft(recipient, content_hash, fee_token, fee))
    }

    /// See [`wallet::Wallet::withdraw_nft`].
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] on failure.
    pub fn withdraw_nft(
        &self,
        to: Address,
        token: TokenId,
        fee_token: TokenLike,
        fee: Option<U256>,
        time_range: Option<TimeRange>,
    ) -> Result<TxHash, WalletError> {
        self.runtime
            .block_on(self.inner.withdraw_nft(to, token, fee_token, fee, time_range))
    }

    /// See [`wallet::Wallet::sign_order`].
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] on failure.
    pub fn sign_order(
        &self,
        recipient: Address,
        token_sell: TokenLike,
        token_buy: TokenLike,
        ratio: (U256, U256),
        amount: U256,
        time_range: Option<TimeRange>,
    ) -> Result<SignedOrder, WalletError> {
        self.runtime.block_on(self.inner.sign_order(
            recipient, token_sell, token_buy, ratio, amount, time_range,
        ))
    }

    /// See [`wallet::Wallet::swap`].
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] on failure.
    pub fn swap(
        &self,
        orders: (SignedOrder, SignedOrder),
        amounts: (U256, U256),
        fee_token: TokenLike,
        fee: Option<U256>,
    ) -> Result<TxHash, WalletError> {
        self.runtime
            .block_on(self.inner.swap(orders, amounts, fee_token, fee))
    }

    /// See [`wallet::Wallet::submit_batch`].
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] on failure.
    pub fn submit_batch(&self, txs: Vec<(ZkSyncTx, Token)>) -> Result<Vec<TxHash>, WalletError> {
        self.runtime.block_on(self.inner.submit_batch(txs))
    }
}
