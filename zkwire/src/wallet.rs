//! Async wallet facade.
//!
//! A [`Wallet`] ties a [`SignatureCoordinator`] to a [`Provider`]. Each
//! operation fetches what it needs from the network concurrently (account
//! state, token metadata and a fee quote when none was given), builds the
//! transaction, signs it and submits it.
//!
//! Nonces are read from the committed account state on every call. The
//! wallet does not track nonces across concurrent submissions; callers that
//! pipeline transactions must serialize them.

use alloy_primitives::{Address, B256, U256};
use futures_util::try_join;
use std::fmt;
use std::sync::{Arc, OnceLock};
#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::config::WalletConfig;
use crate::coordinator::{SignatureCoordinator, SignedOrder};
use crate::error::{ErrorKind, SigningError};
use crate::fields::{AccountId, Nonce, PubKeyHash, TokenId};
use crate::pack::closest_packable_fee_amount;
use crate::provider::{AccountInfo, Provider, ProviderError, TxFeeType, TxHash};
use crate::signer::{EthSigner, L2Signer};
use crate::timestamp::TimeRange;
use crate::token::{Token, TokenLike, Tokens};
use crate::tx::{
    ChangePubKey, ForcedExit, MintNft, Order, Swap, Transfer, Withdraw, WithdrawNft, ZkSyncTx,
};

/// Errors returned by wallet operations.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// Building or signing the transaction failed.
    #[error(transparent)]
    Signing(#[from] SigningError),
    /// The network request failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The token is not in the network's token list.
    #[error("unknown token '{0}'")]
    UnknownToken(String),
}

impl WalletError {
    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Signing(e) => e.kind(),
            Self::Provider(e) => e.kind(),
            Self::UnknownToken(_) => ErrorKind::InvalidInput,
        }
    }
}

/// Signs and submits transactions for one account.
pub struct Wallet<E, P> {
    config: WalletConfig,
    coordinator: SignatureCoordinator<E>,
    provider: P,
    account_id: OnceLock<AccountId>,
    pub_key_hash: OnceLock<PubKeyHash>,
    tokens: OnceLock<Tokens>,
}

impl<E, P> fmt::Debug for Wallet<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("config", &self.config)
            .field("coordinator", &self.coordinator)
            .field("account_id", &self.account_id.get())
            .finish_non_exhaustive()
    }
}

impl<E: EthSigner, P: Provider> Wallet<E, P> {
    /// Creates a wallet without an L2 key. Only
    /// [`account_info`](Self::account_info) and reads work until one is
    /// added with [`with_l2_signer`](Self::with_l2_signer).
    pub fn new(config: WalletConfig, eth_signer: E, provider: P) -> Self {
        let coordinator =
            SignatureCoordinator::new(eth_signer, config.protocol_version, config.auth);
        Self {
            config,
            coordinator,
            provider,
            account_id: OnceLock::new(),
            pub_key_hash: OnceLock::new(),
            tokens: OnceLock::new(),
        }
    }

    /// Adds the L2 signing capability.
    #[must_use]
    pub fn with_l2_signer(mut self, l2_signer: Arc<dyn L2Signer>) -> Self {
        self.coordinator = self.coordinator.with_l2_signer(l2_signer);
        self.pub_key_hash = OnceLock::new();
        self
    }

    /// The wallet configuration.
    #[must_use]
    pub const fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// The coordinator that signs for this wallet.
    #[must_use]
    pub const fn coordinator(&self) -> &SignatureCoordinator<E> {
        &self.coordinator
    }

    /// The network provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    /// The account's L1 address.
    #[must_use]
    pub fn address(&self) -> Address {
        self.coordinator.eth_signer().address()
    }

    /// Current state of this account.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Provider`] if the request fails.
    pub async fn account_info(&self) -> Result<AccountInfo, WalletError> {
        let info = self.provider.account_info(self.address()).await?;
        if let Some(id) = info.id {
            let _ = self.account_id.set(id);
        }
        Ok(info)
    }

    /// The account id, fetched once and cached.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::AccountIdRequired`] if the account has no id
    /// yet, or a provider error.
    pub async fn account_id(&self) -> Result<AccountId, WalletError> {
        if let Some(id) = self.account_id.get() {
            return Ok(*id);
        }
        self.account_info()
            .await?
            .id
            .ok_or_else(|| SigningError::AccountIdRequired.into())
    }

    /// Returns `true` if the network has this wallet's L2 key registered.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::SigningKeyRequired`] without an L2 signer, or
    /// a provider error.
    pub async fn is_signing_key_set(&self) -> Result<bool, WalletError> {
        let pk_hash = self.pub_key_hash()?;
        let info = self.account_info().await?;
        Ok(info.committed.pub_key_hash == pk_hash)
    }

    /// Hash of this wallet's L2 public key, computed once and cached.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::SigningKeyRequired`] without an L2 signer.
    pub fn pub_key_hash(&self) -> Result<PubKeyHash, WalletError> {
        if let Some(hash) = self.pub_key_hash.get() {
            return Ok(*hash);
        }
        let l2 = self
            .coordinator
            .l2_signer()
            .ok_or(SigningError::SigningKeyRequired)?;
        let hash = l2
            .public_key_hash(&l2.public_key())
            .map_err(SigningError::from)?;
        Ok(*self.pub_key_hash.get_or_init(|| hash))
    }

    /// The network's token list, fetched once and cached.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Provider`] if the request fails.
    pub async fn tokens(&self) -> Result<&Tokens, WalletError> {
        if let Some(tokens) = self.tokens.get() {
            return Ok(tokens);
        }
        let fetched = self.provider.tokens().await?;
        Ok(self.tokens.get_or_init(|| fetched))
    }

    /// Resolves a token by id, address or symbol.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::UnknownToken`] if the network does not list it.
    pub async fn resolve_token(&self, token: &TokenLike) -> Result<Token, WalletError> {
        self.tokens()
            .await?
            .resolve(token)
            .cloned()
            .ok_or_else(|| WalletError::UnknownToken(token.to_string()))
    }

    async fn account_state(&self) -> Result<(AccountId, Nonce), WalletError> {
        let info = self.account_info().await?;
        let id = info
            .id
            .or_else(|| self.account_id.get().copied())
            .ok_or(SigningError::AccountIdRequired)?;
        Ok((id, info.committed.nonce))
    }

    /// Uses `fee` if given, otherwise quotes one and rounds it down to the
    /// nearest packable value.
    async fn fee_or_quote(
        &self,
        fee: Option<U256>,
        fee_type: TxFeeType,
        address: Address,
        token: &TokenLike,
    ) -> Result<U256, WalletError> {
        if let Some(fee) = fee {
            return Ok(fee);
        }
        let quote = self.provider.get_tx_fee(fee_type, address, token).await?;
        Ok(closest_packable_fee_amount(quote.total_fee).map_err(SigningError::from)?)
    }

    fn time_range(&self, time_range: Option<TimeRange>) -> Option<TimeRange> {
        self.config
            .protocol_version
            .has_time_range()
            .then(|| time_range.unwrap_or_default())
    }

    const fn withdraw_fee_type(&self) -> TxFeeType {
        if self.config.fast_withdrawals {
            TxFeeType::FastWithdraw
        } else {
            TxFeeType::Withdraw
        }
    }

    /// Transfers `amount` of `token` to `to`. Without a `fee` one is quoted.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] if a lookup, encoding, signing or submission
    /// fails.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(%to, %token)))]
    pub async fn transfer(
        &self,
        to: Address,
        token: TokenLike,
        amount: U256,
        fee: Option<U256>,
        time_range: Option<TimeRange>,
    ) -> Result<TxHash, WalletError> {
        let ((account_id, nonce), resolved, fee) = try_join!(
            self.account_state(),
            self.resolve_token(&token),
            self.fee_or_quote(fee, TxFeeType::Transfer, to, &token),
        )?;
        let tx = Transfer::new(
            account_id,
            self.address(),
            to,
            resolved.id,
            amount,
            fee,
            nonce,
            self.time_range(time_range),
        );
        let signed = self.coordinator.sign_transfer(tx, &resolved).await?;
        Ok(self.provider.submit_tx(&signed, false).await?)
    }

    /// Withdraws `amount` of `token` to the L1 address `to`.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] if a lookup, encoding, signing or submission
    /// fails.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(%to, %token)))]
    pub async fn withdraw(
        &self,
        to: Address,
        token: TokenLike,
        amount: U256,
        fee: Option<U256>,
        time_range: Option<TimeRange>,
    ) -> Result<TxHash, WalletError> {
        let ((account_id, nonce), resolved, fee) = try_join!(
            self.account_state(),
            self.resolve_token(&token),
            self.fee_or_quote(fee, self.withdraw_fee_type(), to, &token),
        )?;
        let tx = Withdraw::new(
            account_id,
            self.address(),
            to,
            resolved.id,
            amount,
            fee,
            nonce,
            self.time_range(time_range),
        );
        let signed = self.coordinator.sign_withdraw(tx, &resolved).await?;
        Ok(self
            .provider
            .submit_tx(&signed, self.config.fast_withdrawals)
            .await?)
    }

    /// Moves the whole `token` balance of `target`, an account without a
    /// signing key, back to L1. This account pays the fee.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] if a lookup, encoding, signing or submission
    /// fails.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(%target, %token)))]
    pub async fn forced_exit(
        &self,
        target: Address,
        token: TokenLike,
        fee: Option<U256>,
        time_range: Option<TimeRange>,
    ) -> Result<TxHash, WalletError> {
        let ((account_id, nonce), resolved, fee) = try_join!(
            self.account_state(),
            self.resolve_token(&token),
            self.fee_or_quote(fee, TxFeeType::Withdraw, target, &token),
        )?;
        let tx = ForcedExit::new(
            account_id,
            target,
            resolved.id,
            fee,
            nonce,
            self.time_range(time_range),
        );
        let signed = self.coordinator.sign_forced_exit(tx, &resolved).await?;
        Ok(self.provider.submit_tx(&signed, false).await?)
    }

    /// Registers this wallet's L2 key, authorized as configured.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] if a lookup, encoding, signing or submission
    /// fails.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(auth = %self.config.auth)))]
    pub async fn change_pubkey(
        &self,
        fee_token: TokenLike,
        fee: Option<U256>,
        time_range: Option<TimeRange>,
    ) -> Result<TxHash, WalletError> {
        let new_pk_hash = self.pub_key_hash()?;
        let fee_type = TxFeeType::ChangePubKey((&self.config.auth).into());
        let ((account_id, nonce), resolved, fee) = try_join!(
            self.account_state(),
            self.resolve_token(&fee_token),
            self.fee_or_quote(fee, fee_type, self.address(), &fee_token),
        )?;
        let tx = ChangePubKey::new(
            account_id,
            self.address(),
            new_pk_hash,
            resolved.id,
            fee,
            nonce,
            self.time_range(time_range),
        );
        let signed = self.coordinator.sign_change_pubkey(tx).await?;
        Ok(self.provider.submit_tx(&signed, false).await?)
    }

    /// Mints an NFT with `content_hash` for `recipient`.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] if a lookup, encoding, signing or submission
    /// fails.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(%recipient)))]
    pub async fn mint_nft(
        &self,
        recipient: Address,
        content_hash: B256,
        fee_token: TokenLike,
        fee: Option<U256>,
    ) -> Result<TxHash, WalletError> {
        let ((account_id, nonce), resolved, fee) = try_join!(
            self.account_state(),
            self.resolve_token(&fee_token),
            self.fee_or_quote(fee, TxFeeType::MintNft, recipient, &fee_token),
        )?;
        let tx = MintNft::new(
            account_id,
            self.address(),
            content_hash,
            recipient,
            fee,
            resolved.id,
            nonce,
        );
        let signed = self.coordinator.sign_mint_nft(tx, &resolved).await?;
        Ok(self.provider.submit_tx(&signed, false).await?)
    }

    /// Withdraws the NFT `token` to the L1 address `to`.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] if a lookup, encoding, signing or submission
    /// fails.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(%to, %token)))]
    pub async fn withdraw_nft(
        &self,
        to: Address,
        token: TokenId,
        fee_token: TokenLike,
        fee: Option<U256>,
        time_range: Option<TimeRange>,
    ) -> Result<TxHash, WalletError> {
        let fee_type = if self.config.fast_withdrawals {
            TxFeeType::FastWithdrawNft
        } else {
            TxFeeType::WithdrawNft
        };
        let ((account_id, nonce), resolved, fee) = try_join!(
            self.account_state(),
            self.resolve_token(&fee_token),
            self.fee_or_quote(fee, fee_type, to, &fee_token),
        )?;
        let tx = WithdrawNft::new(
            account_id,
            self.address(),
            to,
            token,
            resolved.id,
            fee,
            nonce,
            self.time_range(time_range),
        );
        let signed = self.coordinator.sign_withdraw_nft(tx, &resolved).await?;
        Ok(self
            .provider
            .submit_tx(&signed, self.config.fast_withdrawals)
            .await?)
    }

    /// Signs an order selling `token_sell` for `token_buy` at `ratio`
    /// (`sell:buy` in base units). The order is returned, not submitted; a
    /// [`swap`](Self::swap) settles it.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] if a lookup, encoding or signing fails.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(%token_sell, %token_buy)))]
    pub async fn sign_order(
        &self,
        recipient: Address,
        token_sell: TokenLike,
        token_buy: TokenLike,
        ratio: (U256, U256),
        amount: U256,
        time_range: Option<TimeRange>,
    ) -> Result<SignedOrder, WalletError> {
        let ((account_id, nonce), sell, buy) = try_join!(
            self.account_state(),
            self.resolve_token(&token_sell),
            self.resolve_token(&token_buy),
        )?;
        let order = Order::new(
            account_id,
            recipient,
            nonce,
            sell.id,
            buy.id,
            ratio,
            amount,
            self.time_range(time_range),
        );
        Ok(self.coordinator.sign_order(order, &sell, &buy).await?)
    }

    /// Settles two signed orders, filling `amounts` from each. This account
    /// submits and pays the fee.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] if a lookup, encoding, signing or submission
    /// fails.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(%fee_token)))]
    pub async fn swap(
        &self,
        orders: (SignedOrder, SignedOrder),
        amounts: (U256, U256),
        fee_token: TokenLike,
        fee: Option<U256>,
    ) -> Result<TxHash, WalletError> {
        let ((account_id, nonce), resolved, fee) = try_join!(
            self.account_state(),
            self.resolve_token(&fee_token),
            self.fee_or_quote(fee, TxFeeType::Swap, self.address(), &fee_token),
        )?;
        let (first, second) = orders;
        let swap = Swap::new(
            account_id,
            self.address(),
            nonce,
            (first.order, second.order),
            amounts,
            fee,
            resolved.id,
        );
        let signed = self
            .coordinator
            .sign_swap_with_orders(swap, &resolved, [first.eth_signature, second.eth_signature])
            .await?;
        Ok(self.provider.submit_tx(&signed, false).await?)
    }

    /// Signs `txs` under one L1 signature and submits them as a batch.
    /// Each transaction is paired with the token its message is priced in.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError`] if encoding, signing or submission fails.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(len = txs.len())))]
    pub async fn submit_batch(
        &self,
        txs: Vec<(ZkSyncTx, Token)>,
    ) -> Result<Vec<TxHash>, WalletError> {
        let batch = self.coordinator.sign_batch(txs).await?;
        Ok(self.provider.submit_batch(&batch).await?)
    }
}
