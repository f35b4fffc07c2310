//! Dual-signature pipeline.
//!
//! [`SignatureCoordinator`] turns an unsigned transaction into a
//! submittable one. Every payload and message is encoded before the first
//! signing request, the L2 signature is produced before the L1 signature,
//! and a signed artifact is only returned once every signature succeeded.

use alloy_primitives::{Address, B256, keccak256};
use std::fmt;
use std::sync::Arc;
#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::error::SigningError;
use crate::signer::{EthSigner, EthSignerError, Eip1271Validator, L2Signer, verify_eth_signature};
use crate::token::Token;
use crate::tx::{
    AuthorizationVariant, ChangePubKey, ChangePubKeyAuthData, ForcedExit, MintNft, Order,
    SignedBatch, SignedZkSyncTx, Swap, Transfer, TxEthSignature, Withdraw, WithdrawNft, ZkSyncTx,
    batch_message, variant_auth_bytes, with_nonce,
};
use crate::version::ProtocolVersion;

/// An order with its maker's signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOrder {
    /// The order, L2 signature attached.
    pub order: Order,
    /// The maker's L1 signature, absent for CREATE2 accounts.
    pub eth_signature: Option<TxEthSignature>,
}

/// Produces the L2 and L1 signatures of an account's transactions.
pub struct SignatureCoordinator<E> {
    version: ProtocolVersion,
    auth: AuthorizationVariant,
    l2_signer: Option<Arc<dyn L2Signer>>,
    eth_signer: E,
}

impl<E> fmt::Debug for SignatureCoordinator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureCoordinator")
            .field("version", &self.version)
            .field("auth", &self.auth)
            .field("has_l2_signer", &self.l2_signer.is_some())
            .finish_non_exhaustive()
    }
}

fn ensure_orders_signed(swap: &Swap) -> Result<(), SigningError> {
    if swap.orders.0.signature().is_none() || swap.orders.1.signature().is_none() {
        return Err(SigningError::SignatureVerificationFailed(
            "both orders must carry their maker's L2 signature".to_string(),
        ));
    }
    Ok(())
}

impl<E: EthSigner> SignatureCoordinator<E> {
    /// Creates a coordinator without an L2 key. Only operations that need
    /// no L2 signature work until one is added.
    pub const fn new(eth_signer: E, version: ProtocolVersion, auth: AuthorizationVariant) -> Self {
        Self {
            version,
            auth,
            l2_signer: None,
            eth_signer,
        }
    }

    /// Adds the L2 signing capability.
    #[must_use]
    pub fn with_l2_signer(mut self, l2_signer: Arc<dyn L2Signer>) -> Self {
        self.l2_signer = Some(l2_signer);
        self
    }

    /// Payload layout in use.
    #[must_use]
    pub const fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// How the account authorizes key changes.
    #[must_use]
    pub const fn auth(&self) -> &AuthorizationVariant {
        &self.auth
    }

    /// The L1 signer.
    #[must_use]
    pub const fn eth_signer(&self) -> &E {
        &self.eth_signer
    }

    /// The L2 signer, if configured.
    #[must_use]
    pub fn l2_signer(&self) -> Option<&dyn L2Signer> {
        self.l2_signer.as_deref()
    }

    fn require_l2(&self) -> Result<&dyn L2Signer, SigningError> {
        self.l2_signer().ok_or(SigningError::SigningKeyRequired)
    }

    /// Encodes the signing payload of any transaction. Swaps need the L2
    /// signer for their orders hash.
    ///
    /// # Errors
    ///
    /// Returns encoding errors, or [`SigningError::SigningKeyRequired`] for
    /// a swap without an L2 signer.
    pub fn tx_bytes(&self, tx: &ZkSyncTx) -> Result<Vec<u8>, SigningError> {
        let version = self.version;
        Ok(match tx {
            ZkSyncTx::Transfer(tx) => tx.get_bytes(version)?,
            ZkSyncTx::Withdraw(tx) => tx.get_bytes(version)?,
            ZkSyncTx::ChangePubKey(tx) => tx.get_bytes(version)?,
            ZkSyncTx::ForcedExit(tx) => tx.get_bytes(version)?,
            ZkSyncTx::MintNft(tx) => tx.get_bytes(version)?,
            ZkSyncTx::WithdrawNft(tx) => tx.get_bytes(version)?,
            ZkSyncTx::Swap(tx) => {
                let orders = tx.orders_bytes(version)?;
                let hash = self.require_l2()?.orders_hash(&orders)?;
                tx.get_bytes(version, &hash)?
            }
        })
    }

    /// Requests an L1 signature over `message`, or nothing for CREATE2
    /// accounts, which never sign on L1.
    async fn sign_eth(&self, message: &[u8]) -> Result<Option<TxEthSignature>, SigningError> {
        if matches!(self.auth, AuthorizationVariant::Create2(_)) {
            return Ok(None);
        }
        Ok(Some(self.eth_signer.sign_message(message, true).await?))
    }

    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        tx_type = %tx.tx_type(),
        nonce = %tx.nonce()
    )))]
    async fn sign_single(
        &self,
        mut tx: ZkSyncTx,
        token: &Token,
    ) -> Result<SignedZkSyncTx, SigningError> {
        let bytes = self.tx_bytes(&tx)?;
        let message = with_nonce(&tx.ethereum_sign_message_part(token)?, tx.nonce());
        let signature = self.require_l2()?.sign(&bytes)?;
        let eth_signature = self.sign_eth(message.as_bytes()).await?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(has_eth_signature = eth_signature.is_some(), "transaction signed");

        tx.set_signature(signature);
        Ok(SignedZkSyncTx::new(tx, vec![eth_signature]))
    }

    /// Signs a transfer; `token` is the transferred token.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if encoding or any signature fails.
    pub async fn sign_transfer(
        &self,
        tx: Transfer,
        token: &Token,
    ) -> Result<SignedZkSyncTx, SigningError> {
        self.sign_single(tx.into(), token).await
    }

    /// Signs a withdrawal; `token` is the withdrawn token.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if encoding or any signature fails.
    pub async fn sign_withdraw(
        &self,
        tx: Withdraw,
        token: &Token,
    ) -> Result<SignedZkSyncTx, SigningError> {
        self.sign_single(tx.into(), token).await
    }

    /// Signs a forced exit; `token` is the exited token.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if encoding or any signature fails.
    pub async fn sign_forced_exit(
        &self,
        tx: ForcedExit,
        token: &Token,
    ) -> Result<SignedZkSyncTx, SigningError> {
        self.sign_single(tx.into(), token).await
    }

    /// Signs an NFT mint; `fee_token` prices the fee.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if encoding or any signature fails.
    pub async fn sign_mint_nft(
        &self,
        tx: MintNft,
        fee_token: &Token,
    ) -> Result<SignedZkSyncTx, SigningError> {
        self.sign_single(tx.into(), fee_token).await
    }

    /// Signs an NFT withdrawal; `fee_token` prices the fee.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if encoding or any signature fails.
    pub async fn sign_withdraw_nft(
        &self,
        tx: WithdrawNft,
        fee_token: &Token,
    ) -> Result<SignedZkSyncTx, SigningError> {
        self.sign_single(tx.into(), fee_token).await
    }

    /// Builds the authorization of a key change. `eth_data` is signed only
    /// for ECDSA accounts.
    async fn authorize_change_pubkey(
        &self,
        eth_data: &[u8],
        batch_hash: Option<B256>,
    ) -> Result<ChangePubKeyAuthData, SigningError> {
        match &self.auth {
            AuthorizationVariant::Onchain => Ok(ChangePubKeyAuthData::Onchain),
            AuthorizationVariant::Create2(data) => Ok(ChangePubKeyAuthData::Create2(*data)),
            AuthorizationVariant::Ecdsa => {
                match self.eth_signer.sign_message(eth_data, true).await? {
                    TxEthSignature::EthereumSignature(eth_signature) => {
                        Ok(ChangePubKeyAuthData::Ecdsa {
                            eth_signature,
                            batch_hash: batch_hash.unwrap_or(B256::ZERO),
                        })
                    }
                    TxEthSignature::Eip1271Signature(_) => {
                        Err(SigningError::EthSigner(EthSignerError::Signing(
                            "ECDSA authorization needs an ECDSA signature".to_string(),
                        )))
                    }
                }
            }
        }
    }

    fn eth_signed_data(
        &self,
        tx: &ChangePubKey,
        batch_hash: Option<B256>,
    ) -> Result<Vec<u8>, SigningError> {
        if self.version == ProtocolVersion::Legacy
            && matches!(self.auth, AuthorizationVariant::Create2(_))
        {
            return Err(SigningError::UnknownAuthorizationVariant(
                "CREATE2 is not available in the legacy layout".to_string(),
            ));
        }
        let auth_bytes = variant_auth_bytes(&self.auth, batch_hash);
        Ok(tx.get_eth_signed_data(self.version, auth_bytes)?)
    }

    /// Signs a key change and attaches its L1 authorization.
    ///
    /// The transaction itself carries no L1 message signature; the
    /// authorization proves ownership of the account.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if encoding or any signature fails.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        auth = %self.auth,
        nonce = %tx.nonce
    )))]
    pub async fn sign_change_pubkey(
        &self,
        mut tx: ChangePubKey,
    ) -> Result<SignedZkSyncTx, SigningError> {
        let bytes = tx.get_bytes(self.version)?;
        let eth_data = self.eth_signed_data(&tx, None)?;
        let signature = self.require_l2()?.sign(&bytes)?;
        let auth_data = self.authorize_change_pubkey(&eth_data, None).await?;

        tx.set_signature(signature);
        tx.set_eth_authorization(self.version, auth_data);
        Ok(SignedZkSyncTx::new(tx.into(), vec![None]))
    }

    /// Signs an order with this account's keys.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if encoding or any signature fails.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(nonce = %order.nonce)))]
    pub async fn sign_order(
        &self,
        mut order: Order,
        token_sell: &Token,
        token_buy: &Token,
    ) -> Result<SignedOrder, SigningError> {
        let bytes = order.get_bytes(self.version)?;
        let message = order.ethereum_sign_message(token_sell, token_buy)?;
        let signature = self.require_l2()?.sign(&bytes)?;
        let eth_signature = self.sign_eth(message.as_bytes()).await?;

        order.set_signature(signature);
        Ok(SignedOrder {
            order,
            eth_signature,
        })
    }

    /// Signs a swap together with both of its orders, when this account is
    /// the submitter and the maker of both. L1 signatures are positional:
    /// `[submitter, order0, order1]`.
    ///
    /// `order_tokens` holds the `(sell, buy)` tokens of each order.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError`] if encoding or any signature fails.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(nonce = %swap.nonce)))]
    pub async fn sign_swap(
        &self,
        mut swap: Swap,
        fee_token: &Token,
        order_tokens: [(&Token, &Token); 2],
    ) -> Result<SignedZkSyncTx, SigningError> {
        let [(sell0, buy0), (sell1, buy1)] = order_tokens;
        let order0_bytes = swap.orders.0.get_bytes(self.version)?;
        let order1_bytes = swap.orders.1.get_bytes(self.version)?;
        let order0_message = swap.orders.0.ethereum_sign_message(sell0, buy0)?;
        let order1_message = swap.orders.1.ethereum_sign_message(sell1, buy1)?;
        let swap_message = swap.ethereum_sign_message(fee_token)?;

        let l2 = self.require_l2()?;
        let orders = [order0_bytes.as_slice(), order1_bytes.as_slice()].concat();
        let orders_hash = l2.orders_hash(&orders)?;
        let swap_bytes = swap.get_bytes(self.version, &orders_hash)?;

        let order0_signature = l2.sign(&order0_bytes)?;
        let order1_signature = l2.sign(&order1_bytes)?;
        let swap_signature = l2.sign(&swap_bytes)?;

        let submitter_eth = self.sign_eth(swap_message.as_bytes()).await?;
        let order0_eth = self.sign_eth(order0_message.as_bytes()).await?;
        let order1_eth = self.sign_eth(order1_message.as_bytes()).await?;

        let (order0, order1) = swap.orders_mut();
        order0.set_signature(order0_signature);
        order1.set_signature(order1_signature);
        swap.set_signature(swap_signature);
        Ok(SignedZkSyncTx::new(
            swap.into(),
            vec![submitter_eth, order0_eth, order1_eth],
        ))
    }

    /// Signs a swap whose orders were signed by their makers. Only the
    /// submitter signs here.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::SignatureVerificationFailed`] if an order has
    /// no L2 signature, or any encoding or signing error.
    pub async fn sign_swap_with_orders(
        &self,
        mut swap: Swap,
        fee_token: &Token,
        orders: [Option<TxEthSignature>; 2],
    ) -> Result<SignedZkSyncTx, SigningError> {
        ensure_orders_signed(&swap)?;
        let swap_message = swap.ethereum_sign_message(fee_token)?;
        let swap_bytes = self.tx_bytes(&ZkSyncTx::Swap(Box::new(swap.clone())))?;
        let signature = self.require_l2()?.sign(&swap_bytes)?;
        let submitter_eth = self.sign_eth(swap_message.as_bytes()).await?;

        swap.set_signature(signature);
        let [order0_eth, order1_eth] = orders;
        Ok(SignedZkSyncTx::new(
            swap.into(),
            vec![submitter_eth, order0_eth, order1_eth],
        ))
    }

    /// Signs a batch under a single L1 signature over the batch message.
    ///
    /// Each entry pairs a transaction with the token its message is priced
    /// in. An ECDSA key change inside the batch binds the batch hash,
    /// `keccak256` of every payload concatenated.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::EmptyBatch`] for an empty batch,
    /// [`SigningError::SignatureVerificationFailed`] for a swap whose orders
    /// are unsigned, or any encoding or signing error.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(len = txs.len())))]
    pub async fn sign_batch(
        &self,
        txs: Vec<(ZkSyncTx, Token)>,
    ) -> Result<SignedBatch, SigningError> {
        let first_nonce = txs.first().ok_or(SigningError::EmptyBatch)?.0.nonce();
        for (tx, _) in &txs {
            if let ZkSyncTx::Swap(swap) = tx {
                ensure_orders_signed(swap)?;
            }
        }

        let payloads = txs
            .iter()
            .map(|(tx, _)| self.tx_bytes(tx))
            .collect::<Result<Vec<_>, _>>()?;
        let batch_hash = keccak256(payloads.concat());
        let parts = txs
            .iter()
            .map(|(tx, token)| tx.ethereum_sign_message_part(token))
            .collect::<Result<Vec<_>, _>>()?;
        let message = batch_message(&parts, first_nonce);
        let eth_data = txs
            .iter()
            .map(|(tx, _)| match tx {
                ZkSyncTx::ChangePubKey(cpk) => {
                    self.eth_signed_data(cpk, Some(batch_hash)).map(Some)
                }
                _ => Ok(None),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let l2 = self.require_l2()?;
        let signatures = payloads
            .iter()
            .map(|payload| l2.sign(payload))
            .collect::<Result<Vec<_>, _>>()?;

        let mut signed = Vec::with_capacity(txs.len());
        for (((mut tx, _), signature), eth_data) in txs.into_iter().zip(signatures).zip(eth_data) {
            if let (ZkSyncTx::ChangePubKey(cpk), Some(eth_data)) = (&mut tx, eth_data) {
                let auth = self.authorize_change_pubkey(&eth_data, Some(batch_hash)).await?;
                cpk.set_eth_authorization(self.version, auth);
            }
            tx.set_signature(signature);
            signed.push(tx);
        }
        let eth_signature = self.sign_eth(message.as_bytes()).await?;
        Ok(SignedBatch::new(signed, eth_signature))
    }

    /// Verifies an L1 signature of this account over `message`.
    ///
    /// ECDSA signatures are recovered locally and contract signatures go to
    /// `validator`. A CREATE2 account has no L1 key, so nothing is checked
    /// and `None` is returned. Otherwise the verified address is returned.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::SignatureVerificationFailed`] on mismatch, or
    /// when a contract signature arrives without a validator.
    pub async fn verify_eth_signature(
        &self,
        message: &[u8],
        signature: &TxEthSignature,
        validator: Option<&dyn Eip1271Validator>,
    ) -> Result<Option<Address>, SigningError> {
        if matches!(self.auth, AuthorizationVariant::Create2(_)) {
            return Ok(None);
        }
        let account = self.eth_signer.address();
        verify_eth_signature(signature, account, message, true, validator).await?;
        Ok(Some(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EncodingError, ErrorKind};
    use crate::fields::{AccountId, Nonce, PubKeyHash, TokenId};
    use crate::pack::PackError;
    use crate::signer::testing::{FakeEthSigner, FakeL2Signer, FixedValidator};
    use crate::timestamp::TimeRange;
    use crate::tx::Create2Data;
    use alloy_primitives::{U256, address};

    const FROM: Address = address!("0xede35562d3555e61120a151b3c8e8e91d83a378a");
    const TO: Address = address!("0x19aa2ed8712072e918632259780e587698ef58df");

    fn coordinator(auth: AuthorizationVariant) -> SignatureCoordinator<FakeEthSigner> {
        SignatureCoordinator::new(FakeEthSigner::new(FROM), ProtocolVersion::Current, auth)
            .with_l2_signer(Arc::new(FakeL2Signer::new(1)))
    }

    fn create2() -> AuthorizationVariant {
        AuthorizationVariant::Create2(Create2Data {
            creator_address: address!("0x5fbdb2315678afecb367f032d93f642f64180aa3"),
            salt_arg: B256::repeat_byte(0x11),
            code_hash: B256::repeat_byte(0x22),
        })
    }

    fn transfer(fee: u64) -> Transfer {
        Transfer::new(
            AccountId(44),
            FROM,
            TO,
            TokenId(0),
            U256::from(1_000_000_000_000u64),
            U256::from(fee),
            Nonce(12),
            Some(TimeRange::default()),
        )
    }

    fn change_pubkey() -> ChangePubKey {
        ChangePubKey::new(
            AccountId(44),
            FROM,
            PubKeyHash([0x33; 20]),
            TokenId(0),
            U256::ZERO,
            Nonce(0),
            Some(TimeRange::default()),
        )
    }

    fn order(nonce: u32) -> Order {
        Order::new(
            AccountId(44),
            FROM,
            Nonce(nonce),
            TokenId(0),
            TokenId(2),
            (U256::from(1u8), U256::from(2u8)),
            U256::ZERO,
            Some(TimeRange::default()),
        )
    }

    fn usdc() -> Token {
        Token::new(TokenId(2), Address::ZERO, "USDC", 6)
    }

    #[tokio::test]
    async fn test_transfer_signs_payload_and_message() {
        let coordinator = coordinator(AuthorizationVariant::Ecdsa);
        let tx = transfer(1_000_000);
        let payload = tx.get_bytes(ProtocolVersion::Current).unwrap();

        let signed = coordinator.sign_transfer(tx, &Token::eth()).await.unwrap();

        let expected = FakeL2Signer::new(1).sign(&payload).unwrap();
        assert_eq!(signed.tx().signature(), Some(&expected));
        assert!(signed.eth_signature().is_some());
        let requests = coordinator.eth_signer().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            String::from_utf8(requests[0].0.clone()).unwrap(),
            "Transfer 0.000001 ETH to: 0x19aa2ed8712072e918632259780e587698ef58df\n\
             Fee: 0.000000000001 ETH\n\
             Nonce: 12"
        );
        assert!(requests[0].1);
    }

    #[tokio::test]
    async fn test_unpackable_fee_fails_before_signing() {
        let coordinator = coordinator(AuthorizationVariant::Ecdsa);
        let err = coordinator
            .sign_transfer(transfer(12_345), &Token::eth())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SigningError::Encoding(EncodingError::Pack(PackError::ValueNotPackable { .. }))
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(coordinator.eth_signer().requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_l2_key() {
        let coordinator = SignatureCoordinator::new(
            FakeEthSigner::new(FROM),
            ProtocolVersion::Current,
            AuthorizationVariant::Ecdsa,
        );
        let err = coordinator
            .sign_transfer(transfer(1_000_000), &Token::eth())
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::SigningKeyRequired));
        assert!(coordinator.eth_signer().requests().is_empty());
    }

    #[tokio::test]
    async fn test_eth_failure_returns_no_artifact() {
        let coordinator = SignatureCoordinator::new(
            FakeEthSigner::failing(FROM),
            ProtocolVersion::Current,
            AuthorizationVariant::Ecdsa,
        )
        .with_l2_signer(Arc::new(FakeL2Signer::new(1)));
        let err = coordinator
            .sign_transfer(transfer(1_000_000), &Token::eth())
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::EthSigner(EthSignerError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_create2_never_asks_for_eth_signature() {
        let coordinator = coordinator(create2());

        let signed = coordinator
            .sign_transfer(transfer(1_000_000), &Token::eth())
            .await
            .unwrap();
        assert!(signed.eth_signature().is_none());
        assert!(signed.tx().signature().is_some());

        let signed = coordinator.sign_change_pubkey(change_pubkey()).await.unwrap();
        let ZkSyncTx::ChangePubKey(cpk) = signed.tx() else {
            panic!("expected a key change");
        };
        assert!(matches!(
            cpk.eth_auth_data(),
            Some(ChangePubKeyAuthData::Create2(_))
        ));
        assert!(coordinator.eth_signer().requests().is_empty());
    }

    #[tokio::test]
    async fn test_ecdsa_change_pubkey_signs_eth_data() {
        let coordinator = coordinator(AuthorizationVariant::Ecdsa);
        let tx = change_pubkey();
        let eth_data = tx
            .get_eth_signed_data(ProtocolVersion::Current, B256::ZERO)
            .unwrap();

        let signed = coordinator.sign_change_pubkey(tx).await.unwrap();

        let requests = coordinator.eth_signer().requests();
        assert_eq!(requests, vec![(eth_data, true)]);
        let ZkSyncTx::ChangePubKey(cpk) = signed.tx() else {
            panic!("expected a key change");
        };
        assert!(matches!(
            cpk.eth_auth_data(),
            Some(ChangePubKeyAuthData::Ecdsa { batch_hash, .. }) if *batch_hash == B256::ZERO
        ));
        assert!(signed.eth_signature().is_none());
    }

    #[tokio::test]
    async fn test_onchain_change_pubkey_needs_no_eth_signature() {
        let coordinator = coordinator(AuthorizationVariant::Onchain);
        let signed = coordinator.sign_change_pubkey(change_pubkey()).await.unwrap();
        let ZkSyncTx::ChangePubKey(cpk) = signed.tx() else {
            panic!("expected a key change");
        };
        assert_eq!(cpk.eth_auth_data(), Some(&ChangePubKeyAuthData::Onchain));
        assert!(coordinator.eth_signer().requests().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_change_pubkey_signs_text() {
        let coordinator = SignatureCoordinator::new(
            FakeEthSigner::new(FROM),
            ProtocolVersion::Legacy,
            AuthorizationVariant::Ecdsa,
        )
        .with_l2_signer(Arc::new(FakeL2Signer::new(1)));
        let signed = coordinator.sign_change_pubkey(change_pubkey()).await.unwrap();

        let requests = coordinator.eth_signer().requests();
        assert!(
            String::from_utf8(requests[0].0.clone())
                .unwrap()
                .starts_with("Register zkSync pubkey:\n\n")
        );
        let ZkSyncTx::ChangePubKey(cpk) = signed.tx() else {
            panic!("expected a key change");
        };
        assert!(cpk.eth_signature().is_some());
        assert!(cpk.eth_auth_data().is_none());
    }

    #[tokio::test]
    async fn test_swap_signatures_are_positional() {
        let coordinator = coordinator(AuthorizationVariant::Ecdsa);
        let swap = Swap::new(
            AccountId(44),
            FROM,
            Nonce(5),
            (order(6), order(7)),
            (U256::from(1_000u64), U256::from(2_000u64)),
            U256::ZERO,
            TokenId(0),
        );
        let eth = Token::eth();
        let usdc = usdc();

        let signed = coordinator
            .sign_swap(swap, &eth, [(&eth, &usdc), (&eth, &usdc)])
            .await
            .unwrap();

        assert_eq!(signed.eth_signatures().len(), 3);
        let requests = coordinator.eth_signer().requests();
        let messages: Vec<String> = requests
            .into_iter()
            .map(|(m, _)| String::from_utf8(m).unwrap())
            .collect();
        assert_eq!(messages[0], "Swap fee: 0.0 ETH\nNonce: 5");
        assert!(messages[1].ends_with("Nonce: 6"));
        assert!(messages[2].ends_with("Nonce: 7"));

        let ZkSyncTx::Swap(swap) = signed.tx() else {
            panic!("expected a swap");
        };
        assert!(swap.orders.0.signature().is_some());
        assert!(swap.orders.1.signature().is_some());
        assert!(swap.signature().is_some());
    }

    #[tokio::test]
    async fn test_swap_with_unsigned_orders_is_rejected() {
        let coordinator = coordinator(AuthorizationVariant::Ecdsa);
        let swap = Swap::new(
            AccountId(44),
            FROM,
            Nonce(5),
            (order(6), order(7)),
            (U256::from(1_000u64), U256::from(2_000u64)),
            U256::ZERO,
            TokenId(0),
        );
        let err = coordinator
            .sign_swap_with_orders(swap, &Token::eth(), [None, None])
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::SignatureVerificationFailed(_)));
    }

    #[tokio::test]
    async fn test_batch_uses_one_message_and_batch_hash() {
        let coordinator = coordinator(AuthorizationVariant::Ecdsa);
        let cpk: ZkSyncTx = change_pubkey().into();
        let mut second = transfer(0);
        second.nonce = Nonce(1);
        let second: ZkSyncTx = second.into();

        let expected_hash = keccak256(
            [
                coordinator.tx_bytes(&cpk).unwrap(),
                coordinator.tx_bytes(&second).unwrap(),
            ]
            .concat(),
        );

        let batch = coordinator
            .sign_batch(vec![(cpk, Token::eth()), (second, Token::eth())])
            .await
            .unwrap();

        assert_eq!(batch.txs().len(), 2);
        assert!(batch.txs().iter().all(|tx| tx.signature().is_some()));
        assert!(batch.eth_signature().is_some());

        let ZkSyncTx::ChangePubKey(cpk) = &batch.txs()[0] else {
            panic!("expected a key change");
        };
        assert!(matches!(
            cpk.eth_auth_data(),
            Some(ChangePubKeyAuthData::Ecdsa { batch_hash, .. }) if *batch_hash == expected_hash
        ));

        let requests = coordinator.eth_signer().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            String::from_utf8(requests[1].0.clone()).unwrap(),
            "Set signing key: 3333333333333333333333333333333333333333\n\
             Transfer 0.000001 ETH to: 0x19aa2ed8712072e918632259780e587698ef58df\n\
             Nonce: 0"
        );
    }

    #[tokio::test]
    async fn test_batch_with_unsigned_swap_orders_is_rejected() {
        let coordinator = coordinator(AuthorizationVariant::Ecdsa);
        let swap: ZkSyncTx = Swap::new(
            AccountId(44),
            FROM,
            Nonce(5),
            (order(6), order(7)),
            (U256::from(1_000u64), U256::from(2_000u64)),
            U256::ZERO,
            TokenId(0),
        )
        .into();

        let err = coordinator
            .sign_batch(vec![(transfer(0).into(), Token::eth()), (swap, Token::eth())])
            .await
            .unwrap_err();

        assert!(matches!(err, SigningError::SignatureVerificationFailed(_)));
        assert!(coordinator.eth_signer().requests().is_empty());
    }

    #[tokio::test]
    async fn test_verify_own_ecdsa_signature_mismatch() {
        let coordinator = coordinator(AuthorizationVariant::Ecdsa);
        let other = SignatureCoordinator::new(
            FakeEthSigner::new(TO),
            ProtocolVersion::Current,
            AuthorizationVariant::Ecdsa,
        );
        let signature = other.eth_signer().sign_message(b"hello", true).await.unwrap();

        let err = coordinator
            .verify_eth_signature(b"hello", &signature, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::SignatureVerificationFailed(_)));
    }

    #[tokio::test]
    async fn test_verify_contract_signature_goes_through_validator() {
        let coordinator = coordinator(AuthorizationVariant::Onchain);
        let signature = TxEthSignature::Eip1271Signature(vec![7u8, 7, 7].into());

        let accepting = FixedValidator(vec![7, 7, 7]);
        let verified = coordinator
            .verify_eth_signature(b"hello", &signature, Some(&accepting))
            .await
            .unwrap();
        assert_eq!(verified, Some(FROM));

        let rejecting = FixedValidator(vec![1]);
        assert!(
            coordinator
                .verify_eth_signature(b"hello", &signature, Some(&rejecting))
                .await
                .is_err()
        );
        assert!(
            coordinator
                .verify_eth_signature(b"hello", &signature, None)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_verify_create2_account_has_nothing_to_check() {
        let coordinator = coordinator(create2());
        let signature = TxEthSignature::Eip1271Signature(vec![1u8].into());
        let verified = coordinator
            .verify_eth_signature(b"hello", &signature, None)
            .await
            .unwrap();
        assert_eq!(verified, None);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let coordinator = coordinator(AuthorizationVariant::Ecdsa);
        assert!(matches!(
            coordinator.sign_batch(Vec::new()).await,
            Err(SigningError::EmptyBatch)
        ));
    }
}
