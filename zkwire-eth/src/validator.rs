//! On-chain EIP-1271 validation.

use alloy_primitives::{Address, B256, Bytes};
use alloy_provider::Provider;
use std::fmt;

use zkwire::signer::{BoxFuture, Eip1271Validator, EthSignerError};

use crate::contract::{EIP1271_MAGIC_VALUE, IEIP1271};

/// Asks the account contract itself through an L1 node.
pub struct OnchainEip1271Validator<P> {
    provider: P,
}

impl<P> OnchainEip1271Validator<P> {
    /// Creates a validator calling through `provider`.
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P> fmt::Debug for OnchainEip1271Validator<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnchainEip1271Validator")
            .finish_non_exhaustive()
    }
}

impl<P: Provider + Send + Sync> Eip1271Validator for OnchainEip1271Validator<P> {
    fn is_valid_signature<'a>(
        &'a self,
        account: Address,
        hash: B256,
        signature: &'a [u8],
    ) -> BoxFuture<'a, Result<bool, EthSignerError>> {
        Box::pin(async move {
            let contract = IEIP1271::new(account, &self.provider);
            let magic = contract
                .isValidSignature(hash, Bytes::copy_from_slice(signature))
                .call()
                .await
                .map_err(|e| EthSignerError::Transport(e.to_string()))?;
            #[cfg(feature = "telemetry")]
            tracing::debug!(%account, %magic, "EIP-1271 check");
            Ok(magic.0 == EIP1271_MAGIC_VALUE)
        })
    }
}
