//! L1 signers backed by local private keys.
//!
//! [`PrivateKeyEthSigner`] signs as an externally owned account.
//! [`Eip1271EthSigner`] signs on behalf of a contract wallet: its owner key
//! produces the signature and the contract decides whether to accept it.

use alloy_primitives::{Address, B256};
use alloy_signer::Signer;
use alloy_signer_local::{LocalSignerError, PrivateKeySigner};
use std::fmt;
use std::str::FromStr;

use zkwire::signer::{BoxFuture, EthSigner, EthSignerError, eth_message_hash};
use zkwire::tx::{PackedEthSignature, TxEthSignature};

async fn sign_digest(
    signer: &PrivateKeySigner,
    message: &[u8],
    add_prefix: bool,
) -> Result<PackedEthSignature, EthSignerError> {
    let hash: B256 = eth_message_hash(message, add_prefix);
    let signature = signer
        .sign_hash(&hash)
        .await
        .map_err(|e| EthSignerError::Signing(e.to_string()))?;
    Ok(signature.into())
}

/// Signs with a secp256k1 key held in memory.
#[derive(Clone)]
pub struct PrivateKeyEthSigner {
    signer: PrivateKeySigner,
}

impl PrivateKeyEthSigner {
    /// Wraps an alloy signer.
    #[must_use]
    pub const fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    /// Parses a hex private key, with or without `0x`.
    ///
    /// # Errors
    ///
    /// Returns [`LocalSignerError`] if the key is not a valid secp256k1
    /// scalar.
    pub fn from_hex(key: &str) -> Result<Self, LocalSignerError> {
        PrivateKeySigner::from_str(key).map(Self::new)
    }

    /// A fresh random key.
    #[must_use]
    pub fn random() -> Self {
        Self::new(PrivateKeySigner::random())
    }

    /// The underlying alloy signer.
    #[must_use]
    pub const fn inner(&self) -> &PrivateKeySigner {
        &self.signer
    }
}

impl fmt::Debug for PrivateKeyEthSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyEthSigner")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

impl EthSigner for PrivateKeyEthSigner {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn sign_message<'a>(
        &'a self,
        message: &'a [u8],
        add_prefix: bool,
    ) -> BoxFuture<'a, Result<TxEthSignature, EthSignerError>> {
        Box::pin(async move {
            let signature = sign_digest(&self.signer, message, add_prefix).await?;
            #[cfg(feature = "telemetry")]
            tracing::debug!(signer = %self.signer.address(), add_prefix, "signed L1 message");
            Ok(TxEthSignature::EthereumSignature(signature))
        })
    }
}

/// Signs for a contract wallet that validates signatures with EIP-1271.
#[derive(Clone)]
pub struct Eip1271EthSigner {
    account: Address,
    owner: PrivateKeySigner,
}

impl Eip1271EthSigner {
    /// `account` is the contract wallet, `owner` the key it trusts.
    #[must_use]
    pub const fn new(account: Address, owner: PrivateKeySigner) -> Self {
        Self { account, owner }
    }

    /// Address of the owner key.
    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner.address()
    }
}

impl fmt::Debug for Eip1271EthSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eip1271EthSigner")
            .field("account", &self.account)
            .field("owner", &self.owner.address())
            .finish()
    }
}

impl EthSigner for Eip1271EthSigner {
    fn address(&self) -> Address {
        self.account
    }

    fn sign_message<'a>(
        &'a self,
        message: &'a [u8],
        add_prefix: bool,
    ) -> BoxFuture<'a, Result<TxEthSignature, EthSignerError>> {
        Box::pin(async move {
            let signature = sign_digest(&self.owner, message, add_prefix).await?;
            #[cfg(feature = "telemetry")]
            tracing::debug!(account = %self.account, "signed L1 message for contract wallet");
            Ok(TxEthSignature::Eip1271Signature(
                signature.as_bytes().to_vec().into(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use zkwire::signer::{recover_signer, verify_eth_signature};
    use zkwire::tx::AuthorizationVariant;
    use zkwire::{ProtocolVersion, SignatureCoordinator};

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const KEY_ADDRESS: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    #[test]
    fn test_address_from_key() {
        let signer = PrivateKeyEthSigner::from_hex(KEY).unwrap();
        assert_eq!(signer.address(), KEY_ADDRESS);
        assert!(PrivateKeyEthSigner::from_hex("0x1234").is_err());
    }

    #[tokio::test]
    async fn test_prefixed_signature_recovers() {
        let signer = PrivateKeyEthSigner::from_hex(KEY).unwrap();
        let message = b"Transfer 1.0 ETH to: 0x19aa2ed8712072e918632259780e587698ef58df\nNonce: 12";
        let signature = signer.sign_message(message, true).await.unwrap();
        signer.verify(message, true, &signature).unwrap();
        verify_eth_signature(&signature, KEY_ADDRESS, message, true, None)
            .await
            .unwrap();
        assert!(signer.verify(message, false, &signature).is_err());
    }

    #[tokio::test]
    async fn test_coordinator_verifies_own_signature() {
        let coordinator = SignatureCoordinator::new(
            PrivateKeyEthSigner::from_hex(KEY).unwrap(),
            ProtocolVersion::Current,
            AuthorizationVariant::Ecdsa,
        );
        let message = b"Withdraw 1.0 ETH to: 0xede35562d3555e61120a151b3c8e8e91d83a378a";
        let signature = coordinator.eth_signer().sign_message(message, true).await.unwrap();

        let verified = coordinator
            .verify_eth_signature(message, &signature, None)
            .await
            .unwrap();
        assert_eq!(verified, Some(KEY_ADDRESS));
        assert!(
            coordinator
                .verify_eth_signature(b"another message", &signature, None)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_raw_signature_recovers() {
        let signer = PrivateKeyEthSigner::random();
        let data = [0x5a; 60];
        let TxEthSignature::EthereumSignature(signature) =
            signer.sign_message(&data, false).await.unwrap()
        else {
            panic!("expected an ECDSA signature");
        };
        assert_eq!(recover_signer(&signature, &data, false).unwrap(), signer.address());
        assert!(matches!(signature.as_bytes()[64], 27 | 28));
    }

    #[tokio::test]
    async fn test_contract_wallet_signature() {
        let account = address!("0x5fbdb2315678afecb367f032d93f642f64180aa3");
        let owner = PrivateKeySigner::from_str(KEY).unwrap();
        let signer = Eip1271EthSigner::new(account, owner);
        assert_eq!(signer.address(), account);
        assert_eq!(signer.owner(), KEY_ADDRESS);

        let message = b"Swap fee: 0.0 ETH\nNonce: 1";
        let signature = signer.sign_message(message, true).await.unwrap();
        let TxEthSignature::Eip1271Signature(bytes) = &signature else {
            panic!("expected a contract signature");
        };
        let packed = PackedEthSignature(<[u8; 65]>::try_from(bytes.as_ref()).unwrap());
        assert_eq!(recover_signer(&packed, message, true).unwrap(), KEY_ADDRESS);
        assert!(
            verify_eth_signature(&signature, account, message, true, None)
                .await
                .is_err()
        );
    }
}
