//! Signing capabilities injected into the coordinator.
//!
//! The L2 signer owns the zk-friendly key and hash primitives and is
//! synchronous. The L1 signer may live behind a wallet or a remote service,
//! so its operations return a [`BoxFuture`].

use alloy_primitives::{Address, B256, eip191_hash_message, keccak256};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::SigningError;
use crate::fields::PubKeyHash;
use crate::tx::{PackedEthSignature, PackedPublicKey, TxEthSignature, TxSignature};

/// A boxed, `Send` future, used where trait objects need async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Failures of the L2 signing capability.
#[derive(Debug, thiserror::Error)]
pub enum L2SignerError {
    /// The key material is unavailable.
    #[error("L2 signing key unavailable: {0}")]
    KeyUnavailable(String),
    /// The backend failed to produce a signature or hash.
    #[error("L2 signing failed: {0}")]
    Signing(String),
}

/// Failures of the L1 signing capability.
#[derive(Debug, thiserror::Error)]
pub enum EthSignerError {
    /// The signer refused the request.
    #[error("L1 signer rejected the request: {0}")]
    Rejected(String),
    /// The signer could not be reached.
    #[error("L1 signer transport error: {0}")]
    Transport(String),
    /// The signer failed while signing.
    #[error("L1 signing failed: {0}")]
    Signing(String),
}

/// Capability that signs L2 payloads with the account's zk key.
pub trait L2Signer: Send + Sync {
    /// Packed public key of the signing key.
    fn public_key(&self) -> PackedPublicKey;

    /// Hash of a packed public key, the form stored in the account tree.
    ///
    /// # Errors
    ///
    /// Returns [`L2SignerError`] if the key cannot be hashed.
    fn public_key_hash(&self, public_key: &PackedPublicKey) -> Result<PubKeyHash, L2SignerError>;

    /// Signs an encoded payload.
    ///
    /// # Errors
    ///
    /// Returns [`L2SignerError`] if the backend fails.
    fn sign(&self, message: &[u8]) -> Result<TxSignature, L2SignerError>;

    /// Hash binding two encoded orders into a swap payload.
    ///
    /// # Errors
    ///
    /// Returns [`L2SignerError`] if the backend fails.
    fn orders_hash(&self, orders: &[u8]) -> Result<Vec<u8>, L2SignerError>;
}

impl<T: L2Signer + ?Sized> L2Signer for Arc<T> {
    fn public_key(&self) -> PackedPublicKey {
        (**self).public_key()
    }

    fn public_key_hash(&self, public_key: &PackedPublicKey) -> Result<PubKeyHash, L2SignerError> {
        (**self).public_key_hash(public_key)
    }

    fn sign(&self, message: &[u8]) -> Result<TxSignature, L2SignerError> {
        (**self).sign(message)
    }

    fn orders_hash(&self, orders: &[u8]) -> Result<Vec<u8>, L2SignerError> {
        (**self).orders_hash(orders)
    }
}

/// Capability that signs messages with the account's L1 key.
pub trait EthSigner: Send + Sync {
    /// L1 address of the signer.
    fn address(&self) -> Address;

    /// Signs `message`, with the EIP-191 personal-message prefix when
    /// `add_prefix` is set and over its bare keccak hash otherwise.
    fn sign_message<'a>(
        &'a self,
        message: &'a [u8],
        add_prefix: bool,
    ) -> BoxFuture<'a, Result<TxEthSignature, EthSignerError>>;

    /// Checks that an ECDSA `signature` over `message` recovers to
    /// [`address`](Self::address).
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::SignatureVerificationFailed`] on mismatch, and
    /// for contract signatures, which need an [`Eip1271Validator`].
    fn verify(
        &self,
        message: &[u8],
        add_prefix: bool,
        signature: &TxEthSignature,
    ) -> Result<(), SigningError> {
        match signature {
            TxEthSignature::EthereumSignature(sig) => {
                let recovered = recover_signer(sig, message, add_prefix)?;
                if recovered == self.address() {
                    Ok(())
                } else {
                    Err(SigningError::SignatureVerificationFailed(format!(
                        "recovered {recovered}, expected {}",
                        self.address()
                    )))
                }
            }
            TxEthSignature::Eip1271Signature(_) => Err(SigningError::SignatureVerificationFailed(
                "contract signatures need an EIP-1271 validator".to_string(),
            )),
        }
    }
}

impl<T: EthSigner + ?Sized> EthSigner for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn sign_message<'a>(
        &'a self,
        message: &'a [u8],
        add_prefix: bool,
    ) -> BoxFuture<'a, Result<TxEthSignature, EthSignerError>> {
        (**self).sign_message(message, add_prefix)
    }
}

/// Capability that asks an account contract whether it accepts a signature.
pub trait Eip1271Validator: Send + Sync {
    /// Returns `true` if `account` accepts `signature` for `hash`.
    fn is_valid_signature<'a>(
        &'a self,
        account: Address,
        hash: B256,
        signature: &'a [u8],
    ) -> BoxFuture<'a, Result<bool, EthSignerError>>;
}

/// Digest an L1 signature covers.
#[must_use]
pub fn eth_message_hash(message: &[u8], add_prefix: bool) -> B256 {
    if add_prefix {
        eip191_hash_message(message)
    } else {
        keccak256(message)
    }
}

/// Recovers the address that produced an ECDSA signature.
///
/// # Errors
///
/// Returns [`SigningError::SignatureVerificationFailed`] if the signature is
/// malformed or does not recover.
pub fn recover_signer(
    signature: &PackedEthSignature,
    message: &[u8],
    add_prefix: bool,
) -> Result<Address, SigningError> {
    let signature = signature
        .to_signature()
        .map_err(|e| SigningError::SignatureVerificationFailed(e.to_string()))?;
    signature
        .recover_address_from_prehash(&eth_message_hash(message, add_prefix))
        .map_err(|e| SigningError::SignatureVerificationFailed(e.to_string()))
}

/// Verifies an L1 signature of either kind against `expected`.
///
/// ECDSA signatures are checked by local recovery; contract signatures are
/// checked through `validator`.
///
/// # Errors
///
/// Returns [`SigningError::SignatureVerificationFailed`] if the signature
/// does not belong to `expected`, or if a contract signature arrives without
/// a validator.
pub async fn verify_eth_signature(
    signature: &TxEthSignature,
    expected: Address,
    message: &[u8],
    add_prefix: bool,
    validator: Option<&dyn Eip1271Validator>,
) -> Result<(), SigningError> {
    match signature {
        TxEthSignature::EthereumSignature(sig) => {
            let recovered = recover_signer(sig, message, add_prefix)?;
            if recovered != expected {
                return Err(SigningError::SignatureVerificationFailed(format!(
                    "recovered {recovered}, expected {expected}"
                )));
            }
            Ok(())
        }
        TxEthSignature::Eip1271Signature(bytes) => {
            let validator = validator.ok_or_else(|| {
                SigningError::SignatureVerificationFailed(
                    "no EIP-1271 validator configured".to_string(),
                )
            })?;
            let hash = eth_message_hash(message, add_prefix);
            if validator.is_valid_signature(expected, hash, bytes).await? {
                Ok(())
            } else {
                Err(SigningError::SignatureVerificationFailed(format!(
                    "contract {expected} rejected the signature"
                )))
            }
        }
    }
}

/// Deterministic in-memory signers for tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::tx::{ETH_SIGNATURE_LEN, PackedSignature};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// L2 signer whose "signature" is `keccak(message) ‖ keccak(keccak(message))`.
    #[derive(Debug)]
    pub struct FakeL2Signer {
        seed: u8,
    }

    impl FakeL2Signer {
        pub const fn new(seed: u8) -> Self {
            Self { seed }
        }
    }

    impl L2Signer for FakeL2Signer {
        fn public_key(&self) -> PackedPublicKey {
            PackedPublicKey([self.seed; 32])
        }

        fn public_key_hash(
            &self,
            public_key: &PackedPublicKey,
        ) -> Result<PubKeyHash, L2SignerError> {
            PubKeyHash::from_slice(&keccak256(public_key.as_bytes())[..20])
                .map_err(|e| L2SignerError::Signing(e.to_string()))
        }

        fn sign(&self, message: &[u8]) -> Result<TxSignature, L2SignerError> {
            let first = keccak256(message);
            let second = keccak256(first);
            let mut signature = [0u8; 64];
            signature[..32].copy_from_slice(first.as_slice());
            signature[32..].copy_from_slice(second.as_slice());
            Ok(TxSignature {
                pub_key: self.public_key(),
                signature: PackedSignature(signature),
            })
        }

        fn orders_hash(&self, orders: &[u8]) -> Result<Vec<u8>, L2SignerError> {
            Ok(keccak256(orders)[..31].to_vec())
        }
    }

    /// L1 signer that records every request.
    #[derive(Debug, Default)]
    pub struct FakeEthSigner {
        address: Address,
        requests: Mutex<Vec<(Vec<u8>, bool)>>,
        fail: AtomicBool,
    }

    impl FakeEthSigner {
        pub fn new(address: Address) -> Self {
            Self {
                address,
                ..Self::default()
            }
        }

        pub fn failing(address: Address) -> Self {
            let signer = Self::new(address);
            signer.fail.store(true, Ordering::SeqCst);
            signer
        }

        pub fn requests(&self) -> Vec<(Vec<u8>, bool)> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl EthSigner for FakeEthSigner {
        fn address(&self) -> Address {
            self.address
        }

        fn sign_message<'a>(
            &'a self,
            message: &'a [u8],
            add_prefix: bool,
        ) -> BoxFuture<'a, Result<TxEthSignature, EthSignerError>> {
            Box::pin(async move {
                self.requests
                    .lock()
                    .unwrap()
                    .push((message.to_vec(), add_prefix));
                if self.fail.load(Ordering::SeqCst) {
                    return Err(EthSignerError::Rejected("user denied".to_string()));
                }
                let digest = eth_message_hash(message, add_prefix);
                let mut bytes = [0u8; ETH_SIGNATURE_LEN];
                bytes[..32].copy_from_slice(digest.as_slice());
                bytes[32..64].copy_from_slice(digest.as_slice());
                bytes[64] = 27;
                Ok(TxEthSignature::EthereumSignature(PackedEthSignature(bytes)))
            })
        }
    }

    /// Validator that accepts a fixed signature.
    #[derive(Debug)]
    pub struct FixedValidator(pub Vec<u8>);

    impl Eip1271Validator for FixedValidator {
        fn is_valid_signature<'a>(
            &'a self,
            _account: Address,
            _hash: B256,
            signature: &'a [u8],
        ) -> BoxFuture<'a, Result<bool, EthSignerError>> {
            Box::pin(async move { Ok(signature == self.0.as_slice()) })
        }
    }
}
