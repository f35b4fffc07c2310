#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Ethereum (L1) signing backends for zkwire.
//!
//! Every zkwire transaction carries an L1 signature over its human-readable
//! message. This crate provides the [`EthSigner`](zkwire::signer::EthSigner)
//! implementations that produce it with alloy:
//!
//! - [`PrivateKeyEthSigner`] - an externally owned account
//! - [`Eip1271EthSigner`] - a contract wallet signed for by its owner key
//!
//! With the `validator` feature, `OnchainEip1271Validator` checks contract
//! signatures by calling `isValidSignature` on the account through an L1
//! node.
//!
//! # Feature Flags
//!
//! - `validator` - On-chain EIP-1271 validation over an alloy provider
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

#[cfg(feature = "validator")]
pub mod contract;
pub mod signer;
#[cfg(feature = "validator")]
pub mod validator;

pub use signer::{Eip1271EthSigner, PrivateKeyEthSigner};
#[cfg(feature = "validator")]
pub use validator::OnchainEip1271Validator;
