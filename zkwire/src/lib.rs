#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Transaction codec and dual-signature pipeline for zkSync-style layer-2
//! networks.
//!
//! Every L2 transaction is signed twice: the L2 key signs a byte-exact
//! binary payload, and the account's L1 key signs a human-readable message
//! describing the same intent. This crate builds both, drives the two
//! signers, and assembles the signed artifact a network node accepts.
//!
//! # Overview
//!
//! Amounts and fees travel in a lossy floating-point packing, so only some
//! values can be signed at all. [`pack`] decides which and encodes them.
//! [`fields`] encodes the fixed-width integers and addresses, and [`tx`]
//! lays every transaction out for the selected [`ProtocolVersion`]. The
//! [`coordinator`] orders encoding and signing so that nothing is returned
//! half-signed.
//!
//! The signing primitives are capabilities injected through traits in
//! [`signer`]; the network through [`provider::Provider`]. Concrete
//! backends live in `zkwire-eth` (L1 signing) and `zkwire-http` (JSON-RPC).
//!
//! # Modules
//!
//! - [`amount`] - Decimal rendering and parsing of token amounts
//! - [`config`] - Wallet configuration
//! - [`coordinator`] - Ordering of encoding and both signatures
//! - [`error`] - Encoding and signing errors
//! - [`fields`] - Fixed-width field encoders and identifiers
//! - [`networks`] - Known networks and endpoints
//! - [`pack`] - Packed amount and fee codec
//! - [`provider`] - Network access capability
//! - [`signer`] - L2 and L1 signing capabilities
//! - [`timestamp`] - Unix timestamps and validity windows
//! - [`token`] - Token metadata
//! - [`tx`] - Transaction types, payload layouts and messages
//! - [`version`] - Payload layout versions
//! - [`wallet`] - Async wallet facade
//! - `blocking` - Blocking wallet facade
//!
//! # Feature Flags
//!
//! - `blocking` - Blocking wallet backed by a current-thread tokio runtime
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod amount;
#[cfg(feature = "blocking")]
pub mod blocking;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fields;
pub mod networks;
pub mod pack;
pub mod provider;
pub mod signer;
pub mod timestamp;
pub mod token;
pub mod tx;
pub mod version;
pub mod wallet;

pub use coordinator::{SignatureCoordinator, SignedOrder};
pub use error::{EncodingError, ErrorKind, SigningError};
pub use version::ProtocolVersion;
