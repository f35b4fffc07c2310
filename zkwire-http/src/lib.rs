#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! JSON-RPC over HTTP provider for zkwire.
//!
//! [`RpcProvider`] implements [`zkwire::provider::Provider`] against a node's
//! JSON-RPC endpoint using reqwest. [`RpcProviderConfig`] selects the endpoint
//! explicitly, by known network, or from the environment.
//!
//! # Feature Flags
//!
//! - `telemetry` - Emits tracing spans for every JSON-RPC call

pub mod client;
pub mod config;

pub use client::{RpcClientError, RpcProvider};
pub use config::{ConfigError, RpcProviderConfig};
