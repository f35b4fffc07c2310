//! A [`zkwire::provider::Provider`] that talks JSON-RPC 2.0 over HTTP.
//!
//! Every request is a `POST` of `{"jsonrpc":"2.0","id":n,"method":..,"params":[..]}`
//! to the configured endpoint. Ids come from a per-instance counter, so
//! clones share nothing and concurrent requests never collide within one
//! instance.
//!
//! ## Error Handling
//!
//! [`RpcClientError`] keeps the full failure context: transport failures,
//! unexpected HTTP statuses (with their body, or the error that stopped it
//! from being read), undecodable bodies and structured JSON-RPC errors.
//! Converted into [`ProviderError`], transport failures and bad statuses
//! become transport errors, undecodable bodies decode errors and JSON-RPC
//! errors protocol errors.

use alloy_primitives::Address;
use http::{HeaderMap, StatusCode};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

use zkwire::fields::format_address;
use zkwire::provider::{AccountInfo, Fee, Provider, ProviderError, TxFeeType, TxHash};
use zkwire::signer::BoxFuture;
use zkwire::token::{TokenLike, Tokens};
use zkwire::tx::{SignedBatch, SignedZkSyncTx, TxEthSignature, ZkSyncTx};

#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

use crate::config::RpcProviderConfig;

/// Errors that can occur while talking to a node.
#[derive(Debug, thiserror::Error)]
pub enum RpcClientError {
    /// HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// JSON-RPC method.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Unexpected HTTP status code.
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        /// JSON-RPC method.
        context: &'static str,
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },
    /// Unexpected HTTP status code whose body could not be read.
    #[error("Unexpected HTTP status {status}: {context}: body unreadable: {source}")]
    ResponseBodyRead {
        /// JSON-RPC method.
        context: &'static str,
        /// The HTTP status code.
        status: StatusCode,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The body is not a JSON-RPC response.
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        /// JSON-RPC method.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The result does not have the expected shape.
    #[error("Unexpected result shape: {context}: {source}")]
    ResultShape {
        /// JSON-RPC method.
        context: &'static str,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
    /// The node returned a JSON-RPC error.
    #[error("RPC error {code}: {context}: {message}")]
    Rpc {
        /// JSON-RPC method.
        context: &'static str,
        /// Error code.
        code: i64,
        /// Error message.
        message: String,
    },
    /// Neither a result nor an error was returned.
    #[error("Empty JSON-RPC response: {context}")]
    EmptyResponse {
        /// JSON-RPC method.
        context: &'static str,
    },
    /// The request could not be serialized.
    #[error("Failed to serialize params: {context}: {source}")]
    Params {
        /// JSON-RPC method.
        context: &'static str,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

impl From<RpcClientError> for ProviderError {
    fn from(e: RpcClientError) -> Self {
        match e {
            RpcClientError::Rpc { code, message, .. } => Self::Protocol { code, message },
            RpcClientError::Http { .. }
            | RpcClientError::HttpStatus { .. }
            | RpcClientError::ResponseBodyRead { .. } => Self::Transport(e.to_string()),
            RpcClientError::JsonDeserialization { .. }
            | RpcClientError::ResultShape { .. }
            | RpcClientError::EmptyResponse { .. }
            | RpcClientError::Params { .. } => Self::Decode(e.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Serialize)]
struct TxWithSignature<'a> {
    tx: &'a ZkSyncTx,
    signature: Option<&'a TxEthSignature>,
}

/// JSON-RPC provider for a zkSync-style node.
#[derive(Debug)]
pub struct RpcProvider {
    url: Url,
    client: Client,
    headers: HeaderMap,
    timeout: Option<Duration>,
    next_id: AtomicU64,
}

impl Clone for RpcProvider {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            client: self.client.clone(),
            headers: self.headers.clone(),
            timeout: self.timeout,
            next_id: AtomicU64::new(1),
        }
    }
}

impl RpcProvider {
    /// Creates a provider from its configuration.
    #[must_use]
    pub fn new(config: RpcProviderConfig) -> Self {
        Self {
            url: config.url,
            client: Client::new(),
            headers: config.headers,
            timeout: config.timeout,
            next_id: AtomicU64::new(1),
        }
    }

    /// Uses a pre-configured reqwest client.
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// The endpoint URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// The configured timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Calls `method` with positional `params` and decodes the result.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError`] describing the failing stage.
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "zkwire.rpc",
            skip_all,
            err,
            fields(method = context, otel.status_code, error.message)
        )
    )]
    pub async fn call<R: DeserializeOwned>(
        &self,
        context: &'static str,
        params: Value,
    ) -> Result<R, RpcClientError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: context,
            params,
        };
        let mut req = self.client.post(self.url.clone()).json(&request);
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let http_response = req
            .send()
            .await
            .map_err(|e| RpcClientError::Http { context, source: e })?;

        let result = if http_response.status() == StatusCode::OK {
            match http_response.json::<RpcResponse>().await {
                Ok(response) => decode_response(context, response),
                Err(e) => Err(RpcClientError::JsonDeserialization { context, source: e }),
            }
        } else {
            let status = http_response.status();
            match http_response.text().await {
                Ok(body) => Err(RpcClientError::HttpStatus {
                    context,
                    status,
                    body,
                }),
                Err(e) => Err(RpcClientError::ResponseBodyRead {
                    context,
                    status,
                    source: e,
                }),
            }
        };

        record_result_on_span(&result);

        result
    }

    /// `account_info`: committed and verified state of `address`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError`] on failure.
    pub async fn get_account_info(&self, address: Address) -> Result<AccountInfo, RpcClientError> {
        self.call("account_info", json!([format_address(&address)]))
            .await
    }

    /// `tokens`: every token the node knows.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError`] on failure.
    pub async fn get_tokens(&self) -> Result<Tokens, RpcClientError> {
        self.call("tokens", json!([])).await
    }

    /// `get_tx_fee`: fee quote for a transaction kind.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError`] on failure.
    pub async fn get_fee(
        &self,
        fee_type: TxFeeType,
        address: Address,
        token: &TokenLike,
    ) -> Result<Fee, RpcClientError> {
        self.call(
            "get_tx_fee",
            json!([fee_type, format_address(&address), token]),
        )
        .await
    }

    /// `tx_submit`: submits one transaction. Swaps send their three L1
    /// signatures as an array, `[submitter, order0, order1]`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError`] on failure.
    pub async fn tx_submit(
        &self,
        tx: &SignedZkSyncTx,
        fast_processing: bool,
    ) -> Result<TxHash, RpcClientError> {
        let context = "tx_submit";
        let params = match tx.tx() {
            ZkSyncTx::Swap(_) => {
                serde_json::to_value((tx.tx(), tx.eth_signatures(), fast_processing))
            }
            _ => serde_json::to_value((tx.tx(), tx.eth_signature(), fast_processing)),
        }
        .map_err(|e| RpcClientError::Params { context, source: e })?;
        self.call(context, params).await
    }

    /// `submit_txs_batch`: submits a batch under its single L1 signature.
    ///
    /// # Errors
    ///
    /// Returns [`RpcClientError`] on failure.
    pub async fn submit_txs_batch(
        &self,
        batch: &SignedBatch,
    ) -> Result<Vec<TxHash>, RpcClientError> {
        let context = "submit_txs_batch";
        let txs = batch
            .txs()
            .iter()
            .map(|tx| TxWithSignature {
                tx,
                signature: None,
            })
            .collect::<Vec<_>>();
        let params = serde_json::to_value((txs, batch.eth_signature()))
            .map_err(|e| RpcClientError::Params { context, source: e })?;
        self.call(context, params).await
    }
}

fn decode_response<R: DeserializeOwned>(
    context: &'static str,
    response: RpcResponse,
) -> Result<R, RpcClientError> {
    if let Some(error) = response.error {
        return Err(RpcClientError::Rpc {
            context,
            code: error.code,
            message: error.message,
        });
    }
    let result = response
        .result
        .ok_or(RpcClientError::EmptyResponse { context })?;
    serde_json::from_value(result).map_err(|e| RpcClientError::ResultShape { context, source: e })
}

impl Provider for RpcProvider {
    fn account_info(&self, address: Address) -> BoxFuture<'_, Result<AccountInfo, ProviderError>> {
        Box::pin(async move { Ok(self.get_account_info(address).await?) })
    }

    fn tokens(&self) -> BoxFuture<'_, Result<Tokens, ProviderError>> {
        Box::pin(async move { Ok(self.get_tokens().await?) })
    }

    fn get_tx_fee<'a>(
        &'a self,
        fee_type: TxFeeType,
        address: Address,
        token: &'a TokenLike,
    ) -> BoxFuture<'a, Result<Fee, ProviderError>> {
        Box::pin(async move { Ok(self.get_fee(fee_type, address, token).await?) })
    }

    fn submit_tx<'a>(
        &'a self,
        tx: &'a SignedZkSyncTx,
        fast_processing: bool,
    ) -> BoxFuture<'a, Result<TxHash, ProviderError>> {
        Box::pin(async move { Ok(self.tx_submit(tx, fast_processing).await?) })
    }

    fn submit_batch<'a>(
        &'a self,
        batch: &'a SignedBatch,
    ) -> BoxFuture<'a, Result<Vec<TxHash>, ProviderError>> {
        Box::pin(async move { Ok(self.submit_txs_batch(batch).await?) })
    }
}

/// Records the outcome of a request on a tracing span, including status and errors.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::ERROR, error = %err, "JSON-RPC request failed");
        }
    }
}

/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R, E: Display>(_result: &Result<R, E>) {}
