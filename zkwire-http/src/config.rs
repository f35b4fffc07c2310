//! Provider configuration.
//!
//! Built in code, or read from the environment:
//!
//! | Variable | Meaning |
//! |---|---|
//! | `ZKWIRE_RPC_URL` | JSON-RPC endpoint; wins over `ZKWIRE_NETWORK` |
//! | `ZKWIRE_NETWORK` | Known network whose default endpoint to use |
//! | `ZKWIRE_RPC_TIMEOUT_SECS` | Per-request timeout in seconds |
//!
//! A `.env` file in the working directory is loaded first if present.

use http::HeaderMap;
use std::time::Duration;
use url::Url;
use zkwire::networks::{Network, UnknownNetwork};

/// Environment variable holding the endpoint URL.
pub const RPC_URL_VAR: &str = "ZKWIRE_RPC_URL";
/// Environment variable holding the network name.
pub const NETWORK_VAR: &str = "ZKWIRE_NETWORK";
/// Environment variable holding the timeout in seconds.
pub const TIMEOUT_VAR: &str = "ZKWIRE_RPC_TIMEOUT_SECS";

/// Errors raised while building a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The endpoint is not a valid URL.
    #[error("invalid RPC URL {url:?}: {source}")]
    InvalidUrl {
        /// The rejected value.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// The network name is not known.
    #[error(transparent)]
    UnknownNetwork(#[from] UnknownNetwork),
    /// The timeout is not a whole number of seconds.
    #[error("invalid ZKWIRE_RPC_TIMEOUT_SECS value {0:?}")]
    InvalidTimeout(String),
}

/// Where and how an [`RpcProvider`](crate::RpcProvider) connects.
#[derive(Debug, Clone)]
pub struct RpcProviderConfig {
    /// JSON-RPC endpoint.
    pub url: Url,
    /// Per-request timeout, none by default.
    pub timeout: Option<Duration>,
    /// Headers sent with every request.
    pub headers: HeaderMap,
}

impl RpcProviderConfig {
    /// Configuration for an explicit endpoint.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            timeout: None,
            headers: HeaderMap::new(),
        }
    }

    /// Configuration for the default endpoint of `network`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the built-in URL does not parse.
    pub fn for_network(network: Network) -> Result<Self, ConfigError> {
        parse_url(network.default_rpc_url()).map(Self::new)
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets headers sent with every request.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Reads the configuration from the environment, after loading `.env`.
    /// Without either variable the mainnet endpoint is used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match (lookup(RPC_URL_VAR), lookup(NETWORK_VAR)) {
            (Some(url), _) => Self::new(parse_url(&url)?),
            (None, Some(network)) => Self::for_network(network.parse()?)?,
            (None, None) => Self::for_network(Network::default())?,
        };
        if let Some(secs) = lookup(TIMEOUT_VAR) {
            let secs = secs
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(secs.clone()))?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

fn parse_url(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|source| ConfigError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_to_mainnet() {
        let config = RpcProviderConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.url.as_str(), "https://api.zksync.io/jsrpc");
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_network_variable() {
        let config =
            RpcProviderConfig::from_lookup(lookup(&[(NETWORK_VAR, "rinkeby")])).unwrap();
        assert_eq!(config.url.as_str(), "https://rinkeby-api.zksync.io/jsrpc");
    }

    #[test]
    fn test_url_wins_over_network() {
        let config = RpcProviderConfig::from_lookup(lookup(&[
            (RPC_URL_VAR, "http://10.0.0.2:3030/"),
            (NETWORK_VAR, "ropsten"),
            (TIMEOUT_VAR, "15"),
        ]))
        .unwrap();
        assert_eq!(config.url.as_str(), "http://10.0.0.2:3030/");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            RpcProviderConfig::from_lookup(lookup(&[(NETWORK_VAR, "goerli")])),
            Err(ConfigError::UnknownNetwork(_))
        ));
        assert!(matches!(
            RpcProviderConfig::from_lookup(lookup(&[(RPC_URL_VAR, "not a url")])),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            RpcProviderConfig::from_lookup(lookup(&[(TIMEOUT_VAR, "soon")])),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }
}
