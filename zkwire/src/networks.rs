//! Known networks and their default endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A network the library knows how to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Ethereum mainnet.
    #[default]
    Mainnet,
    /// Rinkeby testnet.
    Rinkeby,
    /// Ropsten testnet.
    Ropsten,
    /// A local development node.
    Localhost,
}

/// Static description of a [`Network`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Lowercase network name.
    pub name: &'static str,
    /// L1 chain id.
    pub chain_id: u64,
    /// Default JSON-RPC endpoint.
    pub rpc_url: &'static str,
}

/// Every known network.
pub const NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "mainnet",
        chain_id: 1,
        rpc_url: "https://api.zksync.io/jsrpc",
    },
    NetworkInfo {
        name: "rinkeby",
        chain_id: 4,
        rpc_url: "https://rinkeby-api.zksync.io/jsrpc",
    },
    NetworkInfo {
        name: "ropsten",
        chain_id: 3,
        rpc_url: "https://ropsten-api.zksync.io/jsrpc",
    },
    NetworkInfo {
        name: "localhost",
        chain_id: 9,
        rpc_url: "http://127.0.0.1:3030",
    },
];

impl Network {
    /// Static description of this network.
    #[must_use]
    pub const fn info(&self) -> &'static NetworkInfo {
        match self {
            Self::Mainnet => &NETWORKS[0],
            Self::Rinkeby => &NETWORKS[1],
            Self::Ropsten => &NETWORKS[2],
            Self::Localhost => &NETWORKS[3],
        }
    }

    /// Lowercase network name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.info().name
    }

    /// L1 chain id.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.info().chain_id
    }

    /// Default JSON-RPC endpoint.
    #[must_use]
    pub const fn default_rpc_url(&self) -> &'static str {
        self.info().rpc_url
    }

    /// Looks a network up by L1 chain id.
    #[must_use]
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        [Self::Mainnet, Self::Rinkeby, Self::Ropsten, Self::Localhost]
            .into_iter()
            .find(|n| n.chain_id() == chain_id)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a network name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown network '{0}'")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "rinkeby" => Ok(Self::Rinkeby),
            "ropsten" => Ok(Self::Ropsten),
            "localhost" => Ok(Self::Localhost),
            _ => Err(UnknownNetwork(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_ids() {
        assert_eq!(Network::Mainnet.chain_id(), 1);
        assert_eq!(Network::Rinkeby.chain_id(), 4);
        assert_eq!(Network::Ropsten.chain_id(), 3);
        assert_eq!(Network::Localhost.chain_id(), 9);
        assert_eq!(Network::from_chain_id(4), Some(Network::Rinkeby));
        assert_eq!(Network::from_chain_id(5), None);
    }

    #[test]
    fn test_parse_and_display() {
        for network in [Network::Mainnet, Network::Rinkeby, Network::Ropsten, Network::Localhost] {
            assert_eq!(network.to_string().parse::<Network>().unwrap(), network);
        }
        assert_eq!("Mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("goerli".parse::<Network>().is_err());
    }

    #[test]
    fn test_serde_name() {
        assert_eq!(serde_json::to_string(&Network::Localhost).unwrap(), "\"localhost\"");
    }
}
