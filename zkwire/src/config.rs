//! Wallet configuration.
//!
//! Loaded from JSON or built in code. Unset fields take defaults: mainnet,
//! the current payload layout, on-chain key authorization and normal-speed
//! withdrawals. Key changes are only signed with the L1 key when `auth`
//! asks for ECDSA explicitly.
//!
//! ```rust
//! use zkwire::config::WalletConfig;
//! use zkwire::networks::Network;
//!
//! let config: WalletConfig = serde_json::from_str(
//!     r#"{ "network": "rinkeby", "auth": { "type": "Onchain" } }"#,
//! )
//! .unwrap();
//! assert_eq!(config.network, Network::Rinkeby);
//! ```

use serde::{Deserialize, Serialize};

use crate::networks::Network;
use crate::tx::AuthorizationVariant;
use crate::version::ProtocolVersion;

/// How a [`Wallet`](crate::wallet::Wallet) signs and submits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalletConfig {
    /// Target network.
    pub network: Network,
    /// Payload layout.
    pub protocol_version: ProtocolVersion,
    /// How key changes are authorized.
    pub auth: AuthorizationVariant,
    /// Request next-block processing for withdrawals.
    pub fast_withdrawals: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            protocol_version: ProtocolVersion::default(),
            auth: AuthorizationVariant::Onchain,
            fast_withdrawals: false,
        }
    }
}

impl WalletConfig {
    /// Default configuration for `network`.
    #[must_use]
    pub fn new(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    /// Sets the payload layout.
    #[must_use]
    pub const fn with_protocol_version(mut self, version: ProtocolVersion) -> Self {
        self.protocol_version = version;
        self
    }

    /// Sets the key-change authorization.
    #[must_use]
    pub const fn with_auth(mut self, auth: AuthorizationVariant) -> Self {
        self.auth = auth;
        self
    }

    /// Enables or disables fast withdrawals.
    #[must_use]
    pub const fn with_fast_withdrawals(mut self, fast: bool) -> Self {
        self.fast_withdrawals = fast;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::Create2Data;
    use alloy_primitives::{B256, address};
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config: WalletConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, WalletConfig::default());
        assert_eq!(config.auth, AuthorizationVariant::Onchain);
        assert_eq!(config.protocol_version, ProtocolVersion::Current);
    }

    #[test]
    fn test_missing_auth_defaults_to_onchain() {
        let config: WalletConfig = serde_json::from_value(json!({
            "network": "rinkeby",
            "fastWithdrawals": true
        }))
        .unwrap();
        assert_eq!(config.network, Network::Rinkeby);
        assert_eq!(config.auth, AuthorizationVariant::Onchain);

        let ecdsa = WalletConfig::new(Network::Rinkeby).with_auth(AuthorizationVariant::Ecdsa);
        assert_eq!(ecdsa.auth, AuthorizationVariant::Ecdsa);
    }

    #[test]
    fn test_create2_auth_from_json() {
        let config: WalletConfig = serde_json::from_value(json!({
            "network": "localhost",
            "protocolVersion": "legacy",
            "auth": {
                "type": "CREATE2",
                "creatorAddress": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                "saltArg": format!("0x{}", "11".repeat(32)),
                "codeHash": format!("0x{}", "22".repeat(32)),
            },
            "fastWithdrawals": true
        }))
        .unwrap();
        assert_eq!(config.network, Network::Localhost);
        assert_eq!(config.protocol_version, ProtocolVersion::Legacy);
        assert!(config.fast_withdrawals);
        assert_eq!(
            config.auth,
            AuthorizationVariant::Create2(Create2Data {
                creator_address: address!("0x5fbdb2315678afecb367f032d93f642f64180aa3"),
                salt_arg: B256::repeat_byte(0x11),
                code_hash: B256::repeat_byte(0x22),
            })
        );
    }

    #[test]
    fn test_unknown_auth_is_rejected() {
        let result =
            serde_json::from_value::<WalletConfig>(json!({ "auth": { "type": "Multisig" } }));
        assert!(result.is_err());
    }
}
