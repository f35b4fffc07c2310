//! Token metadata used to resolve ids and render messages.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::amount::{AmountError, format_units};
use crate::fields::{TokenId, format_address, lowercase_address};

/// Smallest token id assigned to NFTs.
pub const MIN_NFT_TOKEN_ID: u32 = 65_536;

/// A token known to the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// L2 token id.
    pub id: TokenId,
    /// L1 contract address (zero for ETH).
    #[serde(with = "lowercase_address")]
    pub address: Address,
    /// Ticker symbol used in messages.
    pub symbol: String,
    /// Number of decimals.
    pub decimals: u8,
}

impl Token {
    /// Creates a new token description.
    pub fn new(id: TokenId, address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            id,
            address,
            symbol: symbol.into(),
            decimals,
        }
    }

    /// Ether, token id zero.
    #[must_use]
    pub fn eth() -> Self {
        Self::new(TokenId(0), Address::ZERO, "ETH", 18)
    }

    /// Returns `true` for ether.
    #[must_use]
    pub fn is_eth(&self) -> bool {
        self.address == Address::ZERO && self.symbol == "ETH"
    }

    /// Renders `amount` base units in token units, e.g. `"0.5"`.
    ///
    /// # Errors
    ///
    /// Returns [`AmountError::UnsupportedDecimals`] for tokens with more
    /// than 18 decimals.
    pub fn format(&self, amount: alloy_primitives::U256) -> Result<String, AmountError> {
        format_units(amount, self.decimals)
    }
}

/// Any way of naming a token in requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenLike {
    /// By id.
    Id(TokenId),
    /// By L1 contract address.
    Address(#[serde(with = "lowercase_address")] Address),
    /// By symbol.
    Symbol(String),
}

impl fmt::Display for TokenLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Address(address) => f.write_str(&format_address(address)),
            Self::Symbol(symbol) => f.write_str(symbol),
        }
    }
}

impl From<TokenId> for TokenLike {
    fn from(id: TokenId) -> Self {
        Self::Id(id)
    }
}

impl From<Address> for TokenLike {
    fn from(address: Address) -> Self {
        Self::Address(address)
    }
}

impl From<&str> for TokenLike {
    fn from(symbol: &str) -> Self {
        Self::Symbol(symbol.to_string())
    }
}

/// Token list returned by the network, keyed by symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tokens(HashMap<String, Token>);

impl Tokens {
    /// Builds a token list.
    #[must_use]
    pub fn new(tokens: impl IntoIterator<Item = Token>) -> Self {
        Self(
            tokens
                .into_iter()
                .map(|t| (t.symbol.clone(), t))
                .collect(),
        )
    }

    /// Looks a token up. Symbols match case-insensitively.
    #[must_use]
    pub fn resolve(&self, token: &TokenLike) -> Option<&Token> {
        match token {
            TokenLike::Id(id) => self.0.values().find(|t| t.id == *id),
            TokenLike::Address(address) => self.0.values().find(|t| t.address == *address),
            TokenLike::Symbol(symbol) => self
                .0
                .get(symbol)
                .or_else(|| self.0.values().find(|t| t.symbol.eq_ignore_ascii_case(symbol))),
        }
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{U256, address};

    fn tokens() -> Tokens {
        Tokens::new([
            Token::eth(),
            Token::new(
                TokenId(2),
                address!("0xeb8f08a975ab53e34d8a0330e0d34de942c95926"),
                "USDC",
                6,
            ),
        ])
    }

    #[test]
    fn test_resolve_by_every_key() {
        let tokens = tokens();
        assert_eq!(tokens.resolve(&TokenId(2).into()).unwrap().symbol, "USDC");
        assert_eq!(tokens.resolve(&"usdc".into()).unwrap().id, TokenId(2));
        assert_eq!(
            tokens.resolve(&Address::ZERO.into()).unwrap().symbol,
            "ETH"
        );
        assert!(tokens.resolve(&TokenId(9).into()).is_none());
    }

    #[test]
    fn test_token_like_json_forms() {
        let id: TokenLike = serde_json::from_str("0").unwrap();
        assert_eq!(id, TokenLike::Id(TokenId(0)));
        let symbol: TokenLike = serde_json::from_str("\"ETH\"").unwrap();
        assert_eq!(symbol, TokenLike::Symbol("ETH".into()));
        assert_eq!(
            serde_json::to_string(&TokenLike::Address(Address::ZERO)).unwrap(),
            "\"0x0000000000000000000000000000000000000000\""
        );
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(Token::eth().format(U256::from(10u64.pow(17))).unwrap(), "0.1");
        assert!(Token::eth().is_eth());
    }
}
