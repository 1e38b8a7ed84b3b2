//! Composite ledger keys
//!
//! Pools and balances are addressed by typed keys instead of concatenated
//! strings, so a symbol containing `_` can never alias another entry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical, unordered token pair: `token_a <= token_b` lexicographically
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    token_a: String,
    token_b: String,
}

impl PairKey {
    /// Build the canonical key for a pair given in any order
    pub fn new(x: &str, y: &str) -> Self {
        if x <= y {
            Self {
                token_a: x.to_string(),
                token_b: y.to_string(),
            }
        } else {
            Self {
                token_a: y.to_string(),
                token_b: x.to_string(),
            }
        }
    }

    pub fn token_a(&self) -> &str {
        &self.token_a
    }

    pub fn token_b(&self) -> &str {
        &self.token_b
    }

    /// Map amounts given in caller order `(first, second)` onto canonical order.
    ///
    /// `first_token` names the token the caller listed first.
    pub fn orient(&self, first_token: &str, first: u128, second: u128) -> (u128, u128) {
        if self.token_a == first_token {
            (first, second)
        } else {
            (second, first)
        }
    }

    /// Whether both symbols are in sorted order (always true for keys built by `new`)
    pub(crate) fn is_canonical(&self) -> bool {
        self.token_a < self.token_b
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.token_a, self.token_b)
    }
}

/// Anything a user can hold: a real token or LP shares of one pool
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Asset {
    Token(String),
    LpShare(PairKey),
}

impl Asset {
    pub fn token(symbol: &str) -> Self {
        Asset::Token(symbol.to_string())
    }

    pub fn lp_share(x: &str, y: &str) -> Self {
        Asset::LpShare(PairKey::new(x, y))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Token(symbol) => write!(f, "{}", symbol),
            Asset::LpShare(pair) => write!(f, "LP({})", pair),
        }
    }
}

/// Ledger key: one owner's holding of one asset
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BalanceKey {
    pub owner: String,
    pub asset: Asset,
}

impl BalanceKey {
    pub fn new(owner: &str, asset: Asset) -> Self {
        Self {
            owner: owner.to_string(),
            asset,
        }
    }

    pub fn token(owner: &str, symbol: &str) -> Self {
        Self::new(owner, Asset::token(symbol))
    }

    pub fn lp_share(owner: &str, pair: &PairKey) -> Self {
        Self::new(owner, Asset::LpShare(pair.clone()))
    }
}
