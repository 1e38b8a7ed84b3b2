//! Liquidity pool state
//!
//! One pool per canonical pair. A pool is either fully uninitialized (both
//! reserves and the share supply at zero) or fully funded; it is never deleted.

use crate::keys::PairKey;
use crate::v2_math::{ratio, V2PoolState};
use crate::AmmError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserve state for one unordered token pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPool {
    pub token_a: String,
    pub token_b: String,
    pub reserve_a: u128,
    pub reserve_b: u128,
    pub total_liquidity: u128,
}

impl LiquidityPool {
    /// Create an uninitialized pool for a canonical pair
    pub fn new(pair: &PairKey) -> Self {
        Self {
            token_a: pair.token_a().to_string(),
            token_b: pair.token_b().to_string(),
            reserve_a: 0,
            reserve_b: 0,
            total_liquidity: 0,
        }
    }

    pub fn pair(&self) -> PairKey {
        PairKey::new(&self.token_a, &self.token_b)
    }

    /// Pool holds reserves on both sides
    pub fn is_funded(&self) -> bool {
        self.reserve_a > 0 && self.reserve_b > 0
    }

    /// Reserves oriented for a swap selling `token_in`: `(reserve_in, reserve_out)`
    pub fn reserves_for(&self, token_in: &str) -> (u128, u128) {
        if self.token_a == token_in {
            (self.reserve_a, self.reserve_b)
        } else {
            (self.reserve_b, self.reserve_a)
        }
    }

    /// Directional quoting state for a swap selling `token_in`
    pub fn swap_state(&self, token_in: &str, fee_bps: u32) -> V2PoolState {
        let (reserve_in, reserve_out) = self.reserves_for(token_in);
        V2PoolState {
            reserve_in,
            reserve_out,
            fee_bps,
        }
    }

    /// Zero-coupling: `reserve_a == 0 <=> reserve_b == 0 <=> total_liquidity == 0`
    pub fn check_invariants(&self) -> Result<(), String> {
        let zeros = [
            self.reserve_a == 0,
            self.reserve_b == 0,
            self.total_liquidity == 0,
        ];
        if zeros.iter().all(|z| *z) || zeros.iter().all(|z| !*z) {
            Ok(())
        } else {
            Err(format!(
                "pool {}/{} is partially funded: reserves {}/{}, liquidity {}",
                self.token_a, self.token_b, self.reserve_a, self.reserve_b, self.total_liquidity
            ))
        }
    }

    /// Spot price of token A quoted in token B (`reserve_b / reserve_a`)
    pub fn spot_price(&self) -> Option<Decimal> {
        if !self.is_funded() {
            return None;
        }
        ratio(self.reserve_b, self.reserve_a).ok()
    }

    /// Checked `reserve_a * reserve_b`
    pub fn product(&self) -> Result<u128, AmmError> {
        self.reserve_a
            .checked_mul(self.reserve_b)
            .ok_or(AmmError::ArithmeticOverflow {
                operation: "pool product",
            })
    }

    pub fn view(&self) -> PoolReserves {
        PoolReserves {
            token_a: self.token_a.clone(),
            token_b: self.token_b.clone(),
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
            total_liquidity: self.total_liquidity,
        }
    }
}

/// Result of a reserves lookup, always in canonical token order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReserves {
    pub token_a: String,
    pub token_b: String,
    pub reserve_a: u128,
    pub reserve_b: u128,
    pub total_liquidity: u128,
}

impl PoolReserves {
    /// Zeroed reserves for a pair with no pool
    pub fn empty(pair: &PairKey) -> Self {
        LiquidityPool::new(pair).view()
    }

    /// Reserve held for `token`, zero if the token is not in the pair
    pub fn reserve_of(&self, token: &str) -> u128 {
        if self.token_a == token {
            self.reserve_a
        } else if self.token_b == token {
            self.reserve_b
        } else {
            0
        }
    }
}

impl fmt::Display for PoolReserves {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reserves: {} = {}, {} = {}, Total Liquidity: {}",
            self.token_a, self.reserve_a, self.token_b, self.reserve_b, self.total_liquidity
        )
    }
}
