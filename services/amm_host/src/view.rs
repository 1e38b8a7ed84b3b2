//! Read-only state dump for the `show` command

use amm_ledger::{AmmEngine, Decimal, PoolReserves};
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolSummary {
    pub reserves: PoolReserves,
    /// token_b per token_a, absent for drained pools
    pub spot_price: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceEntry {
    pub owner: String,
    pub asset: String,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateView {
    pub commitment: String,
    pub pools: Vec<PoolSummary>,
    pub balances: Vec<BalanceEntry>,
}

impl StateView {
    pub fn capture(engine: &AmmEngine) -> Result<Self> {
        let commitment = engine.commit().context("Failed to commit ledger state")?;
        Ok(Self {
            commitment: commitment.to_hex(),
            pools: engine
                .pools()
                .map(|pool| PoolSummary {
                    reserves: pool.view(),
                    spot_price: pool.spot_price(),
                })
                .collect(),
            balances: engine
                .balances()
                .map(|(key, amount)| BalanceEntry {
                    owner: key.owner.clone(),
                    asset: key.asset.to_string(),
                    amount,
                })
                .collect(),
        })
    }
}
