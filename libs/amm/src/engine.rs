//! Ledger & pool engine
//!
//! Owns the user balance ledger and the pool map. Every public mutator runs
//! all of its checks and computes every new value before writing, so a call
//! either applies completely or leaves the engine untouched.
//!
//! The engine is a plain owned value with no interior locking. Hosts that
//! serve concurrent callers wrap the whole engine in a mutex and hold it for
//! the duration of one operation.

use crate::error::AmmError;
use crate::keys::{Asset, BalanceKey, PairKey};
use crate::pool::{LiquidityPool, PoolReserves};
use crate::pool_traits::AmmPool;
use crate::v2_math::{V2Math, BPS_DENOMINATOR, DEFAULT_FEE_BPS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// How AddLiquidity treats a deposit into a funded pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RatioPolicy {
    /// Accept both amounts as given; keeping the ratio is the caller's job
    #[default]
    Trusted,
    /// Reject deposits whose ratio diverges from the pool by more than `tolerance_bps`
    Strict { tolerance_bps: u32 },
}

/// Engine tuning, supplied by the host and not part of committed state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Swap fee in basis points, retained by the pool
    pub fee_bps: u32,
    pub liquidity_ratio: RatioPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_bps: DEFAULT_FEE_BPS, // 0.3%
            liquidity_ratio: RatioPolicy::Trusted,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), AmmError> {
        if u128::from(self.fee_bps) >= BPS_DENOMINATOR {
            return Err(AmmError::InvalidConfig {
                reason: format!("fee_bps must be below {}, got {}", BPS_DENOMINATOR, self.fee_bps),
            });
        }
        if let RatioPolicy::Strict { tolerance_bps } = self.liquidity_ratio {
            if u128::from(tolerance_bps) > BPS_DENOMINATOR {
                return Err(AmmError::InvalidConfig {
                    reason: format!(
                        "ratio tolerance must be at most {} bps, got {}",
                        BPS_DENOMINATOR, tolerance_bps
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Token ledger plus constant-product pools
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmmEngine {
    config: EngineConfig,
    /// Zero balances are never stored, so absent and zero are the same state
    balances: BTreeMap<BalanceKey, u128>,
    pools: BTreeMap<PairKey, LiquidityPool>,
}

impl AmmEngine {
    /// Empty engine with the default 0.3% fee and trusted ratio policy
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, AmmError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Token balance, zero when the user never held the token
    pub fn get_user_balance(&self, user: &str, token: &str) -> u128 {
        self.balance_of(&BalanceKey::token(user, token))
    }

    /// LP shares `user` holds in the pool for the pair (either order)
    pub fn liquidity_balance(&self, user: &str, token_a: &str, token_b: &str) -> u128 {
        self.balance_of(&BalanceKey::lp_share(user, &PairKey::new(token_a, token_b)))
    }

    /// Reserves in canonical order, zeros when the pool does not exist
    pub fn get_reserves(&self, token_a: &str, token_b: &str) -> PoolReserves {
        let pair = PairKey::new(token_a, token_b);
        self.pools
            .get(&pair)
            .map(LiquidityPool::view)
            .unwrap_or_else(|| PoolReserves::empty(&pair))
    }

    pub fn pool(&self, token_a: &str, token_b: &str) -> Option<&LiquidityPool> {
        self.pools.get(&PairKey::new(token_a, token_b))
    }

    /// All pools in canonical pair order
    pub fn pools(&self) -> impl Iterator<Item = &LiquidityPool> {
        self.pools.values()
    }

    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// All non-zero holdings in key order
    pub fn balances(&self) -> impl Iterator<Item = (&BalanceKey, u128)> {
        self.balances.iter().map(|(key, amount)| (key, *amount))
    }

    /// Ratio-consistent `amount_b` for depositing `amount_a` of `token_a`
    pub fn quote_add_liquidity(
        &self,
        token_a: &str,
        token_b: &str,
        amount_a: u128,
    ) -> Result<u128, AmmError> {
        let pool = self.funded_pool(token_a, token_b)?;
        let (reserve_a, reserve_b) = pool.reserves_for(token_a);
        V2Math::quote(amount_a, reserve_a, reserve_b)
    }

    /// Output a swap would produce right now, without executing it
    pub fn quote_swap(
        &self,
        token_in: &str,
        token_out: &str,
        amount_in: u128,
    ) -> Result<u128, AmmError> {
        let pool = self.funded_pool(token_in, token_out)?;
        pool.swap_state(token_in, self.config.fee_bps)
            .get_amount_out(amount_in)
    }

    /// Smallest input that buys at least `amount_out` of `token_out`
    pub fn quote_amount_in(
        &self,
        token_in: &str,
        token_out: &str,
        amount_out: u128,
    ) -> Result<u128, AmmError> {
        let pool = self.funded_pool(token_in, token_out)?;
        pool.swap_state(token_in, self.config.fee_bps)
            .get_amount_in(amount_out)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Credit freshly minted test tokens; returns the new balance
    pub fn mint_tokens(&mut self, user: &str, token: &str, amount: u128) -> Result<u128, AmmError> {
        require_id("user", user)?;
        require_id("token", token)?;

        let key = BalanceKey::token(user, token);
        let balance = self
            .balance_of(&key)
            .checked_add(amount)
            .ok_or_else(|| AmmError::overflow("mint"))?;

        self.set_balance(key, balance);
        debug!(user, token, amount, balance, "Minted tokens");
        Ok(balance)
    }

    /// Deposit both tokens of a pair; returns the LP shares minted
    pub fn add_liquidity(
        &mut self,
        user: &str,
        token_a: &str,
        token_b: &str,
        amount_a: u128,
        amount_b: u128,
    ) -> Result<u128, AmmError> {
        require_id("user", user)?;
        require_pair(token_a, token_b)?;
        if amount_a == 0 || amount_b == 0 {
            return Err(AmmError::ZeroAmount {
                operation: "add_liquidity",
            });
        }

        let key_a = BalanceKey::token(user, token_a);
        let key_b = BalanceKey::token(user, token_b);
        let balance_a = self.debit_check(&key_a, amount_a)?;
        let balance_b = self.debit_check(&key_b, amount_b)?;

        let pair = PairKey::new(token_a, token_b);
        let mut pool = self
            .pools
            .get(&pair)
            .cloned()
            .unwrap_or_else(|| LiquidityPool::new(&pair));
        let (pool_amount_a, pool_amount_b) = pair.orient(token_a, amount_a, amount_b);
        let is_new = !pool.is_funded();

        let minted = if is_new {
            V2Math::initial_liquidity(pool_amount_a, pool_amount_b)?
        } else {
            self.check_ratio(&pool, token_a, amount_a, amount_b)?;
            V2Math::proportional_liquidity(pool_amount_a, pool.total_liquidity, pool.reserve_a)?
        };
        if minted == 0 {
            return Err(AmmError::InsufficientLiquidityMinted { amount_a, amount_b });
        }

        pool.reserve_a = pool
            .reserve_a
            .checked_add(pool_amount_a)
            .ok_or_else(|| AmmError::overflow("reserve deposit"))?;
        pool.reserve_b = pool
            .reserve_b
            .checked_add(pool_amount_b)
            .ok_or_else(|| AmmError::overflow("reserve deposit"))?;
        pool.total_liquidity = pool
            .total_liquidity
            .checked_add(minted)
            .ok_or_else(|| AmmError::overflow("liquidity supply"))?;

        let lp_key = BalanceKey::lp_share(user, &pair);
        let lp_balance = self
            .balance_of(&lp_key)
            .checked_add(minted)
            .ok_or_else(|| AmmError::overflow("liquidity credit"))?;

        // All checks passed
        self.set_balance(key_a, balance_a - amount_a);
        self.set_balance(key_b, balance_b - amount_b);
        self.set_balance(lp_key, lp_balance);
        if is_new {
            info!(
                pair = %pair,
                reserve_a = pool.reserve_a,
                reserve_b = pool.reserve_b,
                minted,
                "Initialized pool"
            );
        } else {
            debug!(user, pair = %pair, amount_a, amount_b, minted, "Added liquidity");
        }
        self.pools.insert(pair, pool);

        Ok(minted)
    }

    /// Burn LP shares; returns `(amount_a, amount_b)` in the caller's token order
    pub fn remove_liquidity(
        &mut self,
        user: &str,
        token_a: &str,
        token_b: &str,
        liquidity_amount: u128,
    ) -> Result<(u128, u128), AmmError> {
        require_id("user", user)?;
        require_pair(token_a, token_b)?;
        if liquidity_amount == 0 {
            return Err(AmmError::ZeroAmount {
                operation: "remove_liquidity",
            });
        }

        let pair = PairKey::new(token_a, token_b);
        let mut pool = match self.pools.get(&pair) {
            Some(pool) if pool.total_liquidity > 0 => pool.clone(),
            _ => return Err(pool_not_found(&pair)),
        };

        let lp_key = BalanceKey::lp_share(user, &pair);
        let lp_balance = self.debit_check(&lp_key, liquidity_amount)?;

        let (out_a, out_b) = V2Math::burn_amounts(
            liquidity_amount,
            pool.reserve_a,
            pool.reserve_b,
            pool.total_liquidity,
        )?;
        // Share balances never exceed the supply, so none of these can underflow
        pool.reserve_a -= out_a;
        pool.reserve_b -= out_b;
        pool.total_liquidity -= liquidity_amount;

        let key_a = BalanceKey::token(user, pair.token_a());
        let key_b = BalanceKey::token(user, pair.token_b());
        let credit_a = self
            .balance_of(&key_a)
            .checked_add(out_a)
            .ok_or_else(|| AmmError::overflow("withdrawal credit"))?;
        let credit_b = self
            .balance_of(&key_b)
            .checked_add(out_b)
            .ok_or_else(|| AmmError::overflow("withdrawal credit"))?;

        self.set_balance(lp_key, lp_balance - liquidity_amount);
        self.set_balance(key_a, credit_a);
        self.set_balance(key_b, credit_b);
        if pool.total_liquidity == 0 {
            info!(pair = %pair, "Pool drained to zero reserves");
        }
        debug!(user, pair = %pair, liquidity_amount, out_a, out_b, "Removed liquidity");
        self.pools.insert(pair.clone(), pool);

        Ok(pair.orient(token_a, out_a, out_b))
    }

    /// Sell exactly `amount_in` of `token_in`; returns the amount of `token_out` received
    pub fn swap_exact_tokens_for_tokens(
        &mut self,
        user: &str,
        token_in: &str,
        token_out: &str,
        amount_in: u128,
        min_amount_out: u128,
    ) -> Result<u128, AmmError> {
        require_id("user", user)?;
        require_pair(token_in, token_out)?;
        if amount_in == 0 {
            return Err(AmmError::ZeroAmount { operation: "swap" });
        }

        let mut pool = self.funded_pool(token_in, token_out)?.clone();

        let key_in = BalanceKey::token(user, token_in);
        let balance_in = self.debit_check(&key_in, amount_in)?;

        let (reserve_in, reserve_out) = pool.reserves_for(token_in);
        let amount_out =
            V2Math::get_amount_out(amount_in, reserve_in, reserve_out, self.config.fee_bps)?;
        if amount_out < min_amount_out {
            return Err(AmmError::SlippageExceeded {
                amount_out,
                min_amount_out,
            });
        }

        let new_reserve_in = reserve_in
            .checked_add(amount_in)
            .ok_or_else(|| AmmError::overflow("swap reserve"))?;
        // amount_out < reserve_out: the formula's denominator always exceeds the scaled input
        let new_reserve_out = reserve_out - amount_out;
        if pool.token_a == token_in {
            pool.reserve_a = new_reserve_in;
            pool.reserve_b = new_reserve_out;
        } else {
            pool.reserve_b = new_reserve_in;
            pool.reserve_a = new_reserve_out;
        }

        let key_out = BalanceKey::token(user, token_out);
        let balance_out = self
            .balance_of(&key_out)
            .checked_add(amount_out)
            .ok_or_else(|| AmmError::overflow("swap credit"))?;

        self.set_balance(key_in, balance_in - amount_in);
        self.set_balance(key_out, balance_out);
        debug!(user, token_in, token_out, amount_in, amount_out, "Swapped");
        self.pools.insert(pool.pair(), pool);

        Ok(amount_out)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn balance_of(&self, key: &BalanceKey) -> u128 {
        self.balances.get(key).copied().unwrap_or(0)
    }

    fn set_balance(&mut self, key: BalanceKey, amount: u128) {
        if amount == 0 {
            self.balances.remove(&key);
        } else {
            self.balances.insert(key, amount);
        }
    }

    /// Current balance if it covers `amount`
    fn debit_check(&self, key: &BalanceKey, amount: u128) -> Result<u128, AmmError> {
        let available = self.balance_of(key);
        if available < amount {
            return Err(AmmError::InsufficientBalance {
                user: key.owner.clone(),
                asset: key.asset.clone(),
                required: amount,
                available,
            });
        }
        Ok(available)
    }

    fn funded_pool(&self, token_a: &str, token_b: &str) -> Result<&LiquidityPool, AmmError> {
        let pair = PairKey::new(token_a, token_b);
        match self.pools.get(&pair) {
            Some(pool) if pool.is_funded() => Ok(pool),
            _ => Err(pool_not_found(&pair)),
        }
    }

    /// Enforce the configured ratio policy; amounts are in caller order
    fn check_ratio(
        &self,
        pool: &LiquidityPool,
        token_a: &str,
        amount_a: u128,
        amount_b: u128,
    ) -> Result<(), AmmError> {
        let tolerance_bps = match self.config.liquidity_ratio {
            RatioPolicy::Trusted => return Ok(()),
            RatioPolicy::Strict { tolerance_bps } => u128::from(tolerance_bps),
        };
        let (reserve_a, reserve_b) = pool.reserves_for(token_a);

        // amount_a / amount_b == reserve_a / reserve_b, compared as cross products
        let lhs = amount_a
            .checked_mul(reserve_b)
            .ok_or_else(|| AmmError::overflow("ratio check"))?;
        let rhs = amount_b
            .checked_mul(reserve_a)
            .ok_or_else(|| AmmError::overflow("ratio check"))?;
        let diff = lhs.abs_diff(rhs);

        // floor(lhs * tolerance / 10000) without forming the full product;
        // diff <= allowed iff diff * 10000 <= lhs * tolerance
        let allowed = (lhs / BPS_DENOMINATOR)
            .checked_mul(tolerance_bps)
            .and_then(|whole| {
                whole.checked_add((lhs % BPS_DENOMINATOR) * tolerance_bps / BPS_DENOMINATOR)
            })
            .ok_or_else(|| AmmError::overflow("ratio check"))?;
        if diff <= allowed {
            return Ok(());
        }

        // reserve_a is non-zero for a funded pool, so this is the quote without a second product
        Err(AmmError::InvalidLiquidityRatio {
            expected_amount_b: lhs / reserve_a,
            provided_amount_b: amount_b,
        })
    }
}

fn require_id(field: &'static str, value: &str) -> Result<(), AmmError> {
    if value.is_empty() {
        return Err(AmmError::EmptyIdentifier { field });
    }
    Ok(())
}

fn require_pair(token_a: &str, token_b: &str) -> Result<(), AmmError> {
    require_id("token_a", token_a)?;
    require_id("token_b", token_b)?;
    if token_a == token_b {
        return Err(AmmError::IdenticalTokens {
            token: token_a.to_string(),
        });
    }
    Ok(())
}

fn pool_not_found(pair: &PairKey) -> AmmError {
    AmmError::PoolNotFound {
        token_a: pair.token_a().to_string(),
        token_b: pair.token_b().to_string(),
    }
}

// Restore support for the snapshot module
impl AmmEngine {
    pub(crate) fn from_parts(
        config: EngineConfig,
        balances: BTreeMap<BalanceKey, u128>,
        pools: BTreeMap<PairKey, LiquidityPool>,
    ) -> Self {
        Self {
            config,
            balances,
            pools,
        }
    }

    pub(crate) fn raw_balances(&self) -> &BTreeMap<BalanceKey, u128> {
        &self.balances
    }

    pub(crate) fn raw_pools(&self) -> &BTreeMap<PairKey, LiquidityPool> {
        &self.pools
    }
}

/// Total LP shares recorded in the ledger for each pair
pub(crate) fn lp_supply_by_pair(
    balances: &BTreeMap<BalanceKey, u128>,
) -> Result<BTreeMap<PairKey, u128>, AmmError> {
    let mut supply: BTreeMap<PairKey, u128> = BTreeMap::new();
    for (key, amount) in balances {
        if let Asset::LpShare(pair) = &key.asset {
            let entry = supply.entry(pair.clone()).or_insert(0);
            *entry = entry
                .checked_add(*amount)
                .ok_or_else(|| AmmError::overflow("liquidity supply"))?;
        }
    }
    Ok(supply)
}
