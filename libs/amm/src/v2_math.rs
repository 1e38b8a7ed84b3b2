//! Constant product (x*y=k) math on native integer amounts
//!
//! Every intermediate is checked `u128` arithmetic. A value that leaves the
//! range surfaces as [`AmmError::ArithmeticOverflow`] instead of wrapping, and
//! all divisions floor, so rounding always favours the pool.

use crate::error::AmmError;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// Basis point denominator for fees and tolerances
pub const BPS_DENOMINATOR: u128 = 10_000;

/// 0.3% swap fee, retained by the pool
pub const DEFAULT_FEE_BPS: u32 = 30;

/// Directional view of a pool for quoting a single swap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct V2PoolState {
    pub reserve_in: u128,
    pub reserve_out: u128,
    pub fee_bps: u32, // Fee in basis points (30 = 0.3%)
}

/// Integer V2 AMM math
pub struct V2Math;

impl V2Math {
    /// Exact output for `amount_in` against `reserve_in`/`reserve_out`
    ///
    /// ```text
    /// amount_in_with_fee = amount_in * (10000 - fee_bps)
    /// amount_out = amount_in_with_fee * reserve_out / (reserve_in * 10000 + amount_in_with_fee)
    /// ```
    ///
    /// With `fee_bps = 30` this is the classic `997 / 1000` formula scaled by ten,
    /// so the floored result is identical.
    pub fn get_amount_out(
        amount_in: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee_bps: u32,
    ) -> Result<u128, AmmError> {
        if amount_in == 0 {
            return Err(AmmError::ZeroAmount {
                operation: "swap",
            });
        }
        let fee_multiplier = Self::fee_multiplier(fee_bps)?;

        let amount_in_with_fee = amount_in
            .checked_mul(fee_multiplier)
            .ok_or_else(|| AmmError::overflow("swap fee"))?;
        let numerator = amount_in_with_fee
            .checked_mul(reserve_out)
            .ok_or_else(|| AmmError::overflow("swap numerator"))?;
        let denominator = reserve_in
            .checked_mul(BPS_DENOMINATOR)
            .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
            .ok_or_else(|| AmmError::overflow("swap denominator"))?;

        // denominator > 0 because amount_in_with_fee > 0 for any fee below 100%
        Ok(numerator / denominator)
    }

    /// Minimum input that yields at least `amount_out` (rounded up)
    pub fn get_amount_in(
        amount_out: u128,
        reserve_in: u128,
        reserve_out: u128,
        fee_bps: u32,
    ) -> Result<u128, AmmError> {
        if amount_out == 0 {
            return Err(AmmError::ZeroAmount {
                operation: "swap quote",
            });
        }
        if amount_out >= reserve_out {
            return Err(AmmError::InsufficientLiquidity {
                requested: amount_out,
                available: reserve_out,
            });
        }
        let fee_multiplier = Self::fee_multiplier(fee_bps)?;

        let numerator = reserve_in
            .checked_mul(amount_out)
            .and_then(|n| n.checked_mul(BPS_DENOMINATOR))
            .ok_or_else(|| AmmError::overflow("swap quote numerator"))?;
        let denominator = (reserve_out - amount_out)
            .checked_mul(fee_multiplier)
            .ok_or_else(|| AmmError::overflow("swap quote denominator"))?;

        Ok(numerator / denominator + 1)
    }

    /// Counterpart amount that keeps the pool ratio: `amount_a * reserve_b / reserve_a`
    pub fn quote(amount_a: u128, reserve_a: u128, reserve_b: u128) -> Result<u128, AmmError> {
        if reserve_a == 0 {
            return Ok(0);
        }
        amount_a
            .checked_mul(reserve_b)
            .map(|n| n / reserve_a)
            .ok_or_else(|| AmmError::overflow("liquidity quote"))
    }

    /// Shares minted when funding an empty pool: geometric mean of the deposits
    pub fn initial_liquidity(amount_a: u128, amount_b: u128) -> Result<u128, AmmError> {
        amount_a
            .checked_mul(amount_b)
            .map(IntegerSqrt::integer_sqrt)
            .ok_or_else(|| AmmError::overflow("initial liquidity"))
    }

    /// Shares minted for a deposit into a funded pool, pro rata on token A
    pub fn proportional_liquidity(
        amount_a: u128,
        total_liquidity: u128,
        reserve_a: u128,
    ) -> Result<u128, AmmError> {
        amount_a
            .checked_mul(total_liquidity)
            .map(|n| n / reserve_a)
            .ok_or_else(|| AmmError::overflow("liquidity mint"))
    }

    /// Token amounts released by burning `liquidity` shares
    pub fn burn_amounts(
        liquidity: u128,
        reserve_a: u128,
        reserve_b: u128,
        total_liquidity: u128,
    ) -> Result<(u128, u128), AmmError> {
        let amount_a = liquidity
            .checked_mul(reserve_a)
            .map(|n| n / total_liquidity)
            .ok_or_else(|| AmmError::overflow("liquidity burn"))?;
        let amount_b = liquidity
            .checked_mul(reserve_b)
            .map(|n| n / total_liquidity)
            .ok_or_else(|| AmmError::overflow("liquidity burn"))?;
        Ok((amount_a, amount_b))
    }

    /// Price impact of a trade in basis points, fees excluded
    pub fn price_impact_bps(
        amount_in: u128,
        reserve_in: u128,
        reserve_out: u128,
    ) -> Result<Decimal, AmmError> {
        if reserve_in == 0 || reserve_out == 0 {
            return Ok(Decimal::ZERO);
        }
        let amount_out = Self::get_amount_out(amount_in, reserve_in, reserve_out, 0)?;
        let new_reserve_in = reserve_in
            .checked_add(amount_in)
            .ok_or_else(|| AmmError::overflow("price impact"))?;
        let new_reserve_out = reserve_out - amount_out;

        let price_before = ratio(reserve_out, reserve_in)?;
        let price_after = ratio(new_reserve_out, new_reserve_in)?;

        (price_before - price_after)
            .abs()
            .checked_div(price_before)
            .and_then(|r| r.checked_mul(Decimal::from(BPS_DENOMINATOR as u64)))
            .ok_or_else(|| AmmError::overflow("price impact"))
    }

    fn fee_multiplier(fee_bps: u32) -> Result<u128, AmmError> {
        let fee_bps = u128::from(fee_bps);
        if fee_bps >= BPS_DENOMINATOR {
            return Err(AmmError::InvalidConfig {
                reason: format!("fee of {} bps leaves nothing to trade", fee_bps),
            });
        }
        Ok(BPS_DENOMINATOR - fee_bps)
    }
}

/// `numerator / denominator` as a Decimal, for read-only analytics
pub(crate) fn ratio(numerator: u128, denominator: u128) -> Result<Decimal, AmmError> {
    let n = Decimal::from_u128(numerator).ok_or_else(|| AmmError::overflow("decimal conversion"))?;
    let d =
        Decimal::from_u128(denominator).ok_or_else(|| AmmError::overflow("decimal conversion"))?;
    n.checked_div(d)
        .ok_or_else(|| AmmError::overflow("decimal division"))
}

/// Exact integer square root
pub trait IntegerSqrt {
    /// `floor(sqrt(self))`
    fn integer_sqrt(self) -> Self;
}

impl IntegerSqrt for u128 {
    fn integer_sqrt(self) -> Self {
        if self <= 1 {
            return self;
        }
        // Babylonian iteration from above; seeding at n/2 avoids the n+1 overflow at u128::MAX
        let mut x0 = self / 2;
        let mut x1 = (x0 + self / x0) / 2;
        while x1 < x0 {
            x0 = x1;
            x1 = (x0 + self / x0) / 2;
        }
        x0
    }
}
