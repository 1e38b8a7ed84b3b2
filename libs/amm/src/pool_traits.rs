//! Pool trait definitions for a unified quoting interface

use crate::{AmmError, V2Math, V2PoolState};

/// Read-only quoting over one swap direction of a pool
pub trait AmmPool {
    /// Calculate output amount for given input
    fn get_amount_out(&self, amount_in: u128) -> Result<u128, AmmError>;

    /// Calculate required input for desired output
    fn get_amount_in(&self, amount_out: u128) -> Result<u128, AmmError>;

    /// Current (reserve_in, reserve_out)
    fn get_liquidity(&self) -> (u128, u128);

    /// Get fee tier
    fn get_fee_bps(&self) -> u32;
}

impl AmmPool for V2PoolState {
    fn get_amount_out(&self, amount_in: u128) -> Result<u128, AmmError> {
        V2Math::get_amount_out(amount_in, self.reserve_in, self.reserve_out, self.fee_bps)
    }

    fn get_amount_in(&self, amount_out: u128) -> Result<u128, AmmError> {
        V2Math::get_amount_in(amount_out, self.reserve_in, self.reserve_out, self.fee_bps)
    }

    fn get_liquidity(&self) -> (u128, u128) {
        (self.reserve_in, self.reserve_out)
    }

    fn get_fee_bps(&self) -> u32 {
        self.fee_bps
    }
}
