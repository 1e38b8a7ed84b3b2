//! Tagged actions and their outcomes
//!
//! The host hands the engine one [`AmmAction`] at a time and relays the
//! [`ActionOutcome`] or [`AmmError`] back to its caller verbatim.

use crate::engine::AmmEngine;
use crate::error::AmmError;
use crate::pool::PoolReserves;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Every call the engine accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmmAction {
    MintTokens {
        user: String,
        token: String,
        amount: u128,
    },
    AddLiquidity {
        user: String,
        token_a: String,
        token_b: String,
        amount_a: u128,
        amount_b: u128,
    },
    RemoveLiquidity {
        user: String,
        token_a: String,
        token_b: String,
        liquidity_amount: u128,
    },
    SwapExactTokensForTokens {
        user: String,
        token_in: String,
        token_out: String,
        amount_in: u128,
        min_amount_out: u128,
    },
    GetReserves {
        token_a: String,
        token_b: String,
    },
    GetUserBalance {
        user: String,
        token: String,
    },
}

impl AmmAction {
    /// Operation name, as used for tagging and logs
    pub fn name(&self) -> &'static str {
        match self {
            AmmAction::MintTokens { .. } => "MintTokens",
            AmmAction::AddLiquidity { .. } => "AddLiquidity",
            AmmAction::RemoveLiquidity { .. } => "RemoveLiquidity",
            AmmAction::SwapExactTokensForTokens { .. } => "SwapExactTokensForTokens",
            AmmAction::GetReserves { .. } => "GetReserves",
            AmmAction::GetUserBalance { .. } => "GetUserBalance",
        }
    }

    /// Read-only actions never change engine state
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            AmmAction::GetReserves { .. } | AmmAction::GetUserBalance { .. }
        )
    }

    /// Binary blob form for hosts that carry actions opaquely
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Success payload of an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    Minted {
        user: String,
        token: String,
        amount: u128,
        balance: u128,
    },
    LiquidityAdded {
        token_a: String,
        token_b: String,
        amount_a: u128,
        amount_b: u128,
        minted: u128,
    },
    LiquidityRemoved {
        token_a: String,
        token_b: String,
        amount_a: u128,
        amount_b: u128,
    },
    Swapped {
        token_in: String,
        token_out: String,
        amount_in: u128,
        amount_out: u128,
    },
    Reserves(PoolReserves),
    Balance {
        user: String,
        token: String,
        amount: u128,
    },
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Minted {
                user,
                token,
                amount,
                ..
            } => write!(f, "Minted {} {} tokens for user {}", amount, token, user),
            ActionOutcome::LiquidityAdded {
                token_a,
                token_b,
                amount_a,
                amount_b,
                minted,
            } => write!(
                f,
                "Added liquidity: {} {}, {} {} to {}/{} pool. Minted {} liquidity tokens.",
                amount_a, token_a, amount_b, token_b, token_a, token_b, minted
            ),
            ActionOutcome::LiquidityRemoved {
                token_a,
                token_b,
                amount_a,
                amount_b,
            } => write!(
                f,
                "Removed liquidity: {} {}, {} {} from {}/{} pool",
                amount_a, token_a, amount_b, token_b, token_a, token_b
            ),
            ActionOutcome::Swapped {
                token_in,
                token_out,
                amount_in,
                amount_out,
            } => write!(
                f,
                "Swapped {} {} for {} {}",
                amount_in, token_in, amount_out, token_out
            ),
            ActionOutcome::Reserves(reserves) => write!(f, "{}", reserves),
            ActionOutcome::Balance {
                user,
                token,
                amount,
            } => write!(f, "User {} has {} {} tokens", user, amount, token),
        }
    }
}

impl AmmEngine {
    /// Apply one action atomically
    pub fn execute(&mut self, action: AmmAction) -> Result<ActionOutcome, AmmError> {
        let name = action.name();
        let result = self.dispatch(action);
        if let Err(e) = &result {
            warn!(action = name, kind = e.kind(), "Rejected action: {}", e);
        }
        result
    }

    fn dispatch(&mut self, action: AmmAction) -> Result<ActionOutcome, AmmError> {
        match action {
            AmmAction::MintTokens {
                user,
                token,
                amount,
            } => {
                let balance = self.mint_tokens(&user, &token, amount)?;
                Ok(ActionOutcome::Minted {
                    user,
                    token,
                    amount,
                    balance,
                })
            }
            AmmAction::AddLiquidity {
                user,
                token_a,
                token_b,
                amount_a,
                amount_b,
            } => {
                let minted = self.add_liquidity(&user, &token_a, &token_b, amount_a, amount_b)?;
                Ok(ActionOutcome::LiquidityAdded {
                    token_a,
                    token_b,
                    amount_a,
                    amount_b,
                    minted,
                })
            }
            AmmAction::RemoveLiquidity {
                user,
                token_a,
                token_b,
                liquidity_amount,
            } => {
                let (amount_a, amount_b) =
                    self.remove_liquidity(&user, &token_a, &token_b, liquidity_amount)?;
                Ok(ActionOutcome::LiquidityRemoved {
                    token_a,
                    token_b,
                    amount_a,
                    amount_b,
                })
            }
            AmmAction::SwapExactTokensForTokens {
                user,
                token_in,
                token_out,
                amount_in,
                min_amount_out,
            } => {
                let amount_out = self.swap_exact_tokens_for_tokens(
                    &user,
                    &token_in,
                    &token_out,
                    amount_in,
                    min_amount_out,
                )?;
                Ok(ActionOutcome::Swapped {
                    token_in,
                    token_out,
                    amount_in,
                    amount_out,
                })
            }
            AmmAction::GetReserves { token_a, token_b } => {
                Ok(ActionOutcome::Reserves(self.get_reserves(&token_a, &token_b)))
            }
            AmmAction::GetUserBalance { user, token } => {
                let amount = self.get_user_balance(&user, &token);
                Ok(ActionOutcome::Balance {
                    user,
                    token,
                    amount,
                })
            }
        }
    }
}
