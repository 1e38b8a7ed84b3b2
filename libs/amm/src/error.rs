//! Engine errors
//!
//! Every variant is a recoverable, caller-facing failure. The engine checks all
//! preconditions before touching state, so an `Err` always means nothing changed.

use crate::keys::Asset;
use thiserror::Error;

/// Business errors returned by engine operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmmError {
    /// A debit would drive a tracked amount negative
    #[error("Insufficient {asset} balance for {user}: required {required}, available {available}")]
    InsufficientBalance {
        user: String,
        asset: Asset,
        required: u128,
        available: u128,
    },

    /// The pair has no funded pool
    #[error("Pool does not exist for pair {token_a}/{token_b}")]
    PoolNotFound { token_a: String, token_b: String },

    /// Computed swap output fell below the caller's floor
    #[error("Slippage exceeded: output {amount_out} is below minimum {min_amount_out}")]
    SlippageExceeded {
        amount_out: u128,
        min_amount_out: u128,
    },

    /// Deposit diverges from the pool ratio under a strict ratio policy
    #[error("Invalid liquidity ratio: expected about {expected_amount_b} of the second token, got {provided_amount_b}")]
    InvalidLiquidityRatio {
        expected_amount_b: u128,
        provided_amount_b: u128,
    },

    /// Deposit too small to mint a single LP share
    #[error("Deposit of {amount_a}/{amount_b} mints zero liquidity shares")]
    InsufficientLiquidityMinted { amount_a: u128, amount_b: u128 },

    /// Requested output would drain the reserve
    #[error("Insufficient liquidity: requested {requested}, reserve holds {available}")]
    InsufficientLiquidity { requested: u128, available: u128 },

    #[error("{operation} requires a non-zero amount")]
    ZeroAmount { operation: &'static str },

    #[error("Identifier `{field}` must not be empty")]
    EmptyIdentifier { field: &'static str },

    #[error("Pair must contain two distinct tokens, got {token} twice")]
    IdenticalTokens { token: String },

    /// Bounds error: a value left the u128 range. Fails closed, never wraps.
    #[error("Arithmetic overflow in {operation}")]
    ArithmeticOverflow { operation: &'static str },

    #[error("Invalid engine configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl AmmError {
    /// Stable machine-readable error kind for hosts
    pub fn kind(&self) -> &'static str {
        match self {
            AmmError::InsufficientBalance { .. } => "InsufficientBalance",
            AmmError::PoolNotFound { .. } => "PoolNotFound",
            AmmError::SlippageExceeded { .. } => "SlippageExceeded",
            AmmError::InvalidLiquidityRatio { .. } => "InvalidLiquidityRatio",
            AmmError::InsufficientLiquidityMinted { .. } => "InsufficientLiquidityMinted",
            AmmError::InsufficientLiquidity { .. } => "InsufficientLiquidity",
            AmmError::ZeroAmount { .. } => "ZeroAmount",
            AmmError::EmptyIdentifier { .. } => "EmptyIdentifier",
            AmmError::IdenticalTokens { .. } => "IdenticalTokens",
            AmmError::ArithmeticOverflow { .. } => "ArithmeticOverflow",
            AmmError::InvalidConfig { .. } => "InvalidConfig",
        }
    }

    pub(crate) fn overflow(operation: &'static str) -> Self {
        AmmError::ArithmeticOverflow { operation }
    }
}

/// Errors raised while encoding or restoring a state snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Unsupported snapshot version {found}, expected {expected}")]
    UnsupportedVersion { found: u8, expected: u8 },

    /// Decoded cleanly but violates an engine invariant
    #[error("Corrupted snapshot: {reason}")]
    Corrupted { reason: String },
}
