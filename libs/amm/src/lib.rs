//! # AMM Ledger - Constant-Product Exchange Engine
//!
//! ## Purpose
//!
//! Deterministic state machine for a minimal automated market maker: a per-user
//! token ledger, any number of two-token constant-product pools, LP share
//! accounting and fee-bearing swaps. All amounts are unsigned 128-bit integers
//! with floor rounding, so every host replaying the same actions reaches the
//! same state bytes.
//!
//! ## Integration Points
//!
//! - **Input Sources**: [`AmmAction`] values decoded by the host (JSON or bincode blobs)
//! - **Output Destinations**: [`ActionOutcome`] / [`AmmError`] relayed to the caller,
//!   [`StateCommitment`] bytes persisted by the host between runs
//! - **Configuration**: [`EngineConfig`] (fee, liquidity ratio policy), never part of state
//! - **Validation**: Checked arithmetic everywhere; overflow fails closed
//!
//! ## Architecture Role
//!
//! The engine performs no I/O. Hosts own persistence and transport, hand it one
//! action at a time and commit the snapshot after each batch.
//!
//! See [`architecture_diagram()`] for visual representation of the data flow.

pub mod action;
pub mod engine;
pub mod error;
pub mod keys;
pub mod pool;
pub mod pool_traits;
pub mod snapshot;
pub mod traits;
pub mod v2_math;

pub use action::{ActionOutcome, AmmAction};
pub use engine::{AmmEngine, EngineConfig, RatioPolicy};
pub use error::{AmmError, SnapshotError};
pub use keys::{Asset, BalanceKey, PairKey};
pub use pool::{LiquidityPool, PoolReserves};
pub use pool_traits::AmmPool;
pub use snapshot::{StateCommitment, SNAPSHOT_VERSION};
pub use traits::Stateful;
pub use v2_math::{IntegerSqrt, V2Math, V2PoolState, DEFAULT_FEE_BPS};

/// Decimal type used for analytics (spot price, price impact)
pub use rust_decimal::Decimal;

/// Architecture diagram showing how actions flow through the engine
#[cfg_attr(doc, aquamarine::aquamarine)]
/// ```mermaid
/// graph LR
///     subgraph Host["📥 Host"]
///         AC[AmmAction]
///         CF[EngineConfig]
///     end
///
///     subgraph Engine["🧮 AmmEngine"]
///         LG[Balance Ledger]
///         PL[Pool Map]
///         VM[V2Math]
///     end
///
///     subgraph Output["📤 Results"]
///         OC[ActionOutcome / AmmError]
///         SC[StateCommitment]
///     end
///
///     AC --> LG
///     AC --> PL
///     CF --> VM
///     PL --> VM
///     VM --> LG
///     LG --> OC
///     PL --> OC
///     LG --> SC
///     PL --> SC
///
///     style Host fill:#e1f5fe
///     style Engine fill:#fff3e0
///     style Output fill:#e8f5e9
/// ```
pub fn architecture_diagram() {
    // Rendered by aquamarine in rustdoc
}
