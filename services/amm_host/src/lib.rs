//! # AMM Host
//!
//! File-backed host for the AMM ledger. Loads the committed state, applies
//! batches of JSON actions and writes the new commitment back atomically.

pub mod batch;
pub mod store;
pub mod view;

pub use batch::{apply_batch, parse_actions, ActionReport, BatchReport};
pub use store::StateStore;
pub use view::StateView;
