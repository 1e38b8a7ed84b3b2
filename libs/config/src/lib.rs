//! # AMM Host Configuration
//!
//! Layered configuration for processes that embed the AMM engine: built-in
//! defaults, then an optional TOML file, then `AMM_`-prefixed environment
//! variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use amm_config::HostConfig;
//! use std::path::Path;
//!
//! let config = HostConfig::load(Some(Path::new("amm.toml"))).unwrap();
//! println!("fee: {} bps", config.engine.fee_bps);
//! ```

pub mod host_config;

pub use host_config::{HostConfig, LoggingSettings, StateSettings, ENV_PREFIX};
