//! Host Configuration Module
//!
//! Provides configuration loading for AMM hosts.
//! Supports loading from TOML files with environment variable overrides.

use amm_ledger::EngineConfig;
use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Prefix for environment overrides, e.g. `AMM_ENGINE__FEE_BPS=25`
pub const ENV_PREFIX: &str = "AMM";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Main host configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    /// Engine tuning handed to `AmmEngine::with_config`
    pub engine: EngineConfig,

    /// Where committed state lives between runs
    pub state: StateSettings,

    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct StateSettings {
    /// Snapshot file; `${VAR}` references are expanded on load
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level or full `EnvFilter` directive
    pub level: String,
    pub json: bool,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("amm_state.bin"),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl HostConfig {
    /// Load configuration from an optional file with `AMM_` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Same as [`load`](Self::load) with a custom environment prefix
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading host config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        } else {
            debug!("No config file given, using defaults");
        }

        // Double underscore separates nesting so keys like fee_bps survive
        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut host: HostConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        host.expand_env_vars()?;
        host.validate()?;
        Ok(host)
    }

    /// Expand environment variables in path values
    pub fn expand_env_vars(&mut self) -> Result<()> {
        let raw = self.state.path.to_string_lossy().into_owned();
        let expanded = shellexpand::env(&raw).context("Failed to expand state path")?;
        self.state.path = PathBuf::from(expanded.as_ref());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.engine
            .validate()
            .context("Invalid engine configuration")?;

        if self.state.path.as_os_str().is_empty() {
            bail!("state.path must not be empty");
        }

        let level = self.logging.level.trim();
        if level.is_empty() {
            bail!("logging.level must not be empty");
        }
        // Bare levels are checked here; full directives are left to the subscriber
        if !level.contains('=') && !level.contains(',') && !LOG_LEVELS.contains(&level) {
            bail!(
                "logging.level '{}' is not one of {}",
                level,
                LOG_LEVELS.join(", ")
            );
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}
