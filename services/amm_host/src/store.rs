//! Snapshot persistence
//!
//! The state file holds the raw commitment bytes. Writes go to a sibling
//! temp file that is renamed over the target, so a crash mid-write leaves the
//! previous state intact.

use amm_ledger::{AmmEngine, EngineConfig, StateCommitment};
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File-backed engine state
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the engine, or start empty when no state file exists yet
    pub fn load(&self, config: EngineConfig) -> Result<AmmEngine> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No state at {:?}, starting empty ledger", self.path);
                return AmmEngine::with_config(config).context("Invalid engine configuration");
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read state {:?}", self.path))
            }
        };

        let engine = AmmEngine::from_commitment(&StateCommitment(bytes), config)
            .with_context(|| format!("Failed to restore state from {:?}", self.path))?;
        debug!(
            pools = engine.pool_count(),
            path = ?self.path,
            "Loaded ledger state"
        );
        Ok(engine)
    }

    /// Commit the engine and atomically replace the state file
    pub fn save(&self, engine: &AmmEngine) -> Result<StateCommitment> {
        let commitment = engine.commit().context("Failed to serialize ledger state")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory {:?}", parent))?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, commitment.as_bytes())
            .with_context(|| format!("Failed to write {:?}", tmp))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move {:?} into place", tmp))?;

        info!(
            path = ?self.path,
            bytes = commitment.as_bytes().len(),
            digest = %commitment.to_hex(),
            "Saved ledger state"
        );
        Ok(commitment)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
