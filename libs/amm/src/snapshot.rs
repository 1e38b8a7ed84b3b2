//! Deterministic state snapshots and commitments
//!
//! The snapshot is the bincode encoding of both maps in key order. Balances
//! of zero are never stored, so two engines with the same logical state
//! always produce the same bytes. Hosts hash these bytes into their state
//! commitment and feed them back through [`Stateful::restore`].
//!
//! Restore only accepts that canonical form: trailing bytes, zero balances
//! and out-of-order entries are rejected, so each state has exactly one
//! accepted encoding and one commitment.

use crate::action::{ActionOutcome, AmmAction};
use crate::engine::{lp_supply_by_pair, AmmEngine, EngineConfig};
use crate::error::{AmmError, SnapshotError};
use crate::keys::{Asset, BalanceKey, PairKey};
use crate::pool::LiquidityPool;
use crate::traits::Stateful;
use bincode::Options;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::collections::BTreeMap;
use tracing::debug;

/// Current snapshot layout version, first byte of every snapshot
pub const SNAPSHOT_VERSION: u8 = 1;

/// Fixed-width little-endian integers, no trailing input
fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

#[derive(Serialize, Deserialize)]
struct SnapshotData {
    version: u8,
    balances: Vec<(BalanceKey, u128)>,
    pools: Vec<LiquidityPool>,
}

/// Serialized engine state as handed to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCommitment(pub Vec<u8>);

impl StateCommitment {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// SHA3-256 of the snapshot bytes
    pub fn digest(&self) -> [u8; 32] {
        Sha3_256::digest(&self.0).into()
    }

    /// Hex of [`digest`](Self::digest)
    pub fn to_hex(&self) -> String {
        hex::encode(self.digest())
    }
}

impl AmmEngine {
    /// Serialize the full ledger into its canonical byte form
    pub fn commit(&self) -> Result<StateCommitment, SnapshotError> {
        self.snapshot().map(StateCommitment)
    }

    /// Rebuild an engine from committed bytes under the given config
    pub fn from_commitment(
        commitment: &StateCommitment,
        config: EngineConfig,
    ) -> Result<Self, SnapshotError> {
        let mut engine = AmmEngine::with_config(config).map_err(|e| SnapshotError::Corrupted {
            reason: e.to_string(),
        })?;
        engine.restore(commitment.as_bytes())?;
        Ok(engine)
    }
}

impl Stateful for AmmEngine {
    type Event = AmmAction;
    type Outcome = ActionOutcome;
    type Error = AmmError;

    fn apply_event(&mut self, event: Self::Event) -> Result<Self::Outcome, Self::Error> {
        self.execute(event)
    }

    fn snapshot(&self) -> Result<Vec<u8>, SnapshotError> {
        let data = SnapshotData {
            version: SNAPSHOT_VERSION,
            balances: self
                .raw_balances()
                .iter()
                .map(|(key, amount)| (key.clone(), *amount))
                .collect(),
            pools: self.raw_pools().values().cloned().collect(),
        };
        Ok(codec().serialize(&data)?)
    }

    fn restore(&mut self, snapshot: &[u8]) -> Result<(), SnapshotError> {
        match snapshot.first() {
            None => {
                return Err(SnapshotError::Corrupted {
                    reason: "empty snapshot".to_string(),
                })
            }
            Some(&found) if found != SNAPSHOT_VERSION => {
                return Err(SnapshotError::UnsupportedVersion {
                    found,
                    expected: SNAPSHOT_VERSION,
                })
            }
            Some(_) => {}
        }
        let data: SnapshotData = codec().deserialize(snapshot)?;

        let balances = rebuild_balances(data.balances)?;
        let pools = rebuild_pools(data.pools)?;
        verify_lp_supply(&balances, &pools)?;

        debug!(
            balances = balances.len(),
            pools = pools.len(),
            "Restored engine state"
        );
        *self = AmmEngine::from_parts(self.config().clone(), balances, pools);
        Ok(())
    }
}

fn corrupted(reason: String) -> SnapshotError {
    SnapshotError::Corrupted { reason }
}

fn rebuild_balances(
    entries: Vec<(BalanceKey, u128)>,
) -> Result<BTreeMap<BalanceKey, u128>, SnapshotError> {
    let mut balances = BTreeMap::new();
    for (key, amount) in entries {
        if key.owner.is_empty() {
            return Err(corrupted("balance with empty owner".to_string()));
        }
        match &key.asset {
            Asset::Token(symbol) if symbol.is_empty() => {
                return Err(corrupted(format!("empty token symbol for {}", key.owner)));
            }
            Asset::LpShare(pair) if !pair.is_canonical() => {
                return Err(corrupted(format!("non-canonical LP pair {}", pair)));
            }
            _ => {}
        }
        if amount == 0 {
            return Err(corrupted(format!(
                "zero balance stored for {} {}",
                key.owner, key.asset
            )));
        }
        if balances.last_key_value().is_some_and(|(last, _)| *last >= key) {
            return Err(corrupted(format!(
                "balance for {} {} is duplicated or out of order",
                key.owner, key.asset
            )));
        }
        balances.insert(key, amount);
    }
    Ok(balances)
}

fn rebuild_pools(
    entries: Vec<LiquidityPool>,
) -> Result<BTreeMap<PairKey, LiquidityPool>, SnapshotError> {
    let mut pools = BTreeMap::new();
    for pool in entries {
        let pair = pool.pair();
        if !pair.is_canonical() || pair.token_a() != pool.token_a {
            return Err(corrupted(format!(
                "pool {}/{} is not in canonical order",
                pool.token_a, pool.token_b
            )));
        }
        pool.check_invariants().map_err(corrupted)?;
        if pools.last_key_value().is_some_and(|(last, _)| *last >= pair) {
            return Err(corrupted(format!("pool {} is duplicated or out of order", pair)));
        }
        pools.insert(pair, pool);
    }
    Ok(pools)
}

/// Every pool's share supply must equal the shares users actually hold
fn verify_lp_supply(
    balances: &BTreeMap<BalanceKey, u128>,
    pools: &BTreeMap<PairKey, LiquidityPool>,
) -> Result<(), SnapshotError> {
    let supply = lp_supply_by_pair(balances).map_err(|e| corrupted(e.to_string()))?;
    if let Some(orphan) = supply.keys().find(|pair| !pools.contains_key(*pair)) {
        return Err(corrupted(format!("LP shares held for missing pool {}", orphan)));
    }
    for (pair, pool) in pools {
        let held = supply.get(pair).copied().unwrap_or(0);
        if held != pool.total_liquidity {
            return Err(corrupted(format!(
                "pool {} records {} shares but users hold {}",
                pair, pool.total_liquidity, held
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_engine() -> AmmEngine {
        let mut engine = AmmEngine::new();
        engine.mint_tokens("alice", "USDC", 5000).unwrap();
        engine.mint_tokens("alice", "ETH", 2000).unwrap();
        engine.mint_tokens("bob", "ETH", 100).unwrap();
        engine
            .add_liquidity("alice", "USDC", "ETH", 2000, 1000)
            .unwrap();
        engine
            .swap_exact_tokens_for_tokens("bob", "ETH", "USDC", 100, 0)
            .unwrap();
        engine
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let engine = sample_engine();
        let snapshot = engine.snapshot().unwrap();
        assert_eq!(snapshot[0], SNAPSHOT_VERSION);

        let mut restored = AmmEngine::new();
        restored.restore(&snapshot).unwrap();
        assert_eq!(restored, engine);
        assert_eq!(restored.snapshot().unwrap(), snapshot);
    }

    #[test]
    fn test_identical_state_gives_identical_bytes() {
        // Same logical state reached by different paths
        let mut left = AmmEngine::new();
        left.mint_tokens("alice", "A", 10).unwrap();
        left.mint_tokens("bob", "B", 10).unwrap();

        let mut right = AmmEngine::new();
        right.mint_tokens("bob", "B", 4).unwrap();
        right.mint_tokens("carol", "C", 0).unwrap();
        right.mint_tokens("alice", "A", 10).unwrap();
        right.mint_tokens("bob", "B", 6).unwrap();

        assert_eq!(left.commit().unwrap(), right.commit().unwrap());
        assert_eq!(
            left.commit().unwrap().to_hex(),
            right.commit().unwrap().to_hex()
        );
    }

    #[test]
    fn test_commitment_changes_with_state() {
        let mut engine = sample_engine();
        let before = engine.commit().unwrap();
        engine.mint_tokens("dave", "USDC", 1).unwrap();
        let after = engine.commit().unwrap();
        assert_ne!(before.digest(), after.digest());
        assert_eq!(after.to_hex().len(), 64);
    }

    #[test]
    fn test_from_commitment_keeps_host_config() {
        let engine = sample_engine();
        let commitment = engine.commit().unwrap();
        let config = EngineConfig {
            fee_bps: 25,
            ..EngineConfig::default()
        };
        let restored = AmmEngine::from_commitment(&commitment, config.clone()).unwrap();
        assert_eq!(restored.config(), &config);
        assert_eq!(
            restored.get_reserves("ETH", "USDC"),
            engine.get_reserves("USDC", "ETH")
        );
    }

    #[test]
    fn test_restore_rejects_bad_input_and_keeps_state() {
        let mut engine = sample_engine();
        let before = engine.clone();

        assert!(matches!(
            engine.restore(&[]),
            Err(SnapshotError::Corrupted { .. })
        ));
        assert!(matches!(
            engine.restore(&[9, 0, 0]),
            Err(SnapshotError::UnsupportedVersion { found: 9, .. })
        ));
        assert!(matches!(
            engine.restore(&[SNAPSHOT_VERSION, 0xff]),
            Err(SnapshotError::Codec(_))
        ));
        assert_eq!(engine, before);
    }

    #[test]
    fn test_restore_rejects_inconsistent_lp_supply() {
        let pair = PairKey::new("A", "B");
        let data = SnapshotData {
            version: SNAPSHOT_VERSION,
            balances: vec![(BalanceKey::lp_share("alice", &pair), 5)],
            pools: vec![LiquidityPool {
                reserve_a: 10,
                reserve_b: 10,
                total_liquidity: 10,
                ..LiquidityPool::new(&pair)
            }],
        };
        let bytes = codec().serialize(&data).unwrap();
        let err = AmmEngine::new().restore(&bytes).unwrap_err();
        assert!(err.to_string().contains("users hold 5"));
    }

    #[test]
    fn test_restore_rejects_partially_funded_pool() {
        let pair = PairKey::new("A", "B");
        let data = SnapshotData {
            version: SNAPSHOT_VERSION,
            balances: vec![],
            pools: vec![LiquidityPool {
                reserve_a: 10,
                ..LiquidityPool::new(&pair)
            }],
        };
        let bytes = codec().serialize(&data).unwrap();
        assert!(matches!(
            AmmEngine::new().restore(&bytes),
            Err(SnapshotError::Corrupted { .. })
        ));
    }

    #[test]
    fn test_restore_rejects_trailing_bytes() {
        let engine = sample_engine();
        let mut bytes = engine.snapshot().unwrap();
        bytes.extend_from_slice(b"junk");

        let mut target = AmmEngine::new();
        assert!(matches!(
            target.restore(&bytes),
            Err(SnapshotError::Codec(_))
        ));
        assert_eq!(target, AmmEngine::new());
    }

    #[test]
    fn test_restore_accepts_only_canonical_entries() {
        let alice = BalanceKey::token("alice", "A");
        let bob = BalanceKey::token("bob", "A");
        let encode = |balances: Vec<(BalanceKey, u128)>| {
            codec()
                .serialize(&SnapshotData {
                    version: SNAPSHOT_VERSION,
                    balances,
                    pools: vec![],
                })
                .unwrap()
        };

        let canonical = encode(vec![(alice.clone(), 3), (bob.clone(), 4)]);
        let mut engine = AmmEngine::new();
        engine.restore(&canonical).unwrap();
        assert_eq!(engine.snapshot().unwrap(), canonical);

        for bytes in [
            encode(vec![(bob.clone(), 4), (alice.clone(), 3)]),
            encode(vec![(alice.clone(), 3), (alice.clone(), 3)]),
            encode(vec![(alice.clone(), 3), (bob.clone(), 0)]),
        ] {
            let mut target = AmmEngine::new();
            assert!(matches!(
                target.restore(&bytes),
                Err(SnapshotError::Corrupted { .. })
            ));
            assert_eq!(target, AmmEngine::new());
        }
    }

    #[test]
    fn test_apply_event_matches_execute() {
        let mut engine = AmmEngine::new();
        let outcome = engine
            .apply_event(AmmAction::MintTokens {
                user: "alice".to_string(),
                token: "USDC".to_string(),
                amount: 7,
            })
            .unwrap();
        assert!(matches!(outcome, ActionOutcome::Minted { balance: 7, .. }));
    }
}
