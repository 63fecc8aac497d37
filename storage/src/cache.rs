//! State cache for validator inputs
//!
//! Thin layer over [`SnapshotStore`] that keeps vote and liquidity
//! snapshots in memory between epochs, just enough to skip recomputing
//! expensive RPC calls when nothing changed.

use std::path::Path;

use tracing::debug;

use crate::models::{LiquiditySnapshot, ValidatorState, VoteSnapshot};
use crate::{Result, SnapshotStore, StorageError};

const VOTES_SNAPSHOT: &str = "votes";
const LIQUIDITY_SNAPSHOT: &str = "liquidity";
const STATE_SNAPSHOT: &str = "validator_state";

/// Instantiated once, then consulted every epoch.
pub struct StateCache {
    store: SnapshotStore,
    votes: Vec<VoteSnapshot>,
    liquidity: Vec<LiquiditySnapshot>,
}

impl StateCache {
    /// Open the cache, loading any snapshots left by a previous run.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let store = SnapshotStore::open(data_dir)?;

        let votes = match store.load::<Vec<VoteSnapshot>>(VOTES_SNAPSHOT) {
            Ok(v) => v,
            Err(StorageError::SnapshotNotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        let liquidity = match store.load::<Vec<LiquiditySnapshot>>(LIQUIDITY_SNAPSHOT) {
            Ok(v) => v,
            Err(StorageError::SnapshotNotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        debug!(
            votes = votes.len(),
            liquidity = liquidity.len(),
            "state cache loaded"
        );
        Ok(Self {
            store,
            votes,
            liquidity,
        })
    }

    // ── Votes ────────────────────────────────────────────────

    /// All cached votes, most recent block first.
    pub fn latest_votes(&self) -> Vec<&VoteSnapshot> {
        let mut votes: Vec<&VoteSnapshot> = self.votes.iter().collect();
        votes.sort_by(|a, b| b.block_height.cmp(&a.block_height));
        votes
    }

    /// Append new vote snapshots and persist the full set.
    pub fn persist_votes(&mut self, snapshots: Vec<VoteSnapshot>) -> Result<()> {
        if snapshots.is_empty() {
            return Ok(());
        }
        self.votes.extend(snapshots);
        self.store.save(VOTES_SNAPSHOT, &self.votes)?;
        debug!(total = self.votes.len(), "persisted vote snapshots");
        Ok(())
    }

    /// True when no vote for this (height, hotkey) pair is cached yet.
    pub fn votes_changed(&self, block_height: u64, voter_hotkey: &str) -> bool {
        !self
            .votes
            .iter()
            .any(|v| v.block_height == block_height && v.voter_hotkey == voter_hotkey)
    }

    // ── Liquidity ────────────────────────────────────────────

    /// All cached liquidity snapshots, most recent block first.
    pub fn latest_liquidity(&self) -> Vec<&LiquiditySnapshot> {
        let mut snaps: Vec<&LiquiditySnapshot> = self.liquidity.iter().collect();
        snaps.sort_by(|a, b| b.block_height.cmp(&a.block_height));
        snaps
    }

    /// Append new liquidity snapshots and persist the full set.
    pub fn persist_liquidity(&mut self, snapshots: Vec<LiquiditySnapshot>) -> Result<()> {
        if snapshots.is_empty() {
            return Ok(());
        }
        self.liquidity.extend(snapshots);
        self.store.save(LIQUIDITY_SNAPSHOT, &self.liquidity)?;
        debug!(total = self.liquidity.len(), "persisted liquidity snapshots");
        Ok(())
    }

    // ── Validator state ──────────────────────────────────────

    pub fn save_state(&self, state: &ValidatorState) -> Result<()> {
        self.store.save(STATE_SNAPSHOT, state)
    }

    /// Load the validator state; a fresh default when none was saved yet.
    pub fn load_state(&self) -> Result<ValidatorState> {
        match self.store.load(STATE_SNAPSHOT) {
            Ok(state) => Ok(state),
            Err(StorageError::SnapshotNotFound(_)) => Ok(ValidatorState::default()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn vote(height: u64, hotkey: &str) -> VoteSnapshot {
        let mut weights = BTreeMap::new();
        weights.insert(10u16, 1.0);
        VoteSnapshot::new(height, hotkey.to_string(), 1.0, weights)
    }

    #[test]
    fn votes_changed_detects_novelty() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = StateCache::open(dir.path()).unwrap();

        assert!(cache.votes_changed(100, "hk-1"));
        cache.persist_votes(vec![vote(100, "hk-1")]).unwrap();

        assert!(!cache.votes_changed(100, "hk-1"));
        assert!(cache.votes_changed(101, "hk-1"));
        assert!(cache.votes_changed(100, "hk-2"));
    }

    #[test]
    fn latest_votes_sorted_by_height_desc() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = StateCache::open(dir.path()).unwrap();

        cache
            .persist_votes(vec![vote(100, "a"), vote(300, "b"), vote(200, "c")])
            .unwrap();

        let heights: Vec<u64> = cache.latest_votes().iter().map(|v| v.block_height).collect();
        assert_eq!(heights, vec![300, 200, 100]);
    }

    #[test]
    fn cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut cache = StateCache::open(dir.path()).unwrap();
            cache.persist_votes(vec![vote(42, "hk-1")]).unwrap();
            cache
                .persist_liquidity(vec![LiquiditySnapshot::new(
                    "ck-1".to_string(),
                    10,
                    1.5,
                    42,
                )])
                .unwrap();
        }

        let cache = StateCache::open(dir.path()).unwrap();
        assert!(!cache.votes_changed(42, "hk-1"));
        assert_eq!(cache.latest_liquidity().len(), 1);
    }

    #[test]
    fn state_round_trip_and_default() {
        let dir = tempfile::tempdir().unwrap();
        let cache = StateCache::open(dir.path()).unwrap();

        // No state saved yet -> default
        assert_eq!(cache.load_state().unwrap(), ValidatorState::default());

        let state = ValidatorState {
            step: 7,
            scores: vec![0.25, 0.75],
            hotkeys: vec!["hk-a".to_string(), "hk-b".to_string()],
        };
        cache.save_state(&state).unwrap();
        assert_eq!(cache.load_state().unwrap(), state);
    }
}
