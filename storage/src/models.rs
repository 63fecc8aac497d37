//! Snapshot model types
//!
//! Plain data holders persisted through [`crate::SnapshotStore`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use oceans_core::{Coldkey, Hotkey, SubnetId};
use serde::{Deserialize, Serialize};

/// One snapshot of a voter's subnet-weights vector produced by α-Stake
/// voting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoteSnapshot {
    pub block_height: u64,
    pub voter_hotkey: Hotkey,
    pub voter_stake: f64,
    /// Mapping subnet_id -> weight.
    pub weights: BTreeMap<SubnetId, f64>,
    /// When the snapshot object was created (UTC).
    pub ts: DateTime<Utc>,
}

impl VoteSnapshot {
    pub fn new(
        block_height: u64,
        voter_hotkey: Hotkey,
        voter_stake: f64,
        weights: BTreeMap<SubnetId, f64>,
    ) -> Self {
        Self {
            block_height,
            voter_hotkey,
            voter_stake,
            weights,
            ts: Utc::now(),
        }
    }
}

/// Liquidity provided by one coldkey in one subnet at a given block.
/// All values are denominated in TAO.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiquiditySnapshot {
    pub coldkey: Coldkey,
    pub subnet_id: SubnetId,
    pub tao_value: f64,
    pub block_height: u64,
    pub ts: DateTime<Utc>,
}

impl LiquiditySnapshot {
    pub fn new(coldkey: Coldkey, subnet_id: SubnetId, tao_value: f64, block_height: u64) -> Self {
        Self {
            coldkey,
            subnet_id,
            tao_value,
            block_height,
            ts: Utc::now(),
        }
    }
}

/// Persistent validator state restored on startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidatorState {
    /// Iteration counter.
    pub step: u64,
    /// EMA score per UID, aligned with `hotkeys`.
    pub scores: Vec<f64>,
    /// Hotkeys as of the last metagraph sync.
    pub hotkeys: Vec<Hotkey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_snapshot_carries_weights() {
        let mut weights = BTreeMap::new();
        weights.insert(10, 1.0);
        let snap = VoteSnapshot::new(100, "hk-1".to_string(), 2.0, weights.clone());

        assert_eq!(snap.block_height, 100);
        assert_eq!(snap.weights, weights);
    }

    #[test]
    fn validator_state_default_is_empty() {
        let state = ValidatorState::default();
        assert_eq!(state.step, 0);
        assert!(state.scores.is_empty());
        assert!(state.hotkeys.is_empty());
    }
}
