//! Persistent score table
//!
//! Holds the EMA-smoothed miner scores aligned with the metagraph and
//! keeps them consistent across metagraph resyncs.

use oceans_chain::Metagraph;
use oceans_core::constants::SCORE_EMA_ALPHA;
use oceans_core::{Hotkey, Uid};
use oceans_storage::ValidatorState;
use tracing::{debug, info, warn};

use crate::error::{Result, ValidatorError};

pub struct ScoreTable {
    step: u64,
    scores: Vec<f64>,
    hotkeys: Vec<Hotkey>,
}

impl ScoreTable {
    /// Fresh table aligned with the metagraph, all scores zero.
    pub fn new(metagraph: &Metagraph) -> Self {
        Self {
            step: 0,
            scores: vec![0.0; metagraph.len()],
            hotkeys: metagraph.hotkeys.clone(),
        }
    }

    /// Restore from saved state, then align with the current metagraph.
    pub fn from_state(state: ValidatorState, metagraph: &Metagraph) -> Self {
        let mut table = Self {
            step: state.step,
            scores: state.scores,
            hotkeys: state.hotkeys,
        };
        if table.scores.len() != table.hotkeys.len() {
            warn!("saved state inconsistent, starting from zero scores");
            table.scores = vec![0.0; metagraph.len()];
            table.hotkeys = metagraph.hotkeys.clone();
        }
        table.resync(metagraph);
        table
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn bump_step(&mut self) {
        self.step += 1;
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// EMA update from per-miner rewards.
    ///
    /// Rewards are scattered into a full-size vector (UIDs outside the
    /// table are ignored, NaN coerced to zero), then folded in with
    /// `score = α × reward + (1 − α) × score`.
    pub fn update(&mut self, uids: &[Uid], rewards: &[f64]) -> Result<()> {
        if uids.len() != rewards.len() {
            return Err(ValidatorError::ScoreShapeMismatch {
                rewards: rewards.len(),
                uids: uids.len(),
            });
        }
        if uids.is_empty() {
            warn!("score update called with empty inputs");
            return Ok(());
        }

        let mut scattered = vec![0.0; self.scores.len()];
        for (&uid, &reward) in uids.iter().zip(rewards.iter()) {
            let reward = if reward.is_finite() { reward } else { 0.0 };
            if let Some(slot) = scattered.get_mut(uid as usize) {
                *slot = reward;
            }
        }

        for (score, reward) in self.scores.iter_mut().zip(scattered.iter()) {
            *score = SCORE_EMA_ALPHA * reward + (1.0 - SCORE_EMA_ALPHA) * *score;
        }

        let nnz = self.scores.iter().filter(|s| **s > 0.0).count();
        let sum: f64 = self.scores.iter().sum();
        info!(
            alpha = SCORE_EMA_ALPHA,
            nnz,
            sum,
            top = ?self.top_k(5),
            "scores updated"
        );
        Ok(())
    }

    /// Keep scores aligned with the miner set after a metagraph sync:
    /// zero entries whose hotkey was replaced, grow when the subnet grew.
    pub fn resync(&mut self, metagraph: &Metagraph) {
        let mut replaced = 0;
        for (uid, hotkey) in self.hotkeys.iter().enumerate() {
            match metagraph.hotkeys.get(uid) {
                Some(current) if current == hotkey => {}
                _ => {
                    if let Some(score) = self.scores.get_mut(uid) {
                        *score = 0.0;
                        replaced += 1;
                    }
                }
            }
        }

        if self.scores.len() < metagraph.len() {
            debug!(
                from = self.scores.len(),
                to = metagraph.len(),
                "score table grew with subnet"
            );
            self.scores.resize(metagraph.len(), 0.0);
        }
        self.hotkeys = metagraph.hotkeys.clone();

        if replaced > 0 {
            info!(replaced, "zeroed scores for replaced hotkeys");
        }
    }

    /// Top-k (uid, score) pairs with positive scores, for compact logging.
    pub fn top_k(&self, k: usize) -> Vec<(Uid, f64)> {
        let mut indexed: Vec<(Uid, f64)> = self
            .scores
            .iter()
            .enumerate()
            .filter(|(_, s)| **s > 0.0)
            .map(|(i, s)| (i as Uid, *s))
            .collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        indexed.truncate(k);
        indexed
    }

    pub fn to_state(&self) -> ValidatorState {
        ValidatorState {
            step: self.step,
            scores: self.scores.clone(),
            hotkeys: self.hotkeys.clone(),
        }
    }
}
