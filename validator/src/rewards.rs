//! Reward calculation
//!
//! Reward(uid) = Σ_subnets (LP_uid,sub / Σ LP_all,sub) × MasterWeight_sub
//!
//! Stateless: votes and liquidity are passed in explicitly each epoch.

use std::collections::BTreeMap;

use oceans_chain::Metagraph;
use oceans_core::{SubnetId, Uid};
use oceans_votes::Vote;
use tracing::{debug, info, warn};

use crate::liquidity::LiquidityMap;

/// Computes the per-miner reward weights for the current epoch.
pub struct RewardCalculator;

impl RewardCalculator {
    /// Stake-weighted master subnet vector, Σ = 1.
    ///
    /// Each voter's weights are normalised first, then combined weighted
    /// by stake. Voters with no stake or a zero-sum vector are ignored.
    /// Empty input returns an empty vector and the caller falls back to
    /// uniform miner weights.
    pub fn master_vector(votes: &[Vote]) -> BTreeMap<SubnetId, f64> {
        let mut raw: BTreeMap<SubnetId, f64> = BTreeMap::new();
        let mut total_stake = 0.0;

        for vote in votes {
            if vote.voter_stake <= 0.0 || vote.weights.is_empty() {
                continue;
            }
            let sum: f64 = vote.weights.values().sum();
            if sum <= 0.0 {
                continue;
            }
            for (&subnet, &w) in &vote.weights {
                *raw.entry(subnet).or_default() += vote.voter_stake * (w / sum);
            }
            total_stake += vote.voter_stake;
        }

        if total_stake <= 0.0 {
            return BTreeMap::new();
        }

        let master: BTreeMap<SubnetId, f64> =
            raw.into_iter().map(|(s, w)| (s, w / total_stake)).collect();
        info!(
            subnets = master.len(),
            total = master.values().sum::<f64>(),
            "master subnet vector built"
        );
        master
    }

    /// Per-miner reward weights, Σ = 1 over the returned map.
    ///
    /// Falls back to a uniform distribution over all metagraph UIDs when
    /// no miner earns anything; returns empty for an empty metagraph.
    pub fn compute(
        metagraph: &Metagraph,
        votes: &[Vote],
        liquidity: &LiquidityMap,
    ) -> BTreeMap<Uid, f64> {
        if metagraph.is_empty() {
            warn!("metagraph contained no UIDs");
            return BTreeMap::new();
        }

        let master = Self::master_vector(votes);
        if master.is_empty() {
            warn!("master vector empty, miners will be uniform");
        }

        let mut rewards: BTreeMap<Uid, f64> = BTreeMap::new();
        for (&subnet, &weight) in &master {
            if weight <= 0.0 {
                continue;
            }
            // Subnet 0 never participates in scoring.
            if subnet == 0 {
                continue;
            }

            let Some(lp_by_uid) = liquidity.get(&subnet) else {
                continue;
            };
            let total_lp: f64 = lp_by_uid.values().sum();
            debug!(subnet, total_lp, weight, "scoring subnet");
            if total_lp <= 0.0 {
                continue;
            }

            for (&uid, &lp) in lp_by_uid {
                if lp <= 0.0 {
                    continue;
                }
                *rewards.entry(uid).or_default() += lp / total_lp * weight;
            }
        }

        let total: f64 = rewards.values().sum();
        if total > 0.0 {
            for r in rewards.values_mut() {
                *r /= total;
            }
            info!(miners = rewards.len(), "rewards normalised");
            rewards
        } else {
            warn!("reward vector zero, using uniform distribution");
            let uniform = 1.0 / metagraph.len() as f64;
            metagraph.uids.iter().map(|&uid| (uid, uniform)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn vote(hotkey: &str, stake: f64, weights: &[(SubnetId, f64)]) -> Vote {
        Vote {
            voter_hotkey: hotkey.to_string(),
            block_height: 100,
            voter_stake: stake,
            weights: weights.iter().copied().collect(),
            timestamp: None,
        }
    }

    fn metagraph(n: u16) -> Metagraph {
        Metagraph::new(
            66,
            1000,
            (0..n).collect(),
            (0..n).map(|i| format!("hk-{i}")).collect(),
            (0..n).map(|i| format!("ck-{i}")).collect(),
            vec![1.0; n as usize],
            1,
        )
    }

    #[test]
    fn master_vector_is_stake_weighted_and_normalised() {
        let votes = vec![
            vote("hk-a-0123456789", 3.0, &[(10, 1.0)]),
            vote("hk-b-0123456789", 1.0, &[(27, 1.0)]),
        ];
        let master = RewardCalculator::master_vector(&votes);

        assert!((master[&10] - 0.75).abs() < 1e-12);
        assert!((master[&27] - 0.25).abs() < 1e-12);
        assert!((master.values().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn master_vector_normalises_each_voter_first() {
        // Un-normalised voter weights must not give extra influence
        let votes = vec![
            vote("hk-a-0123456789", 1.0, &[(10, 200.0), (27, 200.0)]),
            vote("hk-b-0123456789", 1.0, &[(36, 1.0)]),
        ];
        let master = RewardCalculator::master_vector(&votes);

        assert!((master[&10] - 0.25).abs() < 1e-12);
        assert!((master[&27] - 0.25).abs() < 1e-12);
        assert!((master[&36] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn master_vector_ignores_zero_stake_and_zero_weights() {
        let votes = vec![
            vote("hk-a-0123456789", 0.0, &[(10, 1.0)]),
            vote("hk-b-0123456789", 1.0, &[(27, 0.0)]),
        ];
        assert!(RewardCalculator::master_vector(&votes).is_empty());
        assert!(RewardCalculator::master_vector(&[]).is_empty());
    }

    #[test]
    fn compute_splits_by_liquidity_share() {
        let votes = vec![vote("hk-a-0123456789", 1.0, &[(10, 0.5), (27, 0.5)])];

        let mut liquidity = LiquidityMap::new();
        liquidity.insert(10, BTreeMap::from([(0u16, 100.0), (2u16, 100.0)]));
        liquidity.insert(27, BTreeMap::from([(1u16, 50.0), (2u16, 50.0)]));

        let rewards = RewardCalculator::compute(&metagraph(3), &votes, &liquidity);

        // uid 0: 0.5×0.5 = 0.25; uid 1: 0.5×0.5 = 0.25; uid 2: 0.25+0.25 = 0.5
        assert!((rewards[&0] - 0.25).abs() < 1e-12);
        assert!((rewards[&1] - 0.25).abs() < 1e-12);
        assert!((rewards[&2] - 0.5).abs() < 1e-12);
        assert!((rewards.values().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn compute_uniform_fallback_without_liquidity() {
        let votes = vec![vote("hk-a-0123456789", 1.0, &[(10, 1.0)])];
        let rewards = RewardCalculator::compute(&metagraph(4), &votes, &LiquidityMap::new());

        assert_eq!(rewards.len(), 4);
        for r in rewards.values() {
            assert!((r - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn compute_uniform_fallback_without_votes() {
        let mut liquidity = LiquidityMap::new();
        liquidity.insert(10, BTreeMap::from([(0u16, 100.0)]));

        let rewards = RewardCalculator::compute(&metagraph(2), &[], &liquidity);
        assert_eq!(rewards.len(), 2);
        assert!((rewards[&0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn compute_empty_metagraph_is_empty() {
        let rewards = RewardCalculator::compute(&metagraph(0), &[], &LiquidityMap::new());
        assert!(rewards.is_empty());
    }

    #[test]
    fn subnets_without_weight_contribute_nothing() {
        let votes = vec![vote("hk-a-0123456789", 1.0, &[(10, 1.0)])];

        let mut liquidity = LiquidityMap::new();
        liquidity.insert(10, BTreeMap::from([(0u16, 10.0)]));
        // Liquidity on a subnet nobody voted for
        liquidity.insert(27, BTreeMap::from([(1u16, 1000.0)]));

        let rewards = RewardCalculator::compute(&metagraph(2), &votes, &liquidity);
        assert!((rewards[&0] - 1.0).abs() < 1e-12);
        assert!(!rewards.contains_key(&1));
    }
}
