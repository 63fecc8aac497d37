//! Liquidity measurement
//!
//! Pulls on-chain liquidity for the active subnets and reduces it to a
//! per-miner TAO map for the reward calculator. Only the TAO leg of each
//! position is counted, valued at the subnet's current price.

use std::collections::BTreeMap;
use std::sync::Arc;

use oceans_chain::{sqrt_price_to_price, ChainClient, LiquidityPosition, LiquiditySubnet};
use oceans_core::constants::ACTIVE_SUBNETS;
use oceans_core::{Coldkey, SubnetId, Uid, ValidatorConfig};
use oceans_storage::LiquiditySnapshot;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::Result;

/// `{subnet_id -> {uid_on_primary -> tao}}`.
pub type LiquidityMap = BTreeMap<SubnetId, BTreeMap<Uid, f64>>;

/// Result of one liquidity sweep.
pub struct LiquidityOutcome {
    /// Block the sweep was taken at.
    pub block: u64,
    pub by_subnet: LiquidityMap,
    /// Per-coldkey aggregates for the state cache.
    pub snapshots: Vec<LiquiditySnapshot>,
}

/// Fetches on-chain liquidity and aggregates it per miner UID.
pub struct LiquidityFetcher {
    primary_netuid: SubnetId,
    count_only_in_range: bool,
    min_relative_width: f64,
    max_concurrency: usize,
}

impl LiquidityFetcher {
    pub fn new(config: &ValidatorConfig) -> Self {
        Self {
            primary_netuid: config.netuid,
            count_only_in_range: config.count_only_in_range,
            min_relative_width: config.min_relative_width,
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// Sweep liquidity for all active subnets, or a single one when
    /// `netuid` is given. Requests for subnet 0 or a subnet outside the
    /// active set return an empty outcome.
    pub async fn fetch(
        &self,
        chain: Arc<dyn ChainClient>,
        netuid: Option<SubnetId>,
    ) -> Result<LiquidityOutcome> {
        let block = chain.block().await?;

        let targets: Vec<SubnetId> = match netuid {
            None => ACTIVE_SUBNETS.to_vec(),
            Some(0) => {
                warn!("ignoring liquidity request for subnet 0");
                Vec::new()
            }
            Some(s) if !ACTIVE_SUBNETS.contains(&s) => {
                warn!(subnet = s, "subnet is not active, skipping");
                Vec::new()
            }
            Some(s) => vec![s],
        };

        if targets.is_empty() {
            return Ok(LiquidityOutcome {
                block,
                by_subnet: LiquidityMap::new(),
                snapshots: Vec::new(),
            });
        }

        // Coldkey universe and UID mapping come from the primary subnet.
        let primary = chain.metagraph(self.primary_netuid).await?;
        let uid_by_coldkey = primary.uid_by_coldkey();
        let coldkeys = primary.unique_coldkeys();
        info!(
            block,
            coldkeys = coldkeys.len(),
            subnets = targets.len(),
            "starting liquidity sweep"
        );

        // Aggregate TAO per (coldkey, subnet).
        let mut aggregated: BTreeMap<(Coldkey, SubnetId), f64> = BTreeMap::new();

        for subnet in targets {
            let raw = chain.alpha_sqrt_price(subnet).await?;
            let price = match sqrt_price_to_price(raw) {
                Some(p) => p,
                None => {
                    warn!(subnet, "no valid price, skipping subnet");
                    continue;
                }
            };

            let sweep = self
                .fetch_subnet_positions(chain.clone(), subnet, &coldkeys)
                .await?;
            debug!(
                subnet,
                coldkeys = sweep.unique_coldkeys(),
                positions = sweep.total_positions(),
                "subnet positions fetched"
            );

            for (coldkey, positions) in sweep.positions_by_coldkey {
                let tao_sum: f64 = positions
                    .iter()
                    .filter_map(|pos| self.position_contribution(pos, price))
                    .sum();
                if tao_sum > 0.0 {
                    *aggregated.entry((coldkey, subnet)).or_default() += tao_sum;
                }
            }
        }

        debug!(entries = aggregated.len(), "aggregated liquidity entries");

        // Reduce to UID space; coldkeys without a UID on the primary
        // subnet earn nothing.
        let mut by_subnet = LiquidityMap::new();
        let mut snapshots = Vec::with_capacity(aggregated.len());
        for ((coldkey, subnet), tao) in aggregated {
            if tao <= 0.0 {
                continue;
            }
            snapshots.push(LiquiditySnapshot::new(coldkey.clone(), subnet, tao, block));
            match uid_by_coldkey.get(&coldkey) {
                Some(&uid) => {
                    by_subnet.entry(subnet).or_default().insert(uid, tao);
                }
                None => {
                    debug!(
                        coldkey = %&coldkey[..coldkey.len().min(6)],
                        subnet,
                        "coldkey not registered on primary subnet, skipped"
                    );
                }
            }
        }

        info!(
            uids = by_subnet.values().map(|m| m.len()).sum::<usize>(),
            subnets = by_subnet.len(),
            "liquidity map built"
        );
        Ok(LiquidityOutcome {
            block,
            by_subnet,
            snapshots,
        })
    }

    /// Query positions for every coldkey on one subnet, bounded by the
    /// configured concurrency. Per-coldkey failures degrade to empty
    /// position lists rather than failing the sweep.
    async fn fetch_subnet_positions(
        &self,
        chain: Arc<dyn ChainClient>,
        subnet: SubnetId,
        coldkeys: &[Coldkey],
    ) -> Result<LiquiditySubnet> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for coldkey in coldkeys.iter().cloned() {
            let chain = chain.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                match chain.liquidity_positions(subnet, &coldkey).await {
                    Ok(positions) => (coldkey, positions),
                    Err(e) => {
                        warn!(
                            coldkey = %&coldkey[..coldkey.len().min(6)],
                            subnet,
                            error = %e,
                            "position query failed"
                        );
                        (coldkey, Vec::new())
                    }
                }
            });
        }

        let mut sweep = LiquiditySubnet::new(subnet);
        while let Some(joined) = tasks.join_next().await {
            let (coldkey, positions) = joined?;
            if !positions.is_empty() {
                sweep.positions_by_coldkey.insert(coldkey, positions);
            }
        }
        Ok(sweep)
    }

    /// TAO contribution of one position at the current price, or `None`
    /// when the position is filtered out.
    fn position_contribution(&self, pos: &LiquidityPosition, price: f64) -> Option<f64> {
        if !pos.has_valid_bounds() {
            debug!(id = pos.id, "discarding position with invalid bounds");
            return None;
        }
        if self.count_only_in_range && !pos.in_range(price) {
            debug!(id = pos.id, price, "discarding out-of-range position");
            return None;
        }
        if self.min_relative_width > 0.0 && pos.relative_width(price) < self.min_relative_width {
            debug!(id = pos.id, "discarding too-narrow band");
            return None;
        }

        let tao = pos.to_token_amounts(price).tao;
        (tao.is_finite() && tao > 0.0).then_some(tao)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oceans_chain::{Metagraph, MockChain};
    use oceans_core::constants::RAO_PER_TAO;

    fn config() -> ValidatorConfig {
        ValidatorConfig::default()
    }

    fn primary_metagraph() -> Metagraph {
        Metagraph::new(
            66,
            1000,
            vec![0, 1, 2],
            vec!["hk-0".into(), "hk-1".into(), "hk-2".into()],
            vec!["ck-a".into(), "ck-b".into(), "ck-c".into()],
            vec![1.0, 1.0, 1.0],
            1,
        )
    }

    fn position(low: f64, high: f64, liquidity_tao: f64) -> LiquidityPosition {
        LiquidityPosition {
            id: 0,
            price_low: low,
            price_high: high,
            liquidity: (liquidity_tao * RAO_PER_TAO) as u64,
        }
    }

    #[tokio::test]
    async fn aggregates_in_range_positions_per_uid() {
        // Price 1.0, band (0.25, 4.0): tao = L × (1 − 0.5) = L/2
        let chain = Arc::new(
            MockChain::new(1000)
                .with_metagraph(primary_metagraph())
                .with_price(10, 1.0)
                .with_positions(10, "ck-a", vec![position(0.25, 4.0, 100.0)])
                .with_positions(10, "ck-b", vec![position(0.25, 4.0, 50.0)]),
        );

        let fetcher = LiquidityFetcher::new(&config());
        let outcome = fetcher.fetch(chain, Some(10)).await.unwrap();

        let subnet = &outcome.by_subnet[&10];
        assert!((subnet[&0] - 50.0).abs() < 1e-9);
        assert!((subnet[&1] - 25.0).abs() < 1e-9);
        assert_eq!(outcome.snapshots.len(), 2);
        assert_eq!(outcome.block, 1000);
    }

    #[tokio::test]
    async fn rejects_out_of_range_and_invalid_positions() {
        let chain = Arc::new(
            MockChain::new(1000)
                .with_metagraph(primary_metagraph())
                .with_price(10, 1.0)
                .with_positions(
                    10,
                    "ck-a",
                    vec![
                        position(2.0, 4.0, 100.0),  // price below band
                        position(4.0, 2.0, 100.0),  // inverted
                        position(-1.0, 2.0, 100.0), // non-positive bound
                    ],
                ),
        );

        let fetcher = LiquidityFetcher::new(&config());
        let outcome = fetcher.fetch(chain, Some(10)).await.unwrap();
        assert!(outcome.by_subnet.is_empty());
    }

    #[tokio::test]
    async fn min_relative_width_filters_narrow_bands() {
        let chain = Arc::new(
            MockChain::new(1000)
                .with_metagraph(primary_metagraph())
                .with_price(10, 1.0)
                // Band width 0.02 at price 1.0 -> relative width 0.02
                .with_positions(10, "ck-a", vec![position(0.99, 1.01, 100.0)]),
        );

        let mut cfg = config();
        cfg.min_relative_width = 0.05;
        let outcome = LiquidityFetcher::new(&cfg)
            .fetch(chain.clone(), Some(10))
            .await
            .unwrap();
        assert!(outcome.by_subnet.is_empty());

        cfg.min_relative_width = 0.01;
        let outcome = LiquidityFetcher::new(&cfg).fetch(chain, Some(10)).await.unwrap();
        assert!(!outcome.by_subnet.is_empty());
    }

    #[tokio::test]
    async fn subnet_zero_and_inactive_subnets_yield_nothing() {
        let chain = Arc::new(MockChain::new(1000).with_metagraph(primary_metagraph()));
        let fetcher = LiquidityFetcher::new(&config());

        let outcome = fetcher.fetch(chain.clone(), Some(0)).await.unwrap();
        assert!(outcome.by_subnet.is_empty());

        // 11 is not in the active set
        let outcome = fetcher.fetch(chain, Some(11)).await.unwrap();
        assert!(outcome.by_subnet.is_empty());
    }

    #[tokio::test]
    async fn only_primary_subnet_coldkeys_are_queried() {
        // ck-x holds positions but is not registered on the primary
        // subnet, so it is never queried and earns nothing.
        let mg = Metagraph::new(
            66,
            1000,
            vec![0, 1],
            vec!["hk-0".into(), "hk-1".into()],
            vec!["ck-a".into(), "ck-b".into()],
            vec![1.0, 1.0],
            1,
        );
        let chain = Arc::new(
            MockChain::new(1000)
                .with_metagraph(mg)
                .with_price(10, 1.0)
                .with_positions(10, "ck-x", vec![position(0.25, 4.0, 10.0)]),
        );

        let fetcher = LiquidityFetcher::new(&config());
        let outcome = fetcher.fetch(chain, Some(10)).await.unwrap();

        assert!(outcome.by_subnet.is_empty());
        assert!(outcome.snapshots.is_empty());
    }

    #[tokio::test]
    async fn missing_price_skips_subnet() {
        let chain = Arc::new(
            MockChain::new(1000)
                .with_metagraph(primary_metagraph())
                .with_positions(10, "ck-a", vec![position(0.25, 4.0, 100.0)]),
        );

        let fetcher = LiquidityFetcher::new(&config());
        let outcome = fetcher.fetch(chain, Some(10)).await.unwrap();
        assert!(outcome.by_subnet.is_empty());
    }
}
