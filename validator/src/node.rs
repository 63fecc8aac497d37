//! Validator node loop
//!
//! One iteration: sync the metagraph, fetch votes and liquidity, compute
//! rewards, fold them into the score table, emit weights. Iterations are
//! separated by a randomised sleep so validators don't thunder in step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use oceans_chain::{process_weights, quantise_for_emit, ChainClient, Metagraph};
use oceans_core::constants::ERROR_BACKOFF_SECS;
use oceans_core::{Uid, ValidatorConfig};
use oceans_storage::StateCache;
use oceans_votes::{VoteApiClient, VoteFetcher};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::liquidity::LiquidityFetcher;
use crate::rewards::RewardCalculator;
use crate::scores::ScoreTable;

pub struct ValidatorNode {
    config: ValidatorConfig,
    chain: Arc<dyn ChainClient>,
    cache: StateCache,
    vote_fetcher: VoteFetcher,
    liquidity_fetcher: LiquidityFetcher,
    metagraph: Metagraph,
    scores: ScoreTable,
    shutdown: Arc<AtomicBool>,
}

impl ValidatorNode {
    /// Bring up the node: open the cache, restore scores, sync the
    /// metagraph once.
    pub async fn new(config: ValidatorConfig, chain: Arc<dyn ChainClient>) -> Result<Self> {
        config.validate()?;

        let cache = StateCache::open(&config.data_dir)?;
        let metagraph = chain.metagraph(config.netuid).await?;
        let scores = ScoreTable::from_state(cache.load_state()?, &metagraph);
        let vote_fetcher = VoteFetcher::new(VoteApiClient::new(config.vote_api_endpoint.clone())?);
        let liquidity_fetcher = LiquidityFetcher::new(&config);

        info!(
            netuid = config.netuid,
            block = metagraph.block,
            miners = metagraph.len(),
            step = scores.step(),
            "validator node initialised"
        );

        Ok(Self {
            config,
            chain,
            cache,
            vote_fetcher,
            liquidity_fetcher,
            metagraph,
            scores,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag checked between iterations; flip to stop the loop.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn metagraph(&self) -> &Metagraph {
        &self.metagraph
    }

    pub fn scores(&self) -> &ScoreTable {
        &self.scores
    }

    /// Refresh the metagraph and keep the score table aligned with it.
    pub async fn sync(&mut self) -> Result<()> {
        self.metagraph = self.chain.metagraph(self.config.netuid).await?;
        self.scores.resync(&self.metagraph);
        Ok(())
    }

    /// One epoch of business logic.
    pub async fn forward(&mut self) -> Result<()> {
        info!(step = self.scores.step(), "fetching latest votes and liquidity");
        let votes = self.vote_fetcher.fetch_and_store(&mut self.cache).await?;
        let outcome = self
            .liquidity_fetcher
            .fetch(self.chain.clone(), None)
            .await?;
        self.cache.persist_liquidity(outcome.snapshots)?;

        let rewards = RewardCalculator::compute(&self.metagraph, &votes, &outcome.by_subnet);
        if rewards.is_empty() {
            warn!("no rewards computed, skipping score update");
            return Ok(());
        }

        let (uids, values): (Vec<Uid>, Vec<f64>) = rewards.into_iter().unzip();
        self.scores.update(&uids, &values)?;
        self.cache.save_state(&self.scores.to_state())?;

        self.emit_weights().await
    }

    /// Emit the current score table as chain weights.
    pub async fn emit_weights(&self) -> Result<()> {
        let uids = &self.metagraph.uids;
        let scores = &self.scores.scores()[..self.metagraph.len()];

        let (uids, weights) = process_weights(uids, scores, self.config.max_weight_limit);
        let (uids, quantised) = quantise_for_emit(&uids, &weights);
        if uids.is_empty() {
            warn!("nothing to emit, all weights zero");
            return Ok(());
        }

        self.chain
            .set_weights(
                self.config.netuid,
                &uids,
                &quantised,
                self.metagraph.weights_version,
            )
            .await?;
        info!(miners = uids.len(), "weights emitted on chain");
        Ok(())
    }

    /// Main loop: sync, forward, sleep, repeat until shut down.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            block = self.metagraph.block,
            netuid = self.config.netuid,
            "validator starting"
        );

        while !self.shutdown.load(Ordering::Relaxed) {
            let iteration = async {
                self.sync().await?;
                self.forward().await
            };

            match iteration.await {
                Ok(()) => {}
                Err(e) => {
                    error!(error = %e, "forward failed");
                    tokio::time::sleep(Duration::from_secs(ERROR_BACKOFF_SECS)).await;
                }
            }

            self.scores.bump_step();
            self.cache.save_state(&self.scores.to_state())?;

            let sleep_secs = {
                let mut rng = rand::rng();
                rand::Rng::random_range(
                    &mut rng,
                    self.config.sleep_min_secs..=self.config.sleep_max_secs,
                )
            };
            info!(
                mins = sleep_secs / 60,
                secs = sleep_secs % 60,
                "sleeping before next iteration"
            );
            tokio::time::sleep(Duration::from_secs(sleep_secs)).await;
        }

        info!("validator stopped");
        Ok(())
    }
}

/// Minimal validator that assigns full weight to UID 0 every iteration.
pub struct BurnValidator {
    config: ValidatorConfig,
    chain: Arc<dyn ChainClient>,
    cache: StateCache,
    metagraph: Metagraph,
    scores: ScoreTable,
    shutdown: Arc<AtomicBool>,
}

impl BurnValidator {
    /// Fixed pause between burn iterations.
    const SLEEP_SECS: u64 = 300;

    pub async fn new(config: ValidatorConfig, chain: Arc<dyn ChainClient>) -> Result<Self> {
        config.validate()?;
        let cache = StateCache::open(&config.data_dir)?;
        let metagraph = chain.metagraph(config.netuid).await?;
        let scores = ScoreTable::from_state(cache.load_state()?, &metagraph);
        Ok(Self {
            config,
            chain,
            cache,
            metagraph,
            scores,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Zero every miner except UID 0, which receives all emission.
    pub async fn forward(&mut self) -> Result<()> {
        self.metagraph = self.chain.metagraph(self.config.netuid).await?;
        self.scores.resync(&self.metagraph);

        let uids: Vec<Uid> = self.metagraph.uids.clone();
        let rewards: Vec<f64> = uids.iter().map(|&u| if u == 0 { 1.0 } else { 0.0 }).collect();
        self.scores.update(&uids, &rewards)?;
        self.cache.save_state(&self.scores.to_state())?;

        let (uids, weights) = process_weights(
            &uids,
            &self.scores.scores()[..self.metagraph.len()],
            self.config.max_weight_limit,
        );
        let (uids, quantised) = quantise_for_emit(&uids, &weights);
        if uids.is_empty() {
            warn!("burn vector empty, nothing to emit");
            return Ok(());
        }
        self.chain
            .set_weights(
                self.config.netuid,
                &uids,
                &quantised,
                self.metagraph.weights_version,
            )
            .await?;
        info!("weights broadcast, full weight on UID 0");
        Ok(())
    }

    pub async fn run(&mut self) -> Result<()> {
        while !self.shutdown.load(Ordering::Relaxed) {
            if let Err(e) = self.forward().await {
                error!(error = %e, "burn forward failed");
            }
            self.scores.bump_step();
            tokio::time::sleep(Duration::from_secs(Self::SLEEP_SECS)).await;
        }
        Ok(())
    }
}
