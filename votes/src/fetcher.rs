//! Vote fetcher
//!
//! Pulls the latest votes from the API, drops entries already cached for
//! the same (block height, voter) pair, and persists the rest.

use oceans_storage::{StateCache, VoteSnapshot};
use tracing::info;

use crate::client::VoteApiClient;
use crate::error::Result;
use crate::schema::Vote;

/// Create once, call [`fetch_and_store`](Self::fetch_and_store) each epoch.
pub struct VoteFetcher {
    client: VoteApiClient,
}

impl VoteFetcher {
    pub fn new(client: VoteApiClient) -> Self {
        Self { client }
    }

    /// Fetch the latest votes, persist new snapshots, and return the full
    /// fresh vote set for scoring.
    pub async fn fetch_and_store(&self, cache: &mut StateCache) -> Result<Vec<Vote>> {
        let fresh = self.client.latest_votes().await?;

        let new_snapshots: Vec<VoteSnapshot> = fresh
            .iter()
            .filter(|v| cache.votes_changed(v.block_height, &v.voter_hotkey))
            .map(|v| {
                VoteSnapshot::new(
                    v.block_height,
                    v.voter_hotkey.clone(),
                    v.voter_stake,
                    v.weights.clone(),
                )
            })
            .collect();

        let stored = new_snapshots.len();
        cache.persist_votes(new_snapshots)?;
        info!(fetched = fresh.len(), stored, "vote fetch complete");

        Ok(fresh)
    }
}
