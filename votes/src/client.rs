//! Typed client for the Oceans vote API
//!
//! When the configured endpoint is the offline sentinel the client
//! returns deterministic "temporal" votes so the rest of the pipeline
//! keeps working before a real endpoint exists.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use oceans_core::constants::{
    ACTIVE_SUBNETS, OFFLINE_SENTINEL, TEMPORAL_BLOCK_HEIGHT, TEMPORAL_STAKE,
    TEMPORAL_VOTER_HOTKEYS,
};
use tracing::{debug, info, warn};

use crate::error::{Result, VoteError};
use crate::schema::Vote;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MAX_TRIES: u32 = 5;
const BACKOFF_BASE_SECS: u64 = 1;
const BACKOFF_FACTOR: u64 = 2;

/// Wrapper around [`reqwest::Client`] with retries and deterministic
/// offline mode.
pub struct VoteApiClient {
    base_url: String,
    offline: bool,
    client: Option<reqwest::Client>,
}

impl VoteApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let offline = base_url.eq_ignore_ascii_case(OFFLINE_SENTINEL);

        let client = if offline {
            warn!("vote API client in offline mode, serving temporal votes");
            None
        } else {
            info!(endpoint = %base_url, "vote API client in online mode");
            Some(
                reqwest::Client::builder()
                    .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
                    .build()?,
            )
        };

        Ok(Self {
            base_url,
            offline,
            client,
        })
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Return the most recent vote vector per voter.
    ///
    /// Online mode GETs `/votes/latest`, retrying transport failures with
    /// exponential backoff. Invalid entries fail the whole payload; a
    /// half-validated vote set must never reach the reward calculator.
    pub async fn latest_votes(&self) -> Result<Vec<Vote>> {
        if self.offline {
            return Ok(Self::temporal_votes());
        }

        let client = self.client.as_ref().expect("online mode has a client");
        let url = format!("{}/votes/latest", self.base_url);

        let mut delay = Duration::from_secs(BACKOFF_BASE_SECS);
        let mut last_error = String::new();

        for attempt in 1..=MAX_TRIES {
            match Self::fetch_once(client, &url).await {
                Ok(votes) => {
                    debug!(count = votes.len(), "fetched votes from API");
                    return Ok(votes);
                }
                Err(VoteError::Http(e)) => {
                    warn!(attempt, error = %e, "vote API request failed");
                    last_error = e.to_string();
                    if attempt < MAX_TRIES {
                        tokio::time::sleep(delay).await;
                        delay *= BACKOFF_FACTOR as u32;
                    }
                }
                // Payload problems are not transient; do not retry.
                Err(e) => return Err(e),
            }
        }

        Err(VoteError::RetriesExhausted {
            tries: MAX_TRIES,
            last_error,
        })
    }

    async fn fetch_once(client: &reqwest::Client, url: &str) -> Result<Vec<Vote>> {
        let response = client.get(url).send().await?.error_for_status()?;
        let payload: serde_json::Value = response.json().await?;

        let items = payload
            .as_array()
            .ok_or_else(|| VoteError::InvalidPayload("expected a JSON list".to_string()))?;

        let mut votes = Vec::with_capacity(items.len());
        for item in items {
            let vote: Vote = serde_json::from_value(item.clone())
                .map_err(|e| VoteError::InvalidPayload(e.to_string()))?;
            vote.validate()?;
            votes.push(vote);
        }
        Ok(votes)
    }

    /// Deterministic votes used in offline mode: every temporal voter
    /// holds equal stake and spreads weight evenly over the active
    /// subnets.
    pub fn temporal_votes() -> Vec<Vote> {
        let weight = 1.0 / ACTIVE_SUBNETS.len() as f64;
        let weights: BTreeMap<_, _> = ACTIVE_SUBNETS.iter().map(|&s| (s, weight)).collect();
        let now = Utc::now();

        TEMPORAL_VOTER_HOTKEYS
            .iter()
            .map(|hk| Vote {
                voter_hotkey: hk.to_string(),
                block_height: TEMPORAL_BLOCK_HEIGHT,
                voter_stake: TEMPORAL_STAKE,
                weights: weights.clone(),
                timestamp: Some(now),
            })
            .collect()
    }
}
