//! Vote API schema

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use oceans_core::{Hotkey, SubnetId};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VoteError};

const MIN_HOTKEY_LEN: usize = 10;
const MAX_HOTKEY_LEN: usize = 64;

/// One α-Stake vote entry as served by `/votes/latest`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    pub voter_hotkey: Hotkey,
    pub block_height: u64,
    pub voter_stake: f64,
    /// Mapping subnet_id -> weight. Normalised later by the reward
    /// calculator; only shape is validated here.
    pub weights: BTreeMap<SubnetId, f64>,
    /// Optional, set by the API.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Vote {
    /// Basic sanity checks applied to every entry the API returns.
    pub fn validate(&self) -> Result<()> {
        let hotkey = self.voter_hotkey.trim();
        if hotkey.len() < MIN_HOTKEY_LEN || hotkey.len() > MAX_HOTKEY_LEN {
            return Err(self.invalid(format!("hotkey length {} out of range", hotkey.len())));
        }
        if self.weights.is_empty() {
            return Err(self.invalid("weights must not be empty".to_string()));
        }
        if let Some((sid, w)) = self
            .weights
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(self.invalid(format!("weight for subnet {sid} is invalid: {w}")));
        }
        if !self.voter_stake.is_finite() || self.voter_stake < 0.0 {
            return Err(self.invalid(format!("stake is invalid: {}", self.voter_stake)));
        }
        Ok(())
    }

    fn invalid(&self, message: String) -> VoteError {
        VoteError::InvalidVote {
            voter: self.voter_hotkey.clone(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote() -> Vote {
        let mut weights = BTreeMap::new();
        weights.insert(10, 0.5);
        weights.insert(27, 0.5);
        Vote {
            voter_hotkey: "5HdK1zyMbMoq1NM2sDL2Len9h2CsmBcVbrFthePccMN5R8jU".to_string(),
            block_height: 6_073_385,
            voter_stake: 1.0,
            weights,
            timestamp: None,
        }
    }

    #[test]
    fn valid_vote_passes() {
        assert!(vote().validate().is_ok());
    }

    #[test]
    fn short_hotkey_rejected() {
        let mut v = vote();
        v.voter_hotkey = "short".to_string();
        assert!(v.validate().is_err());
    }

    #[test]
    fn empty_weights_rejected() {
        let mut v = vote();
        v.weights.clear();
        assert!(v.validate().is_err());
    }

    #[test]
    fn negative_weight_rejected() {
        let mut v = vote();
        v.weights.insert(36, -0.1);
        assert!(v.validate().is_err());
    }

    #[test]
    fn negative_stake_rejected() {
        let mut v = vote();
        v.voter_stake = -1.0;
        assert!(v.validate().is_err());
    }

    #[test]
    fn deserializes_from_api_json() {
        let json = r#"{
            "voter_hotkey": "5HdK1zyMbMoq1NM2sDL2Len9h2CsmBcVbrFthePccMN5R8jU",
            "block_height": 6073385,
            "voter_stake": 2.5,
            "weights": {"10": 0.6, "27": 0.4}
        }"#;
        let v: Vote = serde_json::from_str(json).unwrap();
        assert!(v.validate().is_ok());
        assert_eq!(v.weights[&10], 0.6);
        assert!(v.timestamp.is_none());
    }
}
