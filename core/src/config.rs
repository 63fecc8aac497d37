//! Validator configuration (validator.toml) support
//!
//! Configuration is read from a TOML file, with individual fields
//! overridable through environment variables so deployments can tweak a
//! single knob without editing the file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_NETUID, OFFLINE_SENTINEL};
use crate::error::{ConfigError, Result};
use crate::types::SubnetId;

fn default_network() -> String {
    "finney".to_string()
}

fn default_subtensor_rpc() -> String {
    "wss://finney.subtensor.network".to_string()
}

fn default_netuid() -> SubnetId {
    DEFAULT_NETUID
}

fn default_vote_api_endpoint() -> String {
    OFFLINE_SENTINEL.to_string()
}

fn default_max_concurrency() -> usize {
    5
}

fn default_sleep_min_secs() -> u64 {
    10 * 60
}

fn default_sleep_max_secs() -> u64 {
    20 * 60
}

fn default_data_dir() -> String {
    "data/validator".to_string()
}

fn default_wallet_name() -> String {
    "default".to_string()
}

fn default_count_only_in_range() -> bool {
    true
}

fn default_max_weight_limit() -> f64 {
    1.0
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Runtime configuration for the Oceans validator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidatorConfig {
    /// Bittensor network name ("finney", "test", ...).
    #[serde(default = "default_network")]
    pub network: String,

    /// Subtensor RPC endpoint.
    #[serde(default = "default_subtensor_rpc")]
    pub subtensor_rpc: String,

    /// The validator's own subnet.
    #[serde(default = "default_netuid")]
    pub netuid: SubnetId,

    /// Vote API base URL. The literal "TODO" selects offline mode.
    #[serde(default = "default_vote_api_endpoint")]
    pub vote_api_endpoint: String,

    /// Concurrent chain queries per subnet.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Lower bound of the inter-iteration sleep.
    #[serde(default = "default_sleep_min_secs")]
    pub sleep_min_secs: u64,

    /// Upper bound of the inter-iteration sleep.
    #[serde(default = "default_sleep_max_secs")]
    pub sleep_max_secs: u64,

    /// Directory for state snapshots.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Wallet name used for signing weight extrinsics.
    #[serde(default = "default_wallet_name")]
    pub wallet_name: String,

    /// Only count liquidity positions whose band contains the current price.
    #[serde(default = "default_count_only_in_range")]
    pub count_only_in_range: bool,

    /// Minimum band width as a fraction of the current price. Zero disables
    /// the filter.
    #[serde(default)]
    pub min_relative_width: f64,

    /// Per-miner cap on emitted weight, as a fraction of the total.
    /// 1.0 disables the cap.
    #[serde(default = "default_max_weight_limit")]
    pub max_weight_limit: f64,

    /// Log level filter ("error" / "warn" / "info" / "debug" / "trace").
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        // Serde defaults double as the canonical defaults.
        toml::from_str("").expect("empty config must deserialize")
    }
}

impl ValidatorConfig {
    /// Load configuration from a TOML file, apply environment overrides and
    /// validate the result.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: ValidatorConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Build a config purely from defaults and environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment variables onto the current values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("BITTENSOR_NETWORK") {
            self.network = v;
        }
        if let Ok(v) = std::env::var("SUBTENSOR_RPC") {
            self.subtensor_rpc = v;
        }
        if let Ok(v) = std::env::var("NETUID") {
            if let Ok(n) = v.parse() {
                self.netuid = n;
            }
        }
        if let Ok(v) = std::env::var("VOTE_API_ENDPOINT") {
            self.vote_api_endpoint = v;
        }
        if let Ok(v) = std::env::var("DATA_DIR") {
            self.data_dir = v;
        }
        if let Ok(v) = std::env::var("WALLET_NAME") {
            self.wallet_name = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            self.log_level = v;
        }
    }

    /// Check invariants that would otherwise surface deep inside the loop.
    pub fn validate(&self) -> Result<()> {
        if self.netuid == 0 {
            return Err(ConfigError::InvalidValue {
                field: "netuid".to_string(),
                message: "subnet 0 cannot be validated".to_string(),
            });
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_concurrency".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.sleep_min_secs > self.sleep_max_secs {
            return Err(ConfigError::InvalidValue {
                field: "sleep_min_secs".to_string(),
                message: format!(
                    "sleep range inverted: {} > {}",
                    self.sleep_min_secs, self.sleep_max_secs
                ),
            });
        }
        if !self.min_relative_width.is_finite() || self.min_relative_width < 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "min_relative_width".to_string(),
                message: format!("must be a non-negative fraction, got {}", self.min_relative_width),
            });
        }
        if !self.max_weight_limit.is_finite()
            || self.max_weight_limit <= 0.0
            || self.max_weight_limit > 1.0
        {
            return Err(ConfigError::InvalidValue {
                field: "max_weight_limit".to_string(),
                message: format!("must be in (0, 1], got {}", self.max_weight_limit),
            });
        }
        let level = self.log_level.to_ascii_lowercase();
        if !["error", "warn", "info", "debug", "trace"].contains(&level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "log_level".to_string(),
                message: format!("unknown level {:?}", self.log_level),
            });
        }
        Ok(())
    }

    /// Whether the vote client should run in offline mode.
    pub fn vote_api_offline(&self) -> bool {
        self.vote_api_endpoint.eq_ignore_ascii_case(OFFLINE_SENTINEL)
    }

    /// Whether this deployment points at the production network.
    pub fn is_prod(&self) -> bool {
        matches!(self.network.to_ascii_lowercase().as_str(), "finney" | "mainnet" | "main")
    }
}
