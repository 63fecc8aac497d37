//! Oceans Validator Core Library
//!
//! Shared types, constants and configuration for the Oceans subnet
//! validator.

pub mod config;
pub mod error;
pub mod types;

pub use config::ValidatorConfig;
pub use error::{ConfigError, Result};
pub use types::{rao_to_tao, tao_to_rao, Coldkey, Hotkey, SubnetId, Uid};

/// Validator-wide constants.
pub mod constants {
    use super::SubnetId;

    /// The Oceans subnet the validator scores miners on.
    pub const DEFAULT_NETUID: SubnetId = 66;

    /// Rao per TAO (1 TAO = 10^9 rao).
    pub const RAO_PER_TAO: f64 = 1e9;

    /// EMA smoothing factor for the score table.
    pub const SCORE_EMA_ALPHA: f64 = 0.1;

    /// Subnets that currently carry user-supplied liquidity. Only these
    /// are ever queried or scored.
    pub const ACTIVE_SUBNETS: &[SubnetId] = &[10, 27, 36, 51, 73, 85, 87, 97, 102, 104, 106];

    /// Endpoint value that switches the vote client into offline mode.
    pub const OFFLINE_SENTINEL: &str = "TODO";

    /// Block height reported by deterministic offline votes.
    pub const TEMPORAL_BLOCK_HEIGHT: u64 = 6_073_385;

    /// Stake assigned to every offline voter.
    pub const TEMPORAL_STAKE: f64 = 1.0;

    /// Hotkeys of the deterministic offline voters.
    pub const TEMPORAL_VOTER_HOTKEYS: &[&str] = &[
        "5HdK1zyMbMoq1NM2sDL2Len9h2CsmBcVbrFthePccMN5R8jU",
        "5CdG8JDyzBPvXD1PM3ctdVmk3DbC52aTmYbQNezasVUXsn66",
        "5CsvRJXuR955WojnGMdok1hbhffZyB4N5ocrv82f3p5A2zVp",
        "5ExiuLNctkEUL5xMijujmAdhJGdzb5d6vxdzLdjpH3MLNovF",
    ];

    /// Error backoff inside the epoch loop before the regular sleep.
    pub const ERROR_BACKOFF_SECS: u64 = 5;
}

/// Crate version string.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
