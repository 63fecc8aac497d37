//! Oceans Subnet Validator
//!
//! Scores miners by the liquidity they provide across the active subnets,
//! weighted by the community's α-Stake vote vector, and emits the result
//! as chain weights each epoch.

pub mod error;
pub mod liquidity;
pub mod node;
pub mod rewards;
pub mod scores;

pub use error::{Result, ValidatorError};
pub use liquidity::{LiquidityFetcher, LiquidityMap, LiquidityOutcome};
pub use node::{BurnValidator, ValidatorNode};
pub use rewards::RewardCalculator;
pub use scores::ScoreTable;
