//! Oceans Validator Chain Access
//!
//! Everything the validator needs from the subtensor chain: the metagraph
//! of the primary subnet, per-coldkey liquidity positions on the active
//! subnets, subnet prices, and weight emission.

pub mod client;
pub mod error;
pub mod metagraph;
pub mod position;
pub mod price;
pub mod weights;

pub use client::{ChainClient, MockChain, RecordedEmission, SubtensorRpc};
pub use error::{ChainError, Result};
pub use metagraph::Metagraph;
pub use position::{LiquidityPosition, LiquiditySubnet, TokenAmounts};
pub use price::sqrt_price_to_price;
pub use weights::{process_weights, quantise_for_emit};
