//! Chain access error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Unexpected RPC response: {0}")]
    BadResponse(String),

    #[error("Metagraph for subnet {netuid} is empty")]
    EmptyMetagraph { netuid: u16 },

    #[error("Weight emission rejected: {0}")]
    WeightsRejected(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;
