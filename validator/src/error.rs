//! Validator error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error("Chain error: {0}")]
    Chain(#[from] oceans_chain::ChainError),

    #[error("Vote error: {0}")]
    Votes(#[from] oceans_votes::VoteError),

    #[error("Storage error: {0}")]
    Storage(#[from] oceans_storage::StorageError),

    #[error("Config error: {0}")]
    Config(#[from] oceans_core::ConfigError),

    #[error("Score update shape mismatch: {rewards} rewards vs {uids} uids")]
    ScoreShapeMismatch { rewards: usize, uids: usize },

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ValidatorError>;
