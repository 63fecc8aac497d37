//! Vote ingestion error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Vote API exhausted {tries} tries: {last_error}")]
    RetriesExhausted { tries: u32, last_error: String },

    #[error("Invalid vote payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid vote from {voter}: {message}")]
    InvalidVote { voter: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] oceans_storage::StorageError),
}

pub type Result<T> = std::result::Result<T, VoteError>;
