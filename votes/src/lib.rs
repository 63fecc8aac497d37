//! Oceans Vote Ingestion
//!
//! Client for the off-chain α-Stake vote API plus the fetcher that
//! deduplicates fresh votes against the state cache.

pub mod client;
pub mod error;
pub mod fetcher;
pub mod schema;

pub use client::VoteApiClient;
pub use error::{Result, VoteError};
pub use fetcher::VoteFetcher;
pub use schema::Vote;
