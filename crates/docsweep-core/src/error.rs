//! Error types for Docsweep Core

use thiserror::Error;

/// Failure reported by a [`DocumentStore`](crate::store::DocumentStore) call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Store rejected request ({status_code}): {message}")]
    Rejected { status_code: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Input rejected: {0}")]
    InputRejected(String),

    #[error("Search failed: {0}")]
    SearchFailed(#[source] StoreError),

    #[error("Type discovery failed: {0}")]
    TypeDiscovery(#[source] StoreError),

    #[error("Delete run failed: {0}")]
    DeleteRunFailed(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;
