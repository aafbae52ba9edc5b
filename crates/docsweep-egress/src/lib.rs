//! Docsweep Egress Connectors
//!
//! This crate provides the connector to the remote document store:
//! - Shared HTTP client construction
//! - HTTP query and mutation endpoints behind the `DocumentStore` trait

pub mod client;
pub mod store;

pub use store::{HttpDocumentStore, HttpStoreConfig};

use docsweep_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EgressError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Store error ({status_code}): {message}")]
    StoreError { status_code: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

pub type Result<T> = std::result::Result<T, EgressError>;

impl From<EgressError> for StoreError {
    fn from(err: EgressError) -> Self {
        match err {
            EgressError::HttpError(e) => StoreError::Transport(e.to_string()),
            EgressError::ConfigError(msg) => StoreError::Transport(msg),
            EgressError::StoreError {
                status_code,
                message,
            } => StoreError::Rejected {
                status_code,
                message,
            },
            EgressError::ParseError(msg) => StoreError::InvalidResponse(msg),
        }
    }
}
