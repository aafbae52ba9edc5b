//! Docsweep Core Types and Traits
//!
//! This crate provides everything needed to search a document store and
//! delete the matches in batches:
//! - Filter expression builder
//! - Batch partitioning
//! - Sweep state with pure transitions
//! - Document store trait and the controller that drives it

pub mod config;
pub mod controller;
pub mod document;
pub mod error;
pub mod partition;
pub mod query;
pub mod state;
pub mod store;

pub use config::{AllowedTypes, PrunePolicy, SweepConfig};
pub use controller::{Invocation, NoopListener, SweepController, SweepListener};
pub use document::SearchResult;
pub use error::{Error, Result, StoreError, StoreResult};
pub use query::{SearchRequest, TypeChoice};
pub use state::{DeletePlan, OperationOutcome, Phase, Rejection, Selection, Status, StatusLevel, SweepState};
pub use store::DocumentStore;
