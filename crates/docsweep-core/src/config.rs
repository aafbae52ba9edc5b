//! Sweep configuration
//!
//! Supplied once when a controller is built and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use crate::{Error, Result};

pub const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(10).unwrap();
pub const DEFAULT_RESULT_CAP: NonZeroUsize = NonZeroUsize::new(100).unwrap();

/// Document types an operator may search
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "AllowedTypesRepr", into = "AllowedTypesRepr")]
pub enum AllowedTypes {
    /// Every type present in the store, discovered at load time
    #[default]
    All,
    /// Explicit allow-list
    Only(Vec<String>),
}

/// On-disk shape: either the keyword `all` or a list of type names
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AllowedTypesRepr {
    Keyword(String),
    List(Vec<String>),
}

impl TryFrom<AllowedTypesRepr> for AllowedTypes {
    type Error = Error;

    fn try_from(repr: AllowedTypesRepr) -> Result<Self> {
        match repr {
            AllowedTypesRepr::Keyword(k) if k.eq_ignore_ascii_case("all") => Ok(AllowedTypes::All),
            AllowedTypesRepr::Keyword(k) => Err(Error::Config(format!(
                "allowed_types must be \"all\" or a list of type names, got \"{}\"",
                k
            ))),
            AllowedTypesRepr::List(types) => AllowedTypes::only(types),
        }
    }
}

impl From<AllowedTypes> for AllowedTypesRepr {
    fn from(types: AllowedTypes) -> Self {
        match types {
            AllowedTypes::All => AllowedTypesRepr::Keyword("all".to_string()),
            AllowedTypes::Only(list) => AllowedTypesRepr::List(list),
        }
    }
}

impl AllowedTypes {
    /// Build an allow-list, trimming names and rejecting empty ones
    pub fn only<I, S>(types: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for t in types {
            let t: String = t.into();
            let t = t.trim();
            if t.is_empty() {
                return Err(Error::Config("allowed_types contains an empty name".to_string()));
            }
            if !list.iter().any(|existing| existing == t) {
                list.push(t.to_string());
            }
        }
        if list.is_empty() {
            return Err(Error::Config(
                "allowed_types list is empty; use \"all\" instead".to_string(),
            ));
        }
        Ok(AllowedTypes::Only(list))
    }
}

/// Which rows leave the result list after a live delete run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrunePolicy {
    /// Every selected id, including ids whose batch failed
    #[default]
    AllSelected,
    /// Only ids whose batch committed
    SucceededOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepConfig {
    #[serde(default)]
    pub allowed_types: AllowedTypes,

    /// Documents per delete transaction
    #[serde(default = "default_batch_size")]
    pub batch_size: NonZeroUsize,

    /// Count deletions without issuing any write
    #[serde(default)]
    pub preview_only: bool,

    /// Maximum rows a single search returns
    #[serde(default = "default_result_cap")]
    pub result_cap: NonZeroUsize,

    #[serde(default)]
    pub prune_policy: PrunePolicy,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            allowed_types: AllowedTypes::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            preview_only: false,
            result_cap: DEFAULT_RESULT_CAP,
            prune_policy: PrunePolicy::default(),
        }
    }
}

impl SweepConfig {
    pub fn with_allowed_types(mut self, allowed_types: AllowedTypes) -> Self {
        self.allowed_types = allowed_types;
        self
    }

    /// Set the batch size; zero is rejected
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self> {
        self.batch_size = NonZeroUsize::new(batch_size)
            .ok_or_else(|| Error::Config("batch_size must be at least 1".to_string()))?;
        Ok(self)
    }

    /// Set the result cap; zero is rejected
    pub fn with_result_cap(mut self, result_cap: usize) -> Result<Self> {
        self.result_cap = NonZeroUsize::new(result_cap)
            .ok_or_else(|| Error::Config("result_cap must be at least 1".to_string()))?;
        Ok(self)
    }

    pub fn with_preview_only(mut self, preview_only: bool) -> Self {
        self.preview_only = preview_only;
        self
    }

    pub fn with_prune_policy(mut self, prune_policy: PrunePolicy) -> Self {
        self.prune_policy = prune_policy;
        self
    }
}

fn default_batch_size() -> NonZeroUsize {
    DEFAULT_BATCH_SIZE
}

fn default_result_cap() -> NonZeroUsize {
    DEFAULT_RESULT_CAP
}
