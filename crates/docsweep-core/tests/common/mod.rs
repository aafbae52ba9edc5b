//! Common test utilities for controller tests

use async_trait::async_trait;
use docsweep_core::{
    DocumentStore, Error, OperationOutcome, SearchResult, StoreError, StoreResult, SweepListener,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// In-memory document store for testing
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct InMemoryDocumentStore {
    docs: Arc<Mutex<Vec<SearchResult>>>,
    types: Arc<Mutex<Vec<String>>>,
    queries: Arc<Mutex<Vec<String>>>,
    deletes: Arc<Mutex<Vec<Vec<String>>>>,
    fetch_error: Arc<Mutex<Option<StoreError>>>,
    types_error: Arc<Mutex<Option<StoreError>>>,
    failing_batches: Arc<Mutex<HashSet<usize>>>,
    delete_gate: Option<Arc<Notify>>,
}

#[allow(dead_code)]
impl InMemoryDocumentStore {
    pub fn with_posts(n: usize) -> Self {
        let store = Self::default();
        *store.docs.lock().unwrap() = (0..n)
            .map(|i| SearchResult::new(format!("post.{}", i), "post").with_title(format!("Post {}", i)))
            .collect();
        store
    }

    pub fn with_types(self, types: &[&str]) -> Self {
        *self.types.lock().unwrap() = types.iter().map(|t| t.to_string()).collect();
        self
    }

    /// Make the n-th delete call (1-based) fail
    pub fn fail_batch(self, call: usize) -> Self {
        self.failing_batches.lock().unwrap().insert(call);
        self
    }

    pub fn fail_fetch(&self, error: StoreError) {
        *self.fetch_error.lock().unwrap() = Some(error);
    }

    pub fn fail_types(self, error: StoreError) -> Self {
        *self.types_error.lock().unwrap() = Some(error);
        self
    }

    /// Block every delete call until the returned handle is notified
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.delete_gate = Some(gate.clone());
        (self, gate)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.docs.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn fetch(&self, query: &str) -> StoreResult<Vec<SearchResult>> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(e) = self.fetch_error.lock().unwrap().clone() {
            return Err(e);
        }
        Ok(self.docs.lock().unwrap().clone())
    }

    async fn delete_transaction(&self, ids: &[String]) -> StoreResult<()> {
        let call = {
            let mut deletes = self.deletes.lock().unwrap();
            deletes.push(ids.to_vec());
            deletes.len()
        };

        if let Some(gate) = &self.delete_gate {
            gate.notified().await;
        }

        if self.failing_batches.lock().unwrap().contains(&call) {
            return Err(StoreError::Rejected {
                status_code: 409,
                message: "Document is referenced".to_string(),
            });
        }

        self.docs
            .lock()
            .unwrap()
            .retain(|d| !ids.contains(&d.id));
        Ok(())
    }

    async fn list_types(&self) -> StoreResult<Vec<String>> {
        if let Some(e) = self.types_error.lock().unwrap().clone() {
            return Err(e);
        }
        Ok(self.types.lock().unwrap().clone())
    }
}

/// Listener that records every callback
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingListener {
    pub outcomes: Mutex<Vec<OperationOutcome>>,
    pub errors: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingListener {
    pub fn outcomes(&self) -> Vec<OperationOutcome> {
        self.outcomes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl SweepListener for RecordingListener {
    fn on_complete(&self, outcome: &OperationOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }

    fn on_error(&self, error: &Error) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}
