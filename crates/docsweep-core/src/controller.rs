//! Sweep controller
//!
//! Drives a [`SweepState`] against a [`DocumentStore`]:
//! - search: one read per request, results replace the previous list
//! - delete: the frozen selection is split into batches which are submitted
//!   one after another; a failed batch is recorded and the run continues
//!
//! The state lock is held only while a transition runs, never across a
//! store call. A search or delete attempted while another one is in flight
//! is refused with [`Rejection::Busy`] and has no effect.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    config::{AllowedTypes, SweepConfig},
    document::is_system_type,
    query::{SearchRequest, build_query},
    state::{DeletePlan, OperationOutcome, Rejection, SweepState},
    store::DocumentStore,
    Error,
};

/// Callbacks fired at the end of an operation
pub trait SweepListener: Send + Sync {
    /// A delete run finished, successfully or with batch errors
    fn on_complete(&self, _outcome: &OperationOutcome) {}

    /// A search, type discovery, or delete run failed as a whole
    fn on_error(&self, _error: &Error) {}
}

/// Listener that ignores every callback
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl SweepListener for NoopListener {}

/// How an invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation<T> {
    Completed(T),
    /// Refused before any store call was made
    Rejected(Rejection),
    /// Reported through the error listener and the status line
    Failed,
}

impl<T> Invocation<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Invocation::Completed(value) => Some(value),
            _ => None,
        }
    }
}

pub struct SweepController {
    store: Arc<dyn DocumentStore>,
    config: SweepConfig,
    listener: Arc<dyn SweepListener>,
    state: Mutex<SweepState>,
}

impl SweepController {
    pub fn new(store: Arc<dyn DocumentStore>, config: SweepConfig) -> Self {
        Self {
            store,
            config,
            listener: Arc::new(NoopListener),
            state: Mutex::new(SweepState::new()),
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn SweepListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Copy of the current state for rendering
    pub async fn snapshot(&self) -> SweepState {
        self.state.lock().await.clone()
    }

    /// Resolve the searchable types: the allow-list as given, or the
    /// store's own types (minus system types) when every type is allowed.
    pub async fn load_types(&self) -> Vec<String> {
        let list = match &self.config.allowed_types {
            AllowedTypes::Only(list) => list.clone(),
            AllowedTypes::All => match self.store.list_types().await {
                Ok(types) => {
                    let mut types: Vec<String> = types
                        .into_iter()
                        .filter(|t| !is_system_type(t))
                        .collect();
                    types.sort();
                    types.dedup();
                    debug!(count = types.len(), "Discovered document types");
                    types
                }
                Err(e) => {
                    warn!(error = %e, "Document type discovery failed");
                    self.state.lock().await.types_failed(&e);
                    self.listener.on_error(&Error::TypeDiscovery(e));
                    return Vec::new();
                }
            },
        };

        self.state.lock().await.types_loaded(list.clone());
        list
    }

    /// Run one search; returns the number of rows on success
    pub async fn search(&self, request: &SearchRequest) -> Invocation<usize> {
        let query = {
            let mut state = self.state.lock().await;
            if let Err(rejection) = state.search_started(request) {
                debug!(?rejection, "Search refused");
                return Invocation::Rejected(rejection);
            }
            build_query(request, self.config.result_cap, state.known_types())
        };

        debug!(query = %query, "Running search");
        match self.store.fetch(&query).await {
            Ok(results) => {
                let count = results.len();
                info!(count, "Search completed");
                self.state.lock().await.search_succeeded(results);
                Invocation::Completed(count)
            }
            Err(e) => {
                warn!(error = %e, "Search failed");
                self.state.lock().await.search_failed(&e);
                self.listener.on_error(&Error::SearchFailed(e));
                Invocation::Failed
            }
        }
    }

    pub async fn toggle(&self, id: &str) -> bool {
        self.state.lock().await.item_toggled(id)
    }

    pub async fn select_all(&self) -> usize {
        self.state.lock().await.select_all()
    }

    pub async fn clear_selection(&self) {
        self.state.lock().await.clear_selection();
    }

    /// What a delete run would do right now, for the confirmation step
    pub async fn pending_delete(&self) -> Option<DeletePlan> {
        let state = self.state.lock().await;
        if state.selection().is_empty() {
            return None;
        }
        Some(DeletePlan {
            ids: state.selection().ids().to_vec(),
            batch_size: self.config.batch_size,
            preview: self.config.preview_only,
        })
    }

    /// Delete the current selection batch by batch
    ///
    /// Dropping the returned future before it completes ends the run: the
    /// controller goes back to idle with an error status, and batches already
    /// committed stay deleted.
    pub async fn delete_selected(&self) -> Invocation<OperationOutcome> {
        let plan = {
            let mut state = self.state.lock().await;
            match state.delete_started(self.config.batch_size, self.config.preview_only) {
                Ok(plan) => plan,
                Err(rejection) => {
                    debug!(?rejection, "Delete refused");
                    return Invocation::Rejected(rejection);
                }
            }
        };

        info!(
            documents = plan.ids.len(),
            batches = plan.chunk_count(),
            preview = plan.preview,
            "Starting delete run"
        );

        let mut guard = RunGuard {
            state: &self.state,
            armed: true,
        };

        for chunk in plan.chunks() {
            let result = if plan.preview {
                debug!(batch = chunk.ordinal, size = chunk.len(), "Preview batch, no write issued");
                Ok(())
            } else {
                match self.store.delete_transaction(chunk.ids).await {
                    Ok(()) => {
                        debug!(batch = chunk.ordinal, size = chunk.len(), "Batch deleted");
                        Ok(())
                    }
                    Err(e) => {
                        warn!(batch = chunk.ordinal, error = %e, "Batch delete failed");
                        Err(e.to_string())
                    }
                }
            };

            let recorded = self.state.lock().await.chunk_completed(chunk.ordinal, result);
            if let Err(e) = recorded {
                let aborted = self.abort_run(e).await;
                guard.armed = false;
                return aborted;
            }
        }

        let finished = self
            .state
            .lock()
            .await
            .delete_finished(self.config.prune_policy);
        match finished {
            Ok(outcome) => {
                guard.armed = false;
                info!(
                    deleted = outcome.deleted,
                    failed_batches = outcome.errors.len(),
                    "Delete run finished"
                );
                self.listener.on_complete(&outcome);
                Invocation::Completed(outcome)
            }
            Err(e) => {
                let aborted = self.abort_run(e).await;
                guard.armed = false;
                aborted
            }
        }
    }

    async fn abort_run<T>(&self, error: Error) -> Invocation<T> {
        warn!(error = %error, "Delete run aborted");
        self.state.lock().await.delete_aborted(&error);
        self.listener.on_error(&error);
        Invocation::Failed
    }
}

/// Ends a delete run whose future was dropped before it finished
struct RunGuard<'a> {
    state: &'a Mutex<SweepState>,
    armed: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.state.try_lock() {
            Ok(mut state) => {
                warn!("Delete run dropped before all batches completed");
                state.delete_aborted(&Error::DeleteRunFailed(
                    "run dropped before all batches completed".to_string(),
                ));
            }
            Err(_) => warn!("Delete run dropped while the state was locked"),
        }
    }
}
