//! Sweep state and its transitions
//!
//! Every change the front end can observe goes through one of the transition
//! methods on [`SweepState`]. None of them perform I/O, so each can be driven
//! directly from tests without a store or a renderer.
//!
//! Phases:
//! - Idle: accepts searches, selection changes and delete runs
//! - Searching: a read is in flight; new searches and deletes are refused
//! - Deleting: batches are being submitted; the selection is frozen

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::num::NonZeroUsize;

use crate::{
    config::PrunePolicy,
    document::SearchResult,
    error::StoreError,
    partition::{Chunk, chunk_count, partition},
    query::{SearchRequest, TypeChoice},
    Error, Result,
};

/// Ordered set of selected ids
///
/// Iteration order is the order ids were added, which is also the order
/// they are partitioned into batches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Flip membership; returns whether `id` is selected afterwards
    fn toggle(&mut self, id: &str) -> bool {
        if let Some(pos) = self.ids.iter().position(|s| s == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id.to_string());
            true
        }
    }

    fn clear(&mut self) {
        self.ids.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Searching,
    Deleting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Status line shown to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub level: StatusLevel,
    pub text: String,
}

/// Why a transition refused to start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Another search or delete run is still in flight
    Busy,
    /// Blank term with custom mode off
    BlankSearch,
    /// Type outside the known type list
    TypeNotAllowed,
    /// Delete requested with an empty selection
    NothingSelected,
}

/// Result of one delete run, handed to the completion listener
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    pub deleted: usize,
    pub errors: Vec<String>,
}

/// Frozen copy of the selection taken when a delete run starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePlan {
    pub ids: Vec<String>,
    pub batch_size: NonZeroUsize,
    pub preview: bool,
}

impl DeletePlan {
    pub fn chunks(&self) -> Vec<Chunk<'_>> {
        partition(&self.ids, self.batch_size)
    }

    pub fn chunk_count(&self) -> usize {
        chunk_count(self.ids.len(), self.batch_size)
    }
}

#[derive(Debug, Clone)]
struct DeleteRun {
    plan: DeletePlan,
    completed_chunks: usize,
    deleted: usize,
    errors: Vec<String>,
    succeeded: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SweepState {
    results: Vec<SearchResult>,
    selection: Selection,
    known_types: Vec<String>,
    phase: Phase,
    status: Option<Status>,
    run: Option<DeleteRun>,
}

impl SweepState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn known_types(&self) -> &[String] {
        &self.known_types
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// `(completed, total)` batches of the run in progress
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.run
            .as_ref()
            .map(|run| (run.completed_chunks, run.plan.chunk_count()))
    }

    fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        self.status = Some(Status {
            level,
            text: text.into(),
        });
    }

    pub fn types_loaded(&mut self, types: Vec<String>) {
        self.known_types = types;
    }

    pub fn types_failed(&mut self, error: &StoreError) {
        self.known_types.clear();
        self.set_status(
            StatusLevel::Error,
            format!("Could not load document types: {}", error),
        );
    }

    pub fn search_started(&mut self, request: &SearchRequest) -> std::result::Result<(), Rejection> {
        if self.is_busy() {
            return Err(Rejection::Busy);
        }
        if !request.is_searchable() {
            self.set_status(
                StatusLevel::Warning,
                "Enter a search term or switch to a custom query",
            );
            return Err(Rejection::BlankSearch);
        }
        if let (None, TypeChoice::Specific(t)) = (request.custom_text(), &request.doc_type) {
            if !self.known_types.is_empty() && !self.known_types.contains(t) {
                self.set_status(
                    StatusLevel::Warning,
                    format!("Type \"{}\" is not one of the searchable types", t),
                );
                return Err(Rejection::TypeNotAllowed);
            }
        }

        self.phase = Phase::Searching;
        self.set_status(StatusLevel::Info, "Searching...");
        Ok(())
    }

    pub fn search_succeeded(&mut self, results: Vec<SearchResult>) {
        self.phase = Phase::Idle;
        self.selection.clear();
        self.results = results;

        match self.results.len() {
            0 => self.set_status(StatusLevel::Info, "No documents matched"),
            1 => self.set_status(StatusLevel::Success, "Found 1 document"),
            n => self.set_status(StatusLevel::Success, format!("Found {} documents", n)),
        }
    }

    pub fn search_failed(&mut self, error: &StoreError) {
        self.phase = Phase::Idle;
        self.set_status(StatusLevel::Error, format!("Search failed: {}", error));
    }

    /// Toggle one row; ids outside the current results are ignored
    pub fn item_toggled(&mut self, id: &str) -> bool {
        if self.phase == Phase::Deleting || !self.results.iter().any(|r| r.id == id) {
            return false;
        }
        self.selection.toggle(id);
        true
    }

    pub fn select_all(&mut self) -> usize {
        if self.phase == Phase::Deleting {
            return self.selection.len();
        }
        self.selection.ids = self.results.iter().map(|r| r.id.clone()).collect();
        self.selection.len()
    }

    pub fn clear_selection(&mut self) {
        if self.phase != Phase::Deleting {
            self.selection.clear();
        }
    }

    pub fn delete_started(
        &mut self,
        batch_size: NonZeroUsize,
        preview: bool,
    ) -> std::result::Result<DeletePlan, Rejection> {
        if self.is_busy() {
            return Err(Rejection::Busy);
        }
        if self.selection.is_empty() {
            self.set_status(StatusLevel::Warning, "Select at least one document to delete");
            return Err(Rejection::NothingSelected);
        }

        let plan = DeletePlan {
            ids: self.selection.ids.clone(),
            batch_size,
            preview,
        };
        let (count, batches) = (plan.ids.len(), plan.chunk_count());

        if preview {
            self.set_status(
                StatusLevel::Info,
                format!(
                    "Preview: {} in {}, nothing will be deleted",
                    documents(count),
                    batches_label(batches)
                ),
            );
        } else {
            self.set_status(
                StatusLevel::Info,
                format!("Deleting {} in {}...", documents(count), batches_label(batches)),
            );
        }

        self.phase = Phase::Deleting;
        self.run = Some(DeleteRun {
            plan: plan.clone(),
            completed_chunks: 0,
            deleted: 0,
            errors: Vec::new(),
            succeeded: Vec::new(),
        });
        Ok(plan)
    }

    /// Record the result of batch `ordinal` (1-based).
    ///
    /// Batches must complete in order; anything else is a run-level failure.
    pub fn chunk_completed(
        &mut self,
        ordinal: usize,
        result: std::result::Result<(), String>,
    ) -> Result<()> {
        let run = match (self.phase, self.run.as_mut()) {
            (Phase::Deleting, Some(run)) => run,
            _ => {
                return Err(Error::DeleteRunFailed(format!(
                    "batch {} completed outside a delete run",
                    ordinal
                )));
            }
        };

        if ordinal != run.completed_chunks + 1 {
            return Err(Error::DeleteRunFailed(format!(
                "batch {} completed out of order, expected batch {}",
                ordinal,
                run.completed_chunks + 1
            )));
        }

        let ids = run
            .plan
            .ids
            .chunks(run.plan.batch_size.get())
            .nth(ordinal - 1)
            .ok_or_else(|| {
                Error::DeleteRunFailed(format!(
                    "batch {} does not exist in a run of {}",
                    ordinal,
                    run.plan.chunk_count()
                ))
            })?;

        match result {
            Ok(()) => {
                run.deleted += ids.len();
                run.succeeded.extend(ids.iter().cloned());
            }
            Err(reason) => run
                .errors
                .push(format!("Batch {} failed: {}", ordinal, reason)),
        }
        run.completed_chunks += 1;

        let total = run.plan.chunk_count();
        let text = if run.plan.preview {
            format!(
                "Preview: batch {}/{} would delete {}",
                ordinal,
                total,
                documents(ids.len())
            )
        } else {
            format!(
                "Deleted {} of {} (batch {}/{})",
                run.deleted,
                documents(run.plan.ids.len()),
                ordinal,
                total
            )
        };
        self.set_status(StatusLevel::Info, text);
        Ok(())
    }

    /// Close the run: prune results, clear the selection, report the outcome
    pub fn delete_finished(&mut self, policy: PrunePolicy) -> Result<OperationOutcome> {
        let run = match (self.phase, self.run.as_ref()) {
            (Phase::Deleting, Some(run)) => run,
            _ => {
                return Err(Error::DeleteRunFailed(
                    "no delete run in progress".to_string(),
                ));
            }
        };
        if run.completed_chunks != run.plan.chunk_count() {
            return Err(Error::DeleteRunFailed(format!(
                "run finished after {} of {} batches",
                run.completed_chunks,
                run.plan.chunk_count()
            )));
        }

        let Some(run) = self.run.take() else {
            return Err(Error::DeleteRunFailed("no delete run in progress".to_string()));
        };

        let removed: HashSet<&str> = match policy {
            PrunePolicy::AllSelected => run.plan.ids.iter().map(String::as_str).collect(),
            PrunePolicy::SucceededOnly => run.succeeded.iter().map(String::as_str).collect(),
        };
        self.results.retain(|r| !removed.contains(r.id.as_str()));
        self.selection.clear();
        self.phase = Phase::Idle;

        let outcome = OperationOutcome {
            deleted: run.deleted,
            errors: run.errors,
        };

        if run.plan.preview {
            self.set_status(
                StatusLevel::Success,
                format!("Preview complete: {} would be deleted", documents(outcome.deleted)),
            );
        } else if outcome.errors.is_empty() {
            self.set_status(
                StatusLevel::Success,
                format!("Deleted {}", documents(outcome.deleted)),
            );
        } else {
            self.set_status(
                StatusLevel::Error,
                format!(
                    "Deleted {}; {} failed",
                    documents(outcome.deleted),
                    batches_label(outcome.errors.len())
                ),
            );
        }

        Ok(outcome)
    }

    /// Abandon the run after a run-level failure
    pub fn delete_aborted(&mut self, error: &Error) {
        self.run = None;
        self.phase = Phase::Idle;
        self.set_status(StatusLevel::Error, error.to_string());
    }
}

fn documents(n: usize) -> String {
    if n == 1 {
        "1 document".to_string()
    } else {
        format!("{} documents", n)
    }
}

fn batches_label(n: usize) -> String {
    if n == 1 {
        "1 batch".to_string()
    } else {
        format!("{} batches", n)
    }
}
