//! Plain-text rendering of the sweep state

use docsweep_core::{DeletePlan, OperationOutcome, Rejection, StatusLevel, SweepState};
use std::fmt::Write;

/// Numbered result rows with selection markers
pub fn results(state: &SweepState) -> String {
    if state.results().is_empty() {
        return "No results\n".to_string();
    }

    let mut out = String::new();
    for (index, row) in state.results().iter().enumerate() {
        let marker = if state.selection().contains(&row.id) {
            "[x]"
        } else {
            "[ ]"
        };
        let _ = write!(out, "{} {:>3}. {}  ({}, {})", marker, index + 1, row.label(), row.doc_type, row.id);
        if let Some(updated) = row.updated_at {
            let _ = write!(out, "  updated {}", updated.format("%Y-%m-%d"));
        }
        out.push('\n');
    }
    let _ = writeln!(
        out,
        "{} of {} selected",
        state.selection().len(),
        state.results().len()
    );
    out
}

/// Status line, prefixed by its level
pub fn status(state: &SweepState) -> Option<String> {
    state.status().map(|status| {
        let prefix = match status.level {
            StatusLevel::Info => "info",
            StatusLevel::Success => "ok",
            StatusLevel::Warning => "warning",
            StatusLevel::Error => "error",
        };
        format!("{}: {}", prefix, status.text)
    })
}

pub fn types(known: &[String]) -> String {
    if known.is_empty() {
        return "No document types available\n".to_string();
    }
    let mut out = String::new();
    for t in known {
        let _ = writeln!(out, "  {}", t);
    }
    out
}

/// Confirmation question for a pending delete run
pub fn confirm_prompt(plan: &DeletePlan) -> String {
    let count = plan.ids.len();
    let batches = plan.chunk_count();
    if plan.preview {
        format!(
            "Preview {} document(s) in {} batch(es) of up to {}? No writes will be issued. [y/N] ",
            count, batches, plan.batch_size
        )
    } else {
        format!(
            "Permanently delete {} document(s) in {} batch(es) of up to {}? [y/N] ",
            count, batches, plan.batch_size
        )
    }
}

pub fn outcome(outcome: &OperationOutcome, preview: bool) -> String {
    let mut out = String::new();
    if preview {
        let _ = writeln!(out, "{} document(s) would be deleted", outcome.deleted);
    } else {
        let _ = writeln!(out, "{} document(s) deleted", outcome.deleted);
    }
    for error in &outcome.errors {
        let _ = writeln!(out, "  {}", error);
    }
    out
}

pub fn rejection(rejection: Rejection) -> &'static str {
    match rejection {
        Rejection::Busy => "Another operation is still running",
        Rejection::BlankSearch => "Enter a search term or use a custom query",
        Rejection::TypeNotAllowed => "That document type is not in the allowed list",
        Rejection::NothingSelected => "Select at least one document to delete",
    }
}
