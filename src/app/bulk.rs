//! Bulk disable workflow.
//!
//! State machine: Idle → Confirming → Running → Summarizing → Idle.
//! The id set is captured once, on entry to Confirming, and is never
//! re-read afterwards; a concurrent view refresh cannot change what a
//! confirmed run operates on. Mutations execute strictly one at a time,
//! which bounds remote load and keeps the "N of M" progress counter
//! accurate. There is no way to cancel a batch once it is running.

use crate::api::DirectoryClient;

/// Outcome of one attempted mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure(String),
}

/// One entry in the per-run result sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptResult {
    pub user_id: String,
    pub outcome: AttemptOutcome,
}

impl AttemptResult {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Failure(_))
    }

    pub fn failure_detail(&self) -> Option<&str> {
        match &self.outcome {
            AttemptOutcome::Failure(msg) => Some(msg),
            AttemptOutcome::Success => None,
        }
    }
}

/// Incremental progress emitted after each attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
}

/// Ordered outcomes of one bulk run. Discarded once the summary closes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub attempts: Vec<AttemptResult>,
}

impl BulkReport {
    pub fn total(&self) -> usize {
        self.attempts.len()
    }

    pub fn success_count(&self) -> usize {
        self.attempts.iter().filter(|a| !a.is_failure()).count()
    }

    pub fn failures(&self) -> Vec<&AttemptResult> {
        self.attempts.iter().filter(|a| a.is_failure()).collect()
    }
}

/// Workflow state, owned by the application and rendered by the UI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BulkState {
    Idle,
    /// Confirmation surface is up; `ids` is the captured selection.
    Confirming { ids: Vec<String> },
    Running { done: usize, total: usize },
    Summarizing { report: BulkReport },
}

impl BulkState {
    pub fn is_idle(&self) -> bool {
        matches!(self, BulkState::Idle)
    }
}

/// Enter the confirmation step for the captured selection.
///
/// Returns `None` for an empty selection: no transition happens and the
/// operator is told there is nothing to do.
pub fn begin(selected_ids: Vec<String>) -> Option<BulkState> {
    if selected_ids.is_empty() {
        None
    } else {
        Some(BulkState::Confirming { ids: selected_ids })
    }
}

/// Execute the confirmed batch: disable each id in order, one mutation at
/// a time, recording a per-item outcome and emitting a progress update
/// after every attempt.
///
/// Individual failures never abort the run; every id is processed. The
/// function itself is infallible — errors only ever land in the report.
pub async fn run<C, F>(client: &C, ids: &[String], mut on_progress: F) -> BulkReport
where
    C: DirectoryClient + ?Sized,
    F: FnMut(Progress),
{
    let total = ids.len();
    let mut report = BulkReport::default();
    for id in ids {
        let outcome = match client.disable_user(id).await {
            Ok(()) => AttemptOutcome::Success,
            Err(err) => {
                tracing::warn!(user = %id, error = %err, "disable failed");
                AttemptOutcome::Failure(err.to_string())
            }
        };
        report.attempts.push(AttemptResult { user_id: id.clone(), outcome });
        on_progress(Progress { done: report.attempts.len(), total });
    }
    report
}
