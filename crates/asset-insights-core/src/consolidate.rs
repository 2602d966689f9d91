//! Consolidation of the three task outcomes into one metadata update.
//!
//! # Status derivation
//!
//! | Failed tasks | Status |
//! |--------------|--------|
//! | 0 | `completed` |
//! | 1 or 2 | `partial_success` |
//! | 3 | `failed` |
//!
//! Successful outputs are merged in [`GenerationTask::ALL`] order, so on a
//! key collision the later task wins. Error messages follow the same order
//! and are joined with `" | "` in the update payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::task::{GenerationTask, TaskResult};

/// Separator between per-task error messages in `error_message`.
pub const ERROR_SEPARATOR: &str = " | ";

/// Terminal status of a processed asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Completed,
    PartialSuccess,
    Failed,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Completed => "completed",
            OutcomeStatus::PartialSuccess => "partial_success",
            OutcomeStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker written before any generation starts.
pub const PROCESSING_STATUS: &str = "processing";

/// The three task outcomes, one slot per task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResults {
    pub summary: TaskResult,
    pub key_sections: TaskResult,
    pub categorization: TaskResult,
}

impl TaskResults {
    pub fn get(&self, task: GenerationTask) -> &TaskResult {
        match task {
            GenerationTask::Summary => &self.summary,
            GenerationTask::KeySections => &self.key_sections,
            GenerationTask::Categorization => &self.categorization,
        }
    }

    /// Iterates `(task, result)` in the fixed evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (GenerationTask, &TaskResult)> {
        GenerationTask::ALL.into_iter().map(move |t| (t, self.get(t)))
    }
}

/// Merged fields, ordered error messages, and derived status.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedOutcome {
    pub merged_fields: Map<String, Value>,
    pub error_messages: Vec<String>,
    pub status: OutcomeStatus,
}

impl ConsolidatedOutcome {
    /// `error_messages` joined for storage, or `None` on full success.
    pub fn joined_errors(&self) -> Option<String> {
        if self.error_messages.is_empty() {
            None
        } else {
            Some(self.error_messages.join(ERROR_SEPARATOR))
        }
    }

    /// The document merged into the asset's `summary` namespace:
    /// `{status, ...merged_fields, error_message}`.
    ///
    /// `status` and `error_message` are written last so a model field of
    /// the same name can never mask them.
    pub fn update_payload(&self) -> Map<String, Value> {
        let mut payload = self.merged_fields.clone();
        payload.insert("status".into(), Value::String(self.status.as_str().into()));
        payload.insert(
            "error_message".into(),
            self.joined_errors().map(Value::String).unwrap_or(Value::Null),
        );
        payload
    }
}

/// Combines the three task outcomes. Pure and deterministic.
pub fn consolidate(results: &TaskResults) -> ConsolidatedOutcome {
    let mut merged_fields = Map::new();
    let mut error_messages = Vec::new();

    for (task, result) in results.iter() {
        match result {
            TaskResult::Success(fields) => {
                for (k, v) in fields {
                    merged_fields.insert(k.clone(), v.clone());
                }
            }
            TaskResult::Failure(msg) => {
                error_messages.push(format!("{}Error: {}", task.error_label(), msg));
            }
        }
    }

    let status = match error_messages.len() {
        0 => OutcomeStatus::Completed,
        n if n == GenerationTask::ALL.len() => OutcomeStatus::Failed,
        _ => OutcomeStatus::PartialSuccess,
    };

    ConsolidatedOutcome {
        merged_fields,
        error_messages,
        status,
    }
}

/// `{status: "processing"}`.
pub fn processing_payload() -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("status".into(), Value::String(PROCESSING_STATUS.into()));
    m
}

/// `{status: "failed", error_message}`.
pub fn failure_payload(message: impl Into<String>) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert(
        "status".into(),
        Value::String(OutcomeStatus::Failed.as_str().into()),
    );
    m.insert("error_message".into(), Value::String(message.into()));
    m
}
