//! Generation tasks and their per-task outcome.

use serde_json::{Map, Value};
use std::fmt;

/// One of the three independent generation jobs run for every asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationTask {
    Summary,
    KeySections,
    Categorization,
}

impl GenerationTask {
    /// Fixed evaluation order. Error messages and field merging follow it.
    pub const ALL: [GenerationTask; 3] = [
        GenerationTask::Summary,
        GenerationTask::KeySections,
        GenerationTask::Categorization,
    ];

    /// Prefix used in consolidated error messages (`"<label>Error: ..."`).
    pub fn error_label(&self) -> &'static str {
        match self {
            GenerationTask::Summary => "Summary",
            GenerationTask::KeySections => "KeySections",
            GenerationTask::Categorization => "Categorization",
        }
    }

    /// Human-readable name for log lines.
    pub fn description(&self) -> &'static str {
        match self {
            GenerationTask::Summary => "summary",
            GenerationTask::KeySections => "key sections",
            GenerationTask::Categorization => "detailed categorization",
        }
    }
}

impl fmt::Display for GenerationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Outcome of a single task. A failure never carries partial data.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult {
    Success(Map<String, Value>),
    Failure(String),
}
