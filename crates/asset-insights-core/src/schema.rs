//! Structured-output schemas for the three generation tasks.
//!
//! Schemas use the OpenAPI subset accepted by the Vertex AI
//! `generationConfig.responseSchema` field. The top-level field sets are
//! disjoint across tasks, so merging successful outputs never collides.

use serde_json::{json, Value};

use crate::task::GenerationTask;

/// Top-level fields produced by the summary task.
pub const SUMMARY_FIELDS: &[&str] = &["summary", "itemized_summary", "subject_topics"];

/// Top-level fields produced by the key-sections task.
pub const KEY_SECTIONS_FIELDS: &[&str] = &["sections"];

/// Top-level fields produced by the categorization task.
pub const CATEGORIZATION_FIELDS: &[&str] = &[
    "character",
    "concept",
    "scenario",
    "setting",
    "subject",
    "practice",
    "theme",
    "video_mood",
];

/// Returns the response schema for `task`.
pub fn response_schema(task: GenerationTask) -> Value {
    match task {
        GenerationTask::Summary => summary_schema(),
        GenerationTask::KeySections => key_sections_schema(),
        GenerationTask::Categorization => categorization_schema(),
    }
}

/// Returns the top-level field names `task` is expected to produce.
#[cfg(test)]
fn task_fields(task: GenerationTask) -> &'static [&'static str] {
    match task {
        GenerationTask::Summary => SUMMARY_FIELDS,
        GenerationTask::KeySections => KEY_SECTIONS_FIELDS,
        GenerationTask::Categorization => CATEGORIZATION_FIELDS,
    }
}

fn string_array() -> Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

fn summary_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "itemized_summary": string_array(),
            "subject_topics": string_array(),
        },
        "required": SUMMARY_FIELDS,
    })
}

fn key_sections_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "sections": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "type": { "type": "STRING" },
                        "start_timecode": { "type": "STRING" },
                        "end_timecode": { "type": "STRING" },
                        "summary": { "type": "STRING" },
                        "reason": { "type": "STRING" },
                    },
                    "required": ["type", "start_timecode", "end_timecode", "summary"],
                },
            },
        },
        "required": KEY_SECTIONS_FIELDS,
    })
}

fn categorization_schema() -> Value {
    let properties: serde_json::Map<String, Value> = CATEGORIZATION_FIELDS
        .iter()
        .map(|f| (f.to_string(), string_array()))
        .collect();
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": CATEGORIZATION_FIELDS,
    })
}
