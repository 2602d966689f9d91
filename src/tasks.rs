//! Task runners for summary, key sections, and categorization.
//!
//! All three tasks share one shape: select genre-specific prompts, call the
//! generator, parse the answer as a JSON object. Every failure is turned
//! into [`TaskResult::Failure`]; nothing escapes [`TaskRunner::run`].

use serde_json::Value;
use std::sync::Arc;

use asset_insights_core::generation::{GenerationRequest, Generator, SamplingParams};
use asset_insights_core::models::{Genre, MediaRef};
use asset_insights_core::prompts;
use asset_insights_core::task::{GenerationTask, TaskResult};

/// Prefix of the failure message when the model output is not a JSON object.
pub const MALFORMED_PREFIX: &str = "Malformed JSON response from model: ";

/// Prefix of the failure message when the generation call itself failed.
pub const GENERATION_FAILED_PREFIX: &str = "Failed to process with Gemini: ";

/// Per-asset inputs shared by the three tasks.
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub asset_id: String,
    pub media: MediaRef,
    pub genre: Genre,
}

pub struct TaskRunner {
    generator: Arc<dyn Generator>,
    model: String,
}

impl TaskRunner {
    pub fn new(generator: Arc<dyn Generator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    /// Runs one task to completion.
    pub async fn run(&self, task: GenerationTask, input: &TaskInput) -> TaskResult {
        tracing::info!(
            asset_id = %input.asset_id,
            file_location = %input.media.uri,
            genre = %input.genre,
            "generating {}",
            task
        );

        let selected = prompts::select(task, input.genre.as_str());
        let request = GenerationRequest {
            system_instruction: Some(selected.system_instruction.to_string()),
            prompt: selected.prompt.to_string(),
            media: input.media.clone(),
            response_schema: Some(selected.response_schema),
            model: self.model.clone(),
            sampling: SamplingParams::content(),
        };

        let raw = match self.generator.generate(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(
                    asset_id = %input.asset_id,
                    file_location = %input.media.uri,
                    error = %e,
                    "failed to generate {}",
                    task
                );
                return TaskResult::Failure(format!("{}{}", GENERATION_FAILED_PREFIX, e));
            }
        };

        match parse_object(&raw) {
            Some(fields) => {
                tracing::info!(
                    asset_id = %input.asset_id,
                    file_location = %input.media.uri,
                    fields = fields.len(),
                    "generated {}",
                    task
                );
                TaskResult::Success(fields)
            }
            None => {
                tracing::error!(
                    asset_id = %input.asset_id,
                    file_location = %input.media.uri,
                    raw_response = %raw,
                    "could not decode JSON for {}",
                    task
                );
                TaskResult::Failure(format!("{}{}", MALFORMED_PREFIX, raw))
            }
        }
    }
}

fn parse_object(raw: &str) -> Option<serde_json::Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
