//! Asset pipeline controller.
//!
//! Drives one notification from receipt to a terminal state:
//!
//! ```text
//! Received ──▶ Validated ──▶ Processing ──▶ Completed | PartialSuccess | Failed
//!     │            │              │
//!     └────────────┴──────────────┴──────▶ Aborted
//! ```
//!
//! | Situation | Metadata writes | Outcome |
//! |-----------|-----------------|---------|
//! | asset not in store | none | [`PipelineOutcome::AssetNotFound`] |
//! | `file_category` / `content_type` missing | `summary = failed` | [`PipelineOutcome::PrerequisiteMissing`] |
//! | normal run | `summary = processing`, `video_details.content_genre`, final payload | [`PipelineOutcome::Processed`] |
//! | error while processing | best-effort `summary = failed` | [`PipelineOutcome::Aborted`] |
//!
//! Every outcome is acknowledged to the transport. Redelivery would
//! re-run expensive model calls that are likely to fail the same way, and
//! there is no idempotency key to deduplicate them.
//!
//! A `processing` marker left behind by a killed run is not repaired here.

use anyhow::Result;
use std::sync::Arc;
use tracing::Instrument;

use asset_insights_core::consolidate::{
    consolidate, failure_payload, processing_payload, ConsolidatedOutcome, OutcomeStatus,
    TaskResults,
};
use asset_insights_core::generation::{Classifier, Generator};
use asset_insights_core::models::{Genre, MetadataNamespace};
use asset_insights_core::store::AssetStore;
use asset_insights_core::task::{GenerationTask, TaskResult};
use serde_json::{Map, Value};

use crate::classifier::ModelClassifier;
use crate::config::Config;
use crate::envelope::AssetNotification;
use crate::tasks::{TaskInput, TaskRunner};

/// Terminal state of one notification. All variants are acknowledged.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// The referenced asset does not exist; nothing was written.
    AssetNotFound,
    /// The asset lacks required fields; a `failed` status was written.
    PrerequisiteMissing(Vec<&'static str>),
    /// Generation ran and the consolidated payload was written.
    Processed { status: OutcomeStatus, genre: Genre },
    /// Processing hit an unexpected error.
    Aborted(String),
}

impl PipelineOutcome {
    /// Short label for logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineOutcome::AssetNotFound => "asset_not_found",
            PipelineOutcome::PrerequisiteMissing(_) => "prerequisite_missing",
            PipelineOutcome::Processed { status, .. } => status.as_str(),
            PipelineOutcome::Aborted(_) => "aborted",
        }
    }
}

pub struct AssetPipeline {
    store: Arc<dyn AssetStore>,
    classifier: Arc<dyn Classifier>,
    runner: TaskRunner,
    concurrent_tasks: bool,
}

impl AssetPipeline {
    pub fn new(
        store: Arc<dyn AssetStore>,
        classifier: Arc<dyn Classifier>,
        generator: Arc<dyn Generator>,
        model: impl Into<String>,
        concurrent_tasks: bool,
    ) -> Self {
        Self {
            store,
            classifier,
            runner: TaskRunner::new(generator, model),
            concurrent_tasks,
        }
    }

    /// Wires the pipeline the way the service runs it: the classifier and
    /// the task runners share one generator.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn AssetStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let classifier = Arc::new(ModelClassifier::new(
            generator.clone(),
            config.classification_model(),
        ));
        Self::new(
            store,
            classifier,
            generator,
            config.generation.model.clone(),
            config.pipeline.concurrent_tasks,
        )
    }

    /// Handles one decoded notification. Never fails.
    pub async fn handle(&self, notification: &AssetNotification) -> PipelineOutcome {
        tracing::info!(
            asset_id = %notification.asset_id,
            file_name = %notification.file_name,
            file_location = %notification.file_location,
            source = %notification.source,
            "processing summary generation request"
        );

        match self.process(notification).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = format!("{:#}", e);
                tracing::error!(
                    severity = "CRITICAL",
                    asset_id = %notification.asset_id,
                    error = %message,
                    "unhandled error during summary generation"
                );
                self.record_failure(&notification.asset_id, &message).await;
                PipelineOutcome::Aborted(message)
            }
        }
    }

    /// Runs [`handle`](Self::handle) on its own task so that a panic inside
    /// processing ends up in the same place as an error.
    pub async fn handle_isolated(self: Arc<Self>, notification: AssetNotification) -> PipelineOutcome {
        let asset_id = notification.asset_id.clone();
        let pipeline = self.clone();
        let task = tokio::spawn(
            async move { pipeline.handle(&notification).await }.in_current_span(),
        );

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = e.to_string();
                tracing::error!(
                    severity = "CRITICAL",
                    asset_id = %asset_id,
                    error = %message,
                    "processing task did not finish"
                );
                self.record_failure(&asset_id, &message).await;
                PipelineOutcome::Aborted(message)
            }
        }
    }

    /// Best-effort `{status: failed}` write after an unexpected error.
    pub async fn record_failure(&self, asset_id: &str, error: &str) {
        let payload = failure_payload(format!("Critical error in service: {}", error));
        if let Err(e) = self
            .store
            .update_asset_metadata(asset_id, MetadataNamespace::Summary, payload)
            .await
        {
            tracing::error!(asset_id = %asset_id, error = %e, "could not record failure status");
        }
    }

    async fn process(&self, n: &AssetNotification) -> Result<PipelineOutcome> {
        let asset_id = n.asset_id.as_str();

        let Some(asset) = self.store.get_asset(asset_id).await? else {
            tracing::error!(asset_id = %asset_id, "asset not found in store, aborting");
            return Ok(PipelineOutcome::AssetNotFound);
        };

        let missing = asset.missing_prerequisites();
        if !missing.is_empty() {
            let message = format!(
                "Asset document is missing required fields: {}.",
                missing.join(", ")
            );
            tracing::error!(asset_id = %asset_id, missing = ?missing, "{}", message);
            self.store
                .update_asset_metadata(asset_id, MetadataNamespace::Summary, failure_payload(message))
                .await?;
            return Ok(PipelineOutcome::PrerequisiteMissing(missing));
        }

        self.store
            .update_asset_metadata(asset_id, MetadataNamespace::Summary, processing_payload())
            .await?;

        let media = n.media();
        let genre = self.classifier.classify(&media).await;
        tracing::info!(asset_id = %asset_id, genre = %genre, "content genre selected");

        let mut details = Map::new();
        details.insert("content_genre".into(), Value::String(genre.as_str().into()));
        self.store
            .update_asset_metadata(asset_id, MetadataNamespace::VideoDetails, details)
            .await?;

        let input = TaskInput {
            asset_id: asset_id.to_string(),
            media,
            genre,
        };
        let results = self.run_tasks(&input).await;

        let outcome = consolidate(&results);
        log_outcome(asset_id, &results, &outcome);

        self.store
            .update_asset_metadata(
                asset_id,
                MetadataNamespace::Summary,
                outcome.update_payload(),
            )
            .await?;

        Ok(PipelineOutcome::Processed {
            status: outcome.status,
            genre,
        })
    }

    /// Runs all three tasks and waits for every one of them. A failed task
    /// never cancels or skips its siblings.
    async fn run_tasks(&self, input: &TaskInput) -> TaskResults {
        if self.concurrent_tasks {
            let (summary, key_sections, categorization) = tokio::join!(
                self.runner.run(GenerationTask::Summary, input),
                self.runner.run(GenerationTask::KeySections, input),
                self.runner.run(GenerationTask::Categorization, input),
            );
            TaskResults {
                summary,
                key_sections,
                categorization,
            }
        } else {
            TaskResults {
                summary: self.runner.run(GenerationTask::Summary, input).await,
                key_sections: self.runner.run(GenerationTask::KeySections, input).await,
                categorization: self.runner.run(GenerationTask::Categorization, input).await,
            }
        }
    }
}

fn log_outcome(asset_id: &str, results: &TaskResults, outcome: &ConsolidatedOutcome) {
    for (task, result) in results.iter() {
        match result {
            TaskResult::Success(_) => {
                tracing::info!(asset_id = %asset_id, "{} succeeded", task)
            }
            TaskResult::Failure(msg) => {
                tracing::warn!(asset_id = %asset_id, error = %msg, "{} failed", task)
            }
        }
    }

    match outcome.joined_errors() {
        None => tracing::info!(
            asset_id = %asset_id,
            status = %outcome.status,
            "summary, key sections, and categorization completed"
        ),
        Some(errors) => tracing::error!(
            asset_id = %asset_id,
            status = %outcome.status,
            errors = %errors,
            "generation finished with errors"
        ),
    }
}
