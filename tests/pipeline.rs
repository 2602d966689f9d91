//! End-to-end pipeline runs against the in-memory store and a scripted
//! generator.

mod common;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

use asset_insights::envelope::AssetNotification;
use asset_insights::pipeline::{AssetPipeline, PipelineOutcome};
use asset_insights_core::consolidate::OutcomeStatus;
use asset_insights_core::generation::FixedClassifier;
use asset_insights_core::models::{Asset, Genre, MetadataNamespace, Source};
use asset_insights_core::prompts;
use asset_insights_core::store::memory::InMemoryAssetStore;
use asset_insights_core::store::AssetStore;
use asset_insights_core::task::GenerationTask;

use common::{asset, object, pipeline, Call, Reply, ScriptedGenerator};

fn notification(asset: &Asset) -> AssetNotification {
    AssetNotification {
        asset_id: asset.id.clone(),
        file_location: asset.file_location.clone(),
        file_name: asset.file_name.clone(),
        source: asset.source,
    }
}

fn store_with(asset: Asset) -> Arc<InMemoryAssetStore> {
    let store = Arc::new(InMemoryAssetStore::new());
    store.insert_asset(asset).unwrap();
    store
}

async fn summary_of(store: &InMemoryAssetStore, id: &str) -> Map<String, Value> {
    let asset = store.get_asset(id).await.unwrap().unwrap();
    asset.namespace(MetadataNamespace::Summary).unwrap().clone()
}

#[tokio::test]
async fn test_sports_asset_completes() {
    let a = asset("a1");
    let store = store_with(a.clone());
    let generator = Arc::new(ScriptedGenerator::happy("sports"));
    let p = pipeline(store.clone(), generator.clone(), true);

    let outcome = p.handle(&notification(&a)).await;
    assert_eq!(
        outcome,
        PipelineOutcome::Processed {
            status: OutcomeStatus::Completed,
            genre: Genre::Sports
        }
    );

    // processing marker, genre, final payload
    let writes = store.writes();
    assert_eq!(writes.len(), 3);
    assert_eq!(writes[0].namespace, MetadataNamespace::Summary);
    assert_eq!(writes[0].fields, object(json!({"status": "processing"})));
    assert_eq!(writes[1].namespace, MetadataNamespace::VideoDetails);
    assert_eq!(writes[1].fields, object(json!({"content_genre": "sports"})));
    assert_eq!(writes[2].namespace, MetadataNamespace::Summary);

    let summary = summary_of(&store, "a1").await;
    assert_eq!(summary["status"], "completed");
    assert_eq!(summary["error_message"], Value::Null);
    assert_eq!(summary["summary"], "A close match decided in the final minute.");
    assert_eq!(summary["sections"][0]["type"], "Goal");
    assert_eq!(summary["video_mood"], json!(["tense", "euphoric"]));

    for task in GenerationTask::ALL {
        let reqs = generator.requests_for(Call::Task(task));
        assert_eq!(reqs.len(), 1, "{} should run exactly once", task);
        let expected = prompts::select(task, "sports");
        assert_eq!(
            reqs[0].system_instruction.as_deref(),
            Some(expected.system_instruction)
        );
        assert_eq!(reqs[0].prompt, expected.prompt);
        assert_eq!(reqs[0].model, "gemini-test");
        assert_eq!(reqs[0].media.uri, "gs://media/a1.mp4");
    }
}

#[tokio::test]
async fn test_one_failed_task_is_partial_success() {
    let a = asset("a2");
    let store = store_with(a.clone());
    let generator = Arc::new(
        ScriptedGenerator::happy("entertainment").reply(
            Call::Task(GenerationTask::KeySections),
            Reply::Fail("boom".into()),
        ),
    );
    let p = pipeline(store.clone(), generator.clone(), true);

    let outcome = p.handle(&notification(&a)).await;
    assert_eq!(
        outcome,
        PipelineOutcome::Processed {
            status: OutcomeStatus::PartialSuccess,
            genre: Genre::Entertainment
        }
    );

    let summary = summary_of(&store, "a2").await;
    assert_eq!(summary["status"], "partial_success");
    assert_eq!(
        summary["error_message"],
        "KeySectionsError: Failed to process with Gemini: request to generation service failed: boom"
    );
    assert!(summary.contains_key("summary"));
    assert!(summary.contains_key("theme"));
    assert!(!summary.contains_key("sections"));

    // Entertainment prompts were used.
    let reqs = generator.requests_for(Call::Task(GenerationTask::Summary));
    assert_eq!(
        reqs[0].system_instruction.as_deref(),
        Some(prompts::select(GenerationTask::Summary, "entertainment").system_instruction)
    );
}

#[tokio::test]
async fn test_malformed_key_sections_is_partial_success() {
    let a = asset("a2m");
    let store = store_with(a.clone());
    let generator = Arc::new(ScriptedGenerator::happy("sports").reply(
        Call::Task(GenerationTask::KeySections),
        Reply::Text("oops not json".into()),
    ));
    let p = pipeline(store.clone(), generator, true);

    let outcome = p.handle(&notification(&a)).await;
    assert_eq!(
        outcome,
        PipelineOutcome::Processed {
            status: OutcomeStatus::PartialSuccess,
            genre: Genre::Sports
        }
    );

    let summary = summary_of(&store, "a2m").await;
    assert_eq!(summary["status"], "partial_success");
    assert_eq!(
        summary["error_message"],
        "KeySectionsError: Malformed JSON response from model: oops not json"
    );
    for field in ["summary", "itemized_summary", "subject_topics"] {
        assert!(summary.contains_key(field), "missing {}", field);
    }
    for field in ["character", "theme", "video_mood"] {
        assert!(summary.contains_key(field), "missing {}", field);
    }
    assert!(!summary.contains_key("sections"));
}

#[tokio::test]
async fn test_all_tasks_failing_is_failed() {
    let a = asset("a3");
    let store = store_with(a.clone());
    let generator = Arc::new(
        ScriptedGenerator::new()
            .reply(Call::Classify, Reply::Text("documentary".into()))
            .reply(Call::Task(GenerationTask::Summary), Reply::Text("not json".into()))
            .reply(
                Call::Task(GenerationTask::KeySections),
                Reply::Text("[1, 2, 3]".into()),
            )
            .reply(
                Call::Task(GenerationTask::Categorization),
                Reply::Fail("quota".into()),
            ),
    );
    let p = pipeline(store.clone(), generator, true);

    let outcome = p.handle(&notification(&a)).await;
    assert_eq!(outcome.label(), "failed");

    let summary = summary_of(&store, "a3").await;
    assert_eq!(summary["status"], "failed");
    let errors = summary["error_message"].as_str().unwrap();
    let parts: Vec<&str> = errors.split(" | ").collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0], "SummaryError: Malformed JSON response from model: not json");
    assert_eq!(parts[1], "KeySectionsError: Malformed JSON response from model: [1, 2, 3]");
    assert!(parts[2].starts_with("CategorizationError: Failed to process with Gemini: "));

    // Documentary keeps its own tag on the asset.
    let asset = store.get_asset("a3").await.unwrap().unwrap();
    assert_eq!(
        asset.namespace(MetadataNamespace::VideoDetails).unwrap()["content_genre"],
        "documentary"
    );
}

#[tokio::test]
async fn test_unknown_classification_falls_back() {
    let a = asset("a4");
    let store = store_with(a.clone());
    let generator = Arc::new(ScriptedGenerator::happy("cooking show"));
    let p = pipeline(store.clone(), generator, true);

    let outcome = p.handle(&notification(&a)).await;
    assert_eq!(
        outcome,
        PipelineOutcome::Processed {
            status: OutcomeStatus::Completed,
            genre: Genre::Entertainment
        }
    );
    let details = &store.writes_to(MetadataNamespace::VideoDetails)[0];
    assert_eq!(details.fields["content_genre"], "entertainment");
}

#[tokio::test]
async fn test_classifier_error_falls_back() {
    let a = asset("a5");
    let store = store_with(a.clone());
    let generator = Arc::new(
        ScriptedGenerator::happy("sports").reply(Call::Classify, Reply::Fail("down".into())),
    );
    let p = pipeline(store.clone(), generator, true);

    let outcome = p.handle(&notification(&a)).await;
    assert_eq!(outcome.label(), "completed");
    assert_eq!(
        store.writes_to(MetadataNamespace::VideoDetails)[0].fields["content_genre"],
        "entertainment"
    );
}

#[tokio::test]
async fn test_missing_asset_writes_nothing() {
    let store = Arc::new(InMemoryAssetStore::new());
    let generator = Arc::new(ScriptedGenerator::happy("sports"));
    let p = pipeline(store.clone(), generator.clone(), true);

    let outcome = p.handle(&notification(&asset("ghost"))).await;
    assert_eq!(outcome, PipelineOutcome::AssetNotFound);
    assert!(store.writes().is_empty());
    assert!(generator.requests().is_empty());
}

#[tokio::test]
async fn test_missing_prerequisites_fail_without_generation() {
    let mut a = asset("a6");
    a.content_type = None;
    a.file_category = Some("  ".into());
    let store = store_with(a.clone());
    let generator = Arc::new(ScriptedGenerator::happy("sports"));
    let p = pipeline(store.clone(), generator.clone(), true);

    let outcome = p.handle(&notification(&a)).await;
    assert_eq!(
        outcome,
        PipelineOutcome::PrerequisiteMissing(vec!["file_category", "content_type"])
    );

    let writes = store.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].fields["status"], "failed");
    let message = writes[0].fields["error_message"].as_str().unwrap();
    assert!(message.contains("file_category"));
    assert!(message.contains("content_type"));
    assert!(generator.requests().is_empty());
}

#[tokio::test]
async fn test_tasks_run_concurrently() {
    let a = asset("a7");
    let store = store_with(a.clone());
    let generator =
        Arc::new(ScriptedGenerator::happy("sports").with_delay(Duration::from_millis(50)));
    let p = pipeline(store, generator.clone(), true);

    p.handle(&notification(&a)).await;
    assert_eq!(generator.max_in_flight(), 3);
}

#[tokio::test]
async fn test_sequential_mode_keeps_task_order() {
    let a = asset("a8");
    let store = store_with(a.clone());
    let generator =
        Arc::new(ScriptedGenerator::happy("sports").with_delay(Duration::from_millis(5)));
    let p = pipeline(store.clone(), generator.clone(), false);

    let outcome = p.handle(&notification(&a)).await;
    assert_eq!(outcome.label(), "completed");
    assert_eq!(generator.max_in_flight(), 1);

    let order: Vec<Call> = generator.requests().iter().map(Call::of).collect();
    assert_eq!(
        order,
        vec![
            Call::Classify,
            Call::Task(GenerationTask::Summary),
            Call::Task(GenerationTask::KeySections),
            Call::Task(GenerationTask::Categorization),
        ]
    );
}

#[tokio::test]
async fn test_youtube_media_is_passed_through() {
    let mut a = asset("a9");
    a.source = Source::Youtube;
    a.file_location = "https://www.youtube.com/watch?v=abc".into();
    let store = store_with(a.clone());
    let generator = Arc::new(ScriptedGenerator::happy("other"));
    let p = pipeline(store, generator.clone(), true);

    p.handle(&notification(&a)).await;
    for req in generator.requests() {
        assert_eq!(req.media.source, Source::Youtube);
        assert_eq!(req.media.uri, "https://www.youtube.com/watch?v=abc");
    }
}

#[tokio::test]
async fn test_fixed_classifier_skips_classification_call() {
    let a = asset("a10");
    let store = store_with(a.clone());
    let generator = Arc::new(ScriptedGenerator::happy("entertainment"));
    let p = AssetPipeline::new(
        store.clone(),
        Arc::new(FixedClassifier(Genre::Sports)),
        generator.clone(),
        "gemini-test",
        true,
    );

    let outcome = p.handle(&notification(&a)).await;
    assert_eq!(
        outcome,
        PipelineOutcome::Processed {
            status: OutcomeStatus::Completed,
            genre: Genre::Sports
        }
    );
    assert!(generator.requests_for(Call::Classify).is_empty());
}

/// Fails every write to one namespace.
struct BrokenNamespaceStore {
    inner: InMemoryAssetStore,
    broken: MetadataNamespace,
}

#[async_trait]
impl AssetStore for BrokenNamespaceStore {
    async fn get_asset(&self, asset_id: &str) -> Result<Option<Asset>> {
        self.inner.get_asset(asset_id).await
    }

    async fn update_asset_metadata(
        &self,
        asset_id: &str,
        namespace: MetadataNamespace,
        fields: Map<String, Value>,
    ) -> Result<()> {
        if namespace == self.broken {
            bail!("disk full");
        }
        self.inner.update_asset_metadata(asset_id, namespace, fields).await
    }
}

#[tokio::test]
async fn test_store_error_is_contained_and_recorded() {
    let a = asset("a11");
    let store = Arc::new(BrokenNamespaceStore {
        inner: InMemoryAssetStore::new(),
        broken: MetadataNamespace::VideoDetails,
    });
    store.inner.insert_asset(a.clone()).unwrap();
    let generator = Arc::new(ScriptedGenerator::happy("sports"));
    let p = AssetPipeline::from_config(&common::test_config(true), store.clone(), generator.clone());

    let outcome = p.handle(&notification(&a)).await;
    assert!(matches!(outcome, PipelineOutcome::Aborted(ref e) if e.contains("disk full")));

    let writes = store.inner.writes_to(MetadataNamespace::Summary);
    let last = writes.last().unwrap();
    assert_eq!(last.fields["status"], "failed");
    assert_eq!(
        last.fields["error_message"],
        "Critical error in service: disk full"
    );
    // Tasks never ran.
    assert!(generator
        .requests_for(Call::Task(GenerationTask::Summary))
        .is_empty());
}

#[tokio::test]
async fn test_panic_during_processing_is_contained() {
    let a = asset("a12");
    let store = store_with(a.clone());
    let generator = Arc::new(
        ScriptedGenerator::happy("sports")
            .reply(Call::Task(GenerationTask::Summary), Reply::Panic),
    );
    let p = pipeline(store.clone(), generator, true);

    let outcome = p.clone().handle_isolated(notification(&a)).await;
    assert_eq!(outcome.label(), "aborted");

    let summary = summary_of(&store, "a12").await;
    assert_eq!(summary["status"], "failed");
    assert!(summary["error_message"]
        .as_str()
        .unwrap()
        .starts_with("Critical error in service: "));
}

#[tokio::test]
async fn test_rerun_overwrites_previous_outcome() {
    let a = asset("a13");
    let store = store_with(a.clone());

    let failing = Arc::new(
        ScriptedGenerator::happy("sports")
            .reply(Call::Task(GenerationTask::Summary), Reply::Fail("x".into())),
    );
    pipeline(store.clone(), failing, true)
        .handle(&notification(&a))
        .await;
    assert_eq!(summary_of(&store, "a13").await["status"], "partial_success");

    let healthy = Arc::new(ScriptedGenerator::happy("sports"));
    pipeline(store.clone(), healthy, true)
        .handle(&notification(&a))
        .await;
    let summary = summary_of(&store, "a13").await;
    assert_eq!(summary["status"], "completed");
    assert_eq!(summary["error_message"], Value::Null);
}
