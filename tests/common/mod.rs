//! Shared fakes for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use asset_insights::config::Config;
use asset_insights::pipeline::AssetPipeline;
use asset_insights_core::generation::{GenerationError, GenerationRequest, Generator};
use asset_insights_core::models::{Asset, Source};
use asset_insights_core::store::memory::InMemoryAssetStore;
use asset_insights_core::task::GenerationTask;

/// What a scripted call was for, derived from the request's schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    Classify,
    Task(GenerationTask),
}

impl Call {
    pub fn of(request: &GenerationRequest) -> Self {
        let Some(schema) = &request.response_schema else {
            return Call::Classify;
        };
        let has = |key: &str| schema.pointer(&format!("/properties/{}", key)).is_some();
        if has("sections") {
            Call::Task(GenerationTask::KeySections)
        } else if has("character") {
            Call::Task(GenerationTask::Categorization)
        } else {
            Call::Task(GenerationTask::Summary)
        }
    }
}

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    Panic,
}

/// A [`Generator`] that answers from a script keyed by call kind and
/// records every request it sees.
pub struct ScriptedGenerator {
    replies: HashMap<Call, Reply>,
    delay: Duration,
    requests: Mutex<Vec<GenerationRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// All three tasks succeed and the classifier answers `genre`.
    pub fn happy(genre: &str) -> Self {
        Self::new()
            .reply(Call::Classify, Reply::Text(genre.to_string()))
            .reply(Call::Task(GenerationTask::Summary), Reply::Text(summary_json()))
            .reply(
                Call::Task(GenerationTask::KeySections),
                Reply::Text(key_sections_json()),
            )
            .reply(
                Call::Task(GenerationTask::Categorization),
                Reply::Text(categorization_json()),
            )
    }

    pub fn reply(mut self, call: Call, reply: Reply) -> Self {
        self.replies.insert(call, reply);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, call: Call) -> Vec<GenerationRequest> {
        self.requests()
            .into_iter()
            .filter(|r| Call::of(r) == call)
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        let call = Call::of(request);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.replies.get(&call) {
            Some(Reply::Text(text)) => Ok(text.clone()),
            Some(Reply::Fail(msg)) => Err(GenerationError::Transport(msg.clone())),
            Some(Reply::Panic) => panic!("scripted panic for {:?}", call),
            None => Err(GenerationError::EmptyResponse),
        }
    }
}

pub fn summary_json() -> String {
    json!({
        "summary": "A close match decided in the final minute.",
        "itemized_summary": ["Kick-off", "Equalizer", "Late winner"],
        "subject_topics": ["football", "derby"]
    })
    .to_string()
}

pub fn key_sections_json() -> String {
    json!({
        "sections": [{
            "type": "Goal",
            "start_timecode": "00:88:10",
            "end_timecode": "00:88:40",
            "summary": "Header from a corner.",
            "reason": "Decides the match."
        }]
    })
    .to_string()
}

pub fn categorization_json() -> String {
    json!({
        "character": ["home striker"],
        "concept": ["rivalry"],
        "scenario": ["late comeback"],
        "setting": ["stadium"],
        "subject": ["football"],
        "practice": ["set piece"],
        "theme": ["perseverance"],
        "video_mood": ["tense", "euphoric"]
    })
    .to_string()
}

pub fn asset(id: &str) -> Asset {
    Asset {
        id: id.to_string(),
        file_location: format!("gs://media/{}.mp4", id),
        file_name: format!("{}.mp4", id),
        source: Source::Gcs,
        file_category: Some("video".to_string()),
        content_type: Some("video/mp4".to_string()),
        metadata: Map::new(),
    }
}

pub fn test_config(concurrent_tasks: bool) -> Config {
    let toml = format!(
        r#"
[db]
path = "/tmp/unused.sqlite"

[generation]
project_id = "test-project"
model = "gemini-test"

[pipeline]
concurrent_tasks = {}
"#,
        concurrent_tasks
    );
    toml::from_str(&toml).unwrap()
}

pub fn pipeline(
    store: Arc<InMemoryAssetStore>,
    generator: Arc<ScriptedGenerator>,
    concurrent_tasks: bool,
) -> Arc<AssetPipeline> {
    Arc::new(AssetPipeline::from_config(
        &test_config(concurrent_tasks),
        store,
        generator,
    ))
}

pub fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}
