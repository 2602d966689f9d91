//! Vertex AI `generateContent` client.
//!
//! [`VertexGenerator`] implements [`Generator`] with one `POST` per call:
//!
//! ```text
//! {base}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:generateContent
//! ```
//!
//! `base` is `https://aiplatform.googleapis.com` for the `global` location
//! and `https://{location}-aiplatform.googleapis.com` otherwise, unless
//! `generation.endpoint` overrides it.
//!
//! Safety filtering is switched off for every category: dramatic and
//! sports footage routinely depicts violence and conflict, and a refusal
//! would leave the asset without metadata.
//!
//! No retries happen here; redelivery policy belongs to the transport.
//!
//! # Access tokens
//!
//! In order of preference:
//! 1. `generation.access_token` from the config file
//! 2. `GOOGLE_OAUTH_ACCESS_TOKEN` environment variable
//! 3. the instance metadata server (Cloud Run, GCE, GKE)

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use asset_insights_core::generation::{GenerationError, GenerationRequest, Generator};

use crate::config::GenerationConfig;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];

/// Generation backend for Gemini models hosted on Vertex AI.
pub struct VertexGenerator {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    location: String,
    static_token: Option<String>,
}

impl VertexGenerator {
    /// Builds a generator from the `[generation]` config section.
    pub fn new(config: &GenerationConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        let base_url = match &config.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => default_base_url(&config.location),
        };

        Ok(Self {
            client,
            base_url,
            project_id: config.project_id.clone(),
            location: config.location.clone(),
            static_token: config.access_token.clone(),
        })
    }

    fn url(&self, model: &str) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.base_url, self.project_id, self.location, model
        )
    }

    async fn access_token(&self) -> Result<String, GenerationError> {
        if let Some(token) = &self.static_token {
            return Ok(token.clone());
        }
        if let Ok(token) = std::env::var("GOOGLE_OAUTH_ACCESS_TOKEN") {
            if !token.is_empty() {
                return Ok(token);
            }
        }

        let resp = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| GenerationError::Auth(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(GenerationError::Auth(format!(
                "metadata server returned {}",
                resp.status()
            )));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| GenerationError::Auth(e.to_string()))?;
        body.get("access_token")
            .and_then(|t| t.as_str())
            .map(String::from)
            .ok_or_else(|| GenerationError::Auth("metadata response has no access_token".into()))
    }
}

fn default_base_url(location: &str) -> String {
    if location == "global" {
        "https://aiplatform.googleapis.com".to_string()
    } else {
        format!("https://{}-aiplatform.googleapis.com", location)
    }
}

#[async_trait]
impl Generator for VertexGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let token = self.access_token().await?;
        let body = build_request_body(request);

        tracing::debug!(model = %request.model, "calling generateContent");

        let response = self
            .client
            .post(self.url(&request.model))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Service {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        extract_text(&json)
    }
}

/// Builds the `generateContent` JSON body for a request.
pub fn build_request_body(request: &GenerationRequest) -> Value {
    let sampling = &request.sampling;
    let mut generation_config = json!({
        "temperature": sampling.temperature,
        "topP": sampling.top_p,
        "seed": sampling.seed,
        "maxOutputTokens": sampling.max_output_tokens,
        "thinkingConfig": { "thinkingBudget": sampling.thinking_budget },
    });
    if let Some(schema) = &request.response_schema {
        generation_config["responseMimeType"] = json!("application/json");
        generation_config["responseSchema"] = schema.clone();
    }

    let safety_settings: Vec<Value> = SAFETY_CATEGORIES
        .iter()
        .map(|c| json!({ "category": c, "threshold": "OFF" }))
        .collect();

    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "text": request.prompt },
                {
                    "fileData": {
                        "fileUri": request.media.uri,
                        "mimeType": request.media.source.mime_type_hint(),
                    }
                },
            ],
        }],
        "generationConfig": generation_config,
        "safetySettings": safety_settings,
    });
    if let Some(si) = &request.system_instruction {
        body["systemInstruction"] = json!({ "parts": [{ "text": si }] });
    }
    body
}

/// Pulls the answer text out of a `generateContent` response.
///
/// Text parts of the first candidate are concatenated; thought parts are
/// skipped.
pub fn extract_text(json: &Value) -> Result<String, GenerationError> {
    if let Some(reason) = json
        .pointer("/promptFeedback/blockReason")
        .and_then(|r| r.as_str())
    {
        return Err(GenerationError::Blocked(reason.to_string()));
    }

    let parts = json
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array());

    let text: String = parts
        .map(|parts| {
            parts
                .iter()
                .filter(|p| !p.get("thought").and_then(|t| t.as_bool()).unwrap_or(false))
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        if let Some(reason) = json
            .pointer("/candidates/0/finishReason")
            .and_then(|r| r.as_str())
            .filter(|r| *r == "SAFETY" || *r == "PROHIBITED_CONTENT")
        {
            return Err(GenerationError::Blocked(reason.to_string()));
        }
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}
