//! Generation and classification capabilities.
//!
//! [`Generator`] is the seam between the pipeline and a hosted generative
//! model. The production implementation talks to Vertex AI; tests plug in
//! scripted fakes. Implementations make exactly one outbound call per
//! [`Generator::generate`] and never retry.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::{Genre, MediaRef};

/// Sampling configuration sent with every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub seed: i32,
    pub max_output_tokens: u32,
    /// `-1` lets the model pick its own thinking budget, `0` disables it.
    pub thinking_budget: i32,
}

impl SamplingParams {
    /// Parameters for the content-generation tasks.
    pub fn content() -> Self {
        Self {
            temperature: 1.0,
            top_p: 1.0,
            seed: 0,
            max_output_tokens: 65535,
            thinking_budget: -1,
        }
    }

    /// Parameters for the short, deterministic genre classification call.
    pub fn classification() -> Self {
        Self {
            temperature: 0.0,
            top_p: 1.0,
            seed: 0,
            max_output_tokens: 10,
            thinking_budget: 0,
        }
    }
}

/// A single generation request: prompt + media + output contract.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_instruction: Option<String>,
    pub prompt: String,
    pub media: MediaRef,
    /// When set, the model is asked for JSON matching this schema.
    pub response_schema: Option<Value>,
    pub model: String,
    pub sampling: SamplingParams,
}

/// Why a generation call produced no text.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to generation service failed: {0}")]
    Transport(String),

    #[error("generation service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("could not obtain access token: {0}")]
    Auth(String),

    #[error("response blocked: {0}")]
    Blocked(String),

    #[error("response contained no text")]
    EmptyResponse,
}

/// A hosted model that turns a [`GenerationRequest`] into raw text.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Content genre classification. Never fails: implementations fall back to
/// [`Genre::FALLBACK`] when they cannot produce a valid tag.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, media: &MediaRef) -> Genre;
}

/// A classifier that always answers with the same genre.
pub struct FixedClassifier(pub Genre);

#[async_trait]
impl Classifier for FixedClassifier {
    async fn classify(&self, _media: &MediaRef) -> Genre {
        self.0
    }
}
