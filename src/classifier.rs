//! Model-backed content genre classifier.
//!
//! Sends the media with a short classification prompt and expects a bare
//! genre tag back. Any failure (transport error, unexpected answer) is
//! logged and answered with [`Genre::FALLBACK`], so callers never see an
//! error from classification.

use async_trait::async_trait;
use std::sync::Arc;

use asset_insights_core::generation::{Classifier, GenerationRequest, Generator, SamplingParams};
use asset_insights_core::models::{Genre, MediaRef};
use asset_insights_core::prompts::CLASSIFICATION_PROMPT;

pub struct ModelClassifier {
    generator: Arc<dyn Generator>,
    model: String,
}

impl ModelClassifier {
    pub fn new(generator: Arc<dyn Generator>, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Classifier for ModelClassifier {
    async fn classify(&self, media: &MediaRef) -> Genre {
        let request = GenerationRequest {
            system_instruction: None,
            prompt: CLASSIFICATION_PROMPT.to_string(),
            media: media.clone(),
            response_schema: None,
            model: self.model.clone(),
            sampling: SamplingParams::classification(),
        };

        match self.generator.generate(&request).await {
            Ok(answer) => match Genre::parse_tag(&answer) {
                Some(genre) => {
                    tracing::info!(genre = %genre, "content classified");
                    genre
                }
                None => {
                    tracing::warn!(
                        answer = %answer.trim(),
                        fallback = %Genre::FALLBACK,
                        "unexpected classification result, using fallback genre"
                    );
                    Genre::FALLBACK
                }
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = %Genre::FALLBACK,
                    "content classification failed, using fallback genre"
                );
                Genre::FALLBACK
            }
        }
    }
}
