//! TOML configuration with deployment environment overrides.
//!
//! The configuration is loaded once at startup and shared via `Arc`;
//! nothing reads process-wide settings after that point.
//!
//! ```toml
//! [db]
//! path = "./data/assets.sqlite"
//!
//! [server]
//! bind = "0.0.0.0:8080"
//!
//! [generation]
//! project_id = "my-project"
//! model = "gemini-2.5-flash"
//!
//! [pipeline]
//! concurrent_tasks = true
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! Environment overrides: `GOOGLE_CLOUD_PROJECT`, `GCP_REGION`,
//! `LLM_MODEL`, and `PORT` (replaces the port of `server.bind`).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub generation: GenerationConfig,
    #[serde(default)]
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default)]
    pub project_id: String,
    /// Deployment region. Recorded for logs; the model endpoint uses `location`.
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL override, e.g. a local stub.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Static bearer token. When unset the token comes from
    /// `GOOGLE_OAUTH_ACCESS_TOKEN` or the instance metadata server.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Client-side timeout per call. None means wait as long as the service does.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_region() -> String {
    "us-central1".to_string()
}
fn default_location() -> String {
    "global".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClassificationConfig {
    /// Model used for genre classification; defaults to `generation.model`.
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Run the three generation tasks concurrently (joined before consolidation).
    #[serde(default = "default_concurrent_tasks")]
    pub concurrent_tasks: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrent_tasks: default_concurrent_tasks(),
        }
    }
}

fn default_concurrent_tasks() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_format() -> String {
    "json".to_string()
}

impl Config {
    /// Model used for genre classification.
    pub fn classification_model(&self) -> &str {
        self.classification
            .model
            .as_deref()
            .unwrap_or(&self.generation.model)
    }
}

/// Reads, overrides from the environment, and validates the config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;

    Ok(config)
}

/// Applies deployment environment variables on top of the file settings.
pub fn apply_env_overrides<F>(config: &mut Config, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(project) = var("GOOGLE_CLOUD_PROJECT").filter(|v| !v.is_empty()) {
        config.generation.project_id = project;
    }
    if let Some(region) = var("GCP_REGION").filter(|v| !v.is_empty()) {
        config.generation.region = region;
    }
    if let Some(model) = var("LLM_MODEL").filter(|v| !v.is_empty()) {
        config.generation.model = model;
    }
    if let Some(port) = var("PORT").filter(|v| !v.is_empty()) {
        let host = config
            .server
            .bind
            .rsplit_once(':')
            .map(|(h, _)| h.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.server.bind = format!("{}:{}", host, port);
    }
}

pub fn validate(config: &Config) -> Result<()> {
    if config.generation.project_id.trim().is_empty() {
        anyhow::bail!("generation.project_id must be set (or GOOGLE_CLOUD_PROJECT)");
    }
    if config.generation.model.trim().is_empty() {
        anyhow::bail!("generation.model must not be empty");
    }
    if config.generation.location.trim().is_empty() {
        anyhow::bail!("generation.location must not be empty");
    }
    if config.generation.timeout_secs == Some(0) {
        anyhow::bail!("generation.timeout_secs must be > 0 when set");
    }

    match config.logging.format.as_str() {
        "json" | "pretty" => {}
        other => anyhow::bail!(
            "Unknown logging format: '{}'. Must be json or pretty.",
            other
        ),
    }

    Ok(())
}
