//! Core data models shared by the pipeline, the stores, and the server.
//!
//! An [`Asset`] is created by the upstream ingestion process; this system
//! only reads it and writes the `summary` and `video_details` namespaces of
//! its metadata document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Where the media bytes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Source {
    /// A Cloud Storage object (`gs://bucket/path`).
    #[default]
    #[serde(rename = "GCS")]
    Gcs,
    /// A YouTube video URL.
    #[serde(rename = "youtube")]
    Youtube,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Gcs => "GCS",
            Source::Youtube => "youtube",
        }
    }

    /// Parses the wire name. Matching is exact, as in the notification payload.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GCS" => Some(Source::Gcs),
            "youtube" => Some(Source::Youtube),
            _ => None,
        }
    }

    /// MIME type sent alongside the media URI to the generation service.
    pub fn mime_type_hint(&self) -> &'static str {
        match self {
            Source::Youtube => "video/youtube",
            Source::Gcs => "video/*",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the media the model should look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub uri: String,
    pub source: Source,
}

impl MediaRef {
    pub fn new(uri: impl Into<String>, source: Source) -> Self {
        Self {
            uri: uri.into(),
            source,
        }
    }
}

/// A media asset as stored in the metadata store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub file_location: String,
    pub file_name: String,
    pub source: Source,
    pub file_category: Option<String>,
    pub content_type: Option<String>,
    /// Metadata document, keyed by namespace (`summary`, `video_details`, ...).
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Asset {
    /// Names of required classification fields that are absent or empty.
    pub fn missing_prerequisites(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.file_category) {
            missing.push("file_category");
        }
        if is_blank(&self.content_type) {
            missing.push("content_type");
        }
        missing
    }

    /// Returns one namespace of the metadata document, if present.
    pub fn namespace(&self, ns: MetadataNamespace) -> Option<&Map<String, Value>> {
        self.metadata.get(ns.as_str()).and_then(|v| v.as_object())
    }
}

fn is_blank(v: &Option<String>) -> bool {
    v.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true)
}

/// Sub-documents of an asset's metadata that this system writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataNamespace {
    Summary,
    VideoDetails,
}

impl MetadataNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataNamespace::Summary => "summary",
            MetadataNamespace::VideoDetails => "video_details",
        }
    }
}

impl fmt::Display for MetadataNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse content classification used to pick prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Sports,
    Entertainment,
    Documentary,
    Other,
}

impl Genre {
    /// Tag used whenever classification cannot produce a valid answer.
    pub const FALLBACK: Genre = Genre::Entertainment;

    pub const ALL: [Genre; 4] = [
        Genre::Sports,
        Genre::Entertainment,
        Genre::Documentary,
        Genre::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Sports => "sports",
            Genre::Entertainment => "entertainment",
            Genre::Documentary => "documentary",
            Genre::Other => "other",
        }
    }

    /// Parses a classifier answer. Surrounding whitespace, quotes, and a
    /// trailing period are ignored; matching is case-insensitive.
    pub fn parse_tag(raw: &str) -> Option<Self> {
        let tag = raw
            .trim()
            .trim_end_matches('.')
            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .trim()
            .to_ascii_lowercase();
        Genre::ALL.into_iter().find(|g| g.as_str() == tag)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
