//! Push-subscription envelope decoding.
//!
//! The transport delivers:
//!
//! ```json
//! { "message": { "data": "<base64 of JSON>" } }
//! ```
//!
//! with the inner payload
//!
//! ```json
//! { "asset_id": "...", "file_location": "...", "file_name": "...", "source": "GCS" }
//! ```
//!
//! `source` is optional and defaults to `GCS`. Empty strings count as absent.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use asset_insights_core::models::{MediaRef, Source};

/// A decoded "asset uploaded" notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetNotification {
    pub asset_id: String,
    pub file_location: String,
    pub file_name: String,
    pub source: Source,
}

impl AssetNotification {
    pub fn media(&self) -> MediaRef {
        MediaRef::new(self.file_location.clone(), self.source)
    }
}

/// Why an inbound message was rejected. Every variant maps to `400`.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("invalid push message format: missing 'message' key")]
    MissingMessage,

    #[error("push message has no 'data' field")]
    MissingData,

    #[error("message data is not valid base64: {0}")]
    Base64(String),

    #[error("message data is not a JSON object: {0}")]
    Payload(String),

    #[error("message missing required data: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("unknown source: '{0}'")]
    UnknownSource(String),
}

#[derive(Deserialize)]
struct PushBody {
    message: Option<PushMessage>,
}

#[derive(Deserialize)]
struct PushMessage {
    data: Option<String>,
}

/// Decodes a raw push request body into an [`AssetNotification`].
pub fn decode_push_envelope(body: &[u8]) -> Result<AssetNotification, EnvelopeError> {
    let body: PushBody =
        serde_json::from_slice(body).map_err(|e| EnvelopeError::InvalidJson(e.to_string()))?;
    let message = body.message.ok_or(EnvelopeError::MissingMessage)?;
    let data = message.data.ok_or(EnvelopeError::MissingData)?;

    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| EnvelopeError::Base64(e.to_string()))?;
    let payload: Value =
        serde_json::from_slice(&bytes).map_err(|e| EnvelopeError::Payload(e.to_string()))?;
    let payload = payload
        .as_object()
        .ok_or_else(|| EnvelopeError::Payload("expected an object".to_string()))?;

    let field = |name: &str| -> Option<String> {
        payload
            .get(name)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    let asset_id = field("asset_id");
    let file_location = field("file_location");
    let file_name = field("file_name");
    let source = match payload.get("source") {
        None | Some(Value::Null) => Some(Source::Gcs.as_str().to_string()),
        Some(_) => field("source"),
    };

    let mut missing = Vec::new();
    if asset_id.is_none() {
        missing.push("asset_id");
    }
    if file_location.is_none() {
        missing.push("file_location");
    }
    if file_name.is_none() {
        missing.push("file_name");
    }
    if source.is_none() {
        missing.push("source");
    }

    match (asset_id, file_location, file_name, source) {
        (Some(asset_id), Some(file_location), Some(file_name), Some(source)) => {
            let source =
                Source::parse(&source).ok_or(EnvelopeError::UnknownSource(source))?;
            Ok(AssetNotification {
                asset_id,
                file_location,
                file_name,
                source,
            })
        }
        _ => Err(EnvelopeError::MissingFields(missing)),
    }
}

/// Builds the push envelope the transport would deliver for `notification`.
pub fn encode_push_envelope(notification: &AssetNotification) -> Value {
    let inner = serde_json::json!({
        "asset_id": notification.asset_id,
        "file_location": notification.file_location,
        "file_name": notification.file_name,
        "source": notification.source.as_str(),
    });
    serde_json::json!({
        "message": { "data": STANDARD.encode(inner.to_string()) }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wrap(inner: Value) -> Vec<u8> {
        json!({"message": {"data": STANDARD.encode(inner.to_string())}})
            .to_string()
            .into_bytes()
    }

    #[test]
    fn test_decode_valid() {
        let n = decode_push_envelope(&wrap(json!({
            "asset_id": "a1",
            "file_location": "https://youtu.be/x",
            "file_name": "x",
            "source": "youtube"
        })))
        .unwrap();
        assert_eq!(n.asset_id, "a1");
        assert_eq!(n.source, Source::Youtube);
        assert_eq!(n.media().source.mime_type_hint(), "video/youtube");
    }

    #[test]
    fn test_source_defaults_to_gcs() {
        let n = decode_push_envelope(&wrap(json!({
            "asset_id": "a1",
            "file_location": "gs://b/a1.mp4",
            "file_name": "a1.mp4"
        })))
        .unwrap();
        assert_eq!(n.source, Source::Gcs);
    }

    #[test]
    fn test_each_required_field_is_enforced() {
        for missing in ["asset_id", "file_location", "file_name"] {
            let mut inner = json!({
                "asset_id": "a1",
                "file_location": "gs://b/a1.mp4",
                "file_name": "a1.mp4"
            });
            inner.as_object_mut().unwrap().remove(missing);
            match decode_push_envelope(&wrap(inner)) {
                Err(EnvelopeError::MissingFields(f)) => assert_eq!(f, vec![missing]),
                other => panic!("expected MissingFields for {}, got {:?}", missing, other),
            }
        }
    }

    #[test]
    fn test_empty_source_is_missing() {
        let err = decode_push_envelope(&wrap(json!({
            "asset_id": "a1",
            "file_location": "gs://b/a1.mp4",
            "file_name": "a1.mp4",
            "source": ""
        })))
        .unwrap_err();
        assert!(matches!(err, EnvelopeError::MissingFields(ref f) if f == &vec!["source"]));
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let err = decode_push_envelope(&wrap(json!({
            "asset_id": "",
            "file_location": "gs://b/a1.mp4",
            "file_name": "a1.mp4"
        })))
        .unwrap_err();
        assert!(err.to_string().contains("asset_id"));
    }

    #[test]
    fn test_malformed_envelopes() {
        assert!(matches!(
            decode_push_envelope(b"not json"),
            Err(EnvelopeError::InvalidJson(_))
        ));
        assert!(matches!(
            decode_push_envelope(br#"{"foo": 1}"#),
            Err(EnvelopeError::MissingMessage)
        ));
        assert!(matches!(
            decode_push_envelope(br#"{"message": {}}"#),
            Err(EnvelopeError::MissingData)
        ));
        assert!(matches!(
            decode_push_envelope(br#"{"message": {"data": "!!!"}}"#),
            Err(EnvelopeError::Base64(_))
        ));
        let not_object = json!({"message": {"data": STANDARD.encode("[1,2]")}}).to_string();
        assert!(matches!(
            decode_push_envelope(not_object.as_bytes()),
            Err(EnvelopeError::Payload(_))
        ));
    }

    #[test]
    fn test_unknown_source_rejected() {
        let err = decode_push_envelope(&wrap(json!({
            "asset_id": "a1",
            "file_location": "s3://b/a1.mp4",
            "file_name": "a1.mp4",
            "source": "s3"
        })))
        .unwrap_err();
        assert!(matches!(err, EnvelopeError::UnknownSource(ref s) if s == "s3"));
    }

    #[test]
    fn test_encode_then_decode() {
        let n = AssetNotification {
            asset_id: "a9".into(),
            file_location: "gs://b/a9.mp4".into(),
            file_name: "a9.mp4".into(),
            source: Source::Gcs,
        };
        let body = encode_push_envelope(&n).to_string();
        assert_eq!(decode_push_envelope(body.as_bytes()).unwrap(), n);
    }
}
