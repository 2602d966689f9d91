//! Storage abstraction for asset metadata.
//!
//! The [`AssetStore`] trait is the only shared resource the pipeline
//! touches. Writes are field-scoped merges into one namespace of the
//! asset's metadata document, so concurrent writers to different
//! namespaces never clobber each other. Concurrent writers to the same
//! namespace are last-writer-wins.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::models::{Asset, MetadataNamespace};

/// Abstract metadata store.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_asset`](AssetStore::get_asset) | Load an asset and its metadata |
/// | [`update_asset_metadata`](AssetStore::update_asset_metadata) | Merge fields into one namespace |
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Returns `Ok(None)` when no asset has this id.
    async fn get_asset(&self, asset_id: &str) -> Result<Option<Asset>>;

    /// Shallow-merges `fields` into the `namespace` object of the asset's
    /// metadata. Keys not in `fields` are kept; keys in `fields` overwrite,
    /// including with `null`. Fails if the asset does not exist.
    async fn update_asset_metadata(
        &self,
        asset_id: &str,
        namespace: MetadataNamespace,
        fields: Map<String, Value>,
    ) -> Result<()>;
}

/// Applies the merge semantics of [`AssetStore::update_asset_metadata`]
/// to an in-memory metadata document.
pub fn merge_namespace(
    metadata: &mut Map<String, Value>,
    namespace: MetadataNamespace,
    fields: Map<String, Value>,
) {
    let slot = metadata
        .entry(namespace.as_str())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(existing) = slot {
        for (k, v) in fields {
            existing.insert(k, v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_merge_creates_namespace() {
        let mut doc = Map::new();
        merge_namespace(&mut doc, MetadataNamespace::Summary, obj(json!({"status": "processing"})));
        assert_eq!(Value::Object(doc), json!({"summary": {"status": "processing"}}));
    }

    #[test]
    fn test_merge_keeps_unmentioned_keys() {
        let mut doc = obj(json!({"summary": {"status": "processing", "old": 1}, "other": true}));
        merge_namespace(
            &mut doc,
            MetadataNamespace::Summary,
            obj(json!({"status": "completed", "error_message": null})),
        );
        assert_eq!(
            Value::Object(doc),
            json!({
                "summary": {"status": "completed", "old": 1, "error_message": null},
                "other": true
            })
        );
    }

    #[test]
    fn test_merge_replaces_non_object_namespace() {
        let mut doc = obj(json!({"video_details": "legacy"}));
        merge_namespace(
            &mut doc,
            MetadataNamespace::VideoDetails,
            obj(json!({"content_genre": "sports"})),
        );
        assert_eq!(doc["video_details"], json!({"content_genre": "sports"}));
    }
}
