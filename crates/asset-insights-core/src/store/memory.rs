//! In-memory [`AssetStore`] implementation for tests and local runs.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. Every successful metadata
//! update is also appended to a write journal so callers can assert the
//! exact sequence of writes a pipeline run produced.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::models::{Asset, MetadataNamespace};

use super::{merge_namespace, AssetStore};

/// One recorded call to [`AssetStore::update_asset_metadata`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataWrite {
    pub asset_id: String,
    pub namespace: MetadataNamespace,
    pub fields: Map<String, Value>,
    pub at: DateTime<Utc>,
}

/// In-memory store for testing.
pub struct InMemoryAssetStore {
    assets: RwLock<HashMap<String, Asset>>,
    writes: RwLock<Vec<MetadataWrite>>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self {
            assets: RwLock::new(HashMap::new()),
            writes: RwLock::new(Vec::new()),
        }
    }

    /// Inserts or replaces an asset.
    pub fn insert_asset(&self, asset: Asset) -> Result<()> {
        let mut assets = self.assets.write().map_err(|_| anyhow!("store lock poisoned"))?;
        assets.insert(asset.id.clone(), asset);
        Ok(())
    }

    /// All successful metadata writes, oldest first.
    pub fn writes(&self) -> Vec<MetadataWrite> {
        self.writes
            .read()
            .map(|w| w.clone())
            .unwrap_or_default()
    }

    /// Writes that targeted one namespace, oldest first.
    pub fn writes_to(&self, namespace: MetadataNamespace) -> Vec<MetadataWrite> {
        self.writes()
            .into_iter()
            .filter(|w| w.namespace == namespace)
            .collect()
    }
}

impl Default for InMemoryAssetStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetStore for InMemoryAssetStore {
    async fn get_asset(&self, asset_id: &str) -> Result<Option<Asset>> {
        let assets = self.assets.read().map_err(|_| anyhow!("store lock poisoned"))?;
        Ok(assets.get(asset_id).cloned())
    }

    async fn update_asset_metadata(
        &self,
        asset_id: &str,
        namespace: MetadataNamespace,
        fields: Map<String, Value>,
    ) -> Result<()> {
        {
            let mut assets = self.assets.write().map_err(|_| anyhow!("store lock poisoned"))?;
            let Some(asset) = assets.get_mut(asset_id) else {
                bail!("asset not found: {}", asset_id);
            };
            merge_namespace(&mut asset.metadata, namespace, fields.clone());
        }
        let mut writes = self.writes.write().map_err(|_| anyhow!("store lock poisoned"))?;
        writes.push(MetadataWrite {
            asset_id: asset_id.to_string(),
            namespace,
            fields,
            at: Utc::now(),
        });
        Ok(())
    }
}
