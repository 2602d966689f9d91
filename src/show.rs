//! Asset inspection for the `show` command.

use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::sqlite_store::SqliteAssetStore;

#[derive(Debug, Clone, Serialize)]
pub struct AssetView {
    pub id: String,
    pub file_location: String,
    pub file_name: String,
    pub source: String,
    pub file_category: Option<String>,
    pub content_type: Option<String>,
    pub created_at: String, // ISO8601
    pub updated_at: String, // ISO8601
    pub metadata: Map<String, Value>,
}

pub async fn get_asset_view(config: &Config, asset_id: &str) -> Result<AssetView> {
    let store = SqliteAssetStore::open(config).await?;
    let record = store.get_record(asset_id).await;
    store.close().await;

    let Some(record) = record? else {
        bail!("asset not found: {}", asset_id);
    };

    let asset = record.asset;
    Ok(AssetView {
        id: asset.id,
        file_location: asset.file_location,
        file_name: asset.file_name,
        source: asset.source.as_str().to_string(),
        file_category: asset.file_category,
        content_type: asset.content_type,
        created_at: format_ts_iso(record.created_at),
        updated_at: format_ts_iso(record.updated_at),
        metadata: asset.metadata,
    })
}

pub async fn run_show(config: &Config, asset_id: &str) -> Result<()> {
    let view = get_asset_view(config, asset_id).await?;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
