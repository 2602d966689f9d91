//! SQLite-backed [`AssetStore`].
//!
//! One row per asset. The metadata document lives as JSON text in
//! `metadata_json`; namespace merges run inside an immediate transaction
//! so two writers cannot interleave a read and a write.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnection, SqlitePool, SqliteRow};
use sqlx::Row;

use asset_insights_core::models::{Asset, MetadataNamespace, Source};
use asset_insights_core::store::{merge_namespace, AssetStore};

use crate::config::Config;
use crate::db;

/// An asset row with its bookkeeping timestamps (unix seconds).
#[derive(Debug, Clone)]
pub struct AssetRecord {
    pub asset: Asset,
    pub created_at: i64,
    pub updated_at: i64,
}

pub struct SqliteAssetStore {
    pool: SqlitePool,
}

impl SqliteAssetStore {
    /// Connects to the database named in `[db].path`. Run migrations first.
    pub async fn open(config: &Config) -> Result<Self> {
        Ok(Self::from_pool(db::connect(config).await?))
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Inserts an asset, or updates its descriptive fields if it exists.
    ///
    /// The stored metadata document is kept on update; `asset.metadata`
    /// only seeds new rows.
    pub async fn put_asset(&self, asset: &Asset) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let metadata_json = serde_json::to_string(&asset.metadata)?;

        sqlx::query(
            r#"
            INSERT INTO assets (id, file_location, file_name, source, file_category,
                                content_type, metadata_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                file_location = excluded.file_location,
                file_name = excluded.file_name,
                source = excluded.source,
                file_category = excluded.file_category,
                content_type = excluded.content_type,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&asset.id)
        .bind(&asset.file_location)
        .bind(&asset.file_name)
        .bind(asset.source.as_str())
        .bind(&asset.file_category)
        .bind(&asset.content_type)
        .bind(&metadata_json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_record(&self, asset_id: &str) -> Result<Option<AssetRecord>> {
        let row = sqlx::query(
            "SELECT id, file_location, file_name, source, file_category, content_type, \
             metadata_json, created_at, updated_at FROM assets WHERE id = ?",
        )
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| record_from_row(&r)).transpose()
    }
}

fn record_from_row(row: &SqliteRow) -> Result<AssetRecord> {
    let id: String = row.get("id");
    let source: String = row.get("source");
    let source = Source::parse(&source)
        .ok_or_else(|| anyhow!("asset {} has unknown source '{}'", id, source))?;
    let metadata_json: String = row.get("metadata_json");
    let metadata = parse_metadata(&metadata_json)
        .with_context(|| format!("asset {} has unreadable metadata", id))?;

    Ok(AssetRecord {
        asset: Asset {
            id,
            file_location: row.get("file_location"),
            file_name: row.get("file_name"),
            source,
            file_category: row.get("file_category"),
            content_type: row.get("content_type"),
            metadata,
        },
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn parse_metadata(json: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(map) => Ok(map),
        other => bail!("expected a JSON object, found {}", other),
    }
}

async fn merge_locked(
    conn: &mut SqliteConnection,
    asset_id: &str,
    namespace: MetadataNamespace,
    fields: Map<String, Value>,
) -> Result<()> {
    let current: Option<String> = sqlx::query_scalar("SELECT metadata_json FROM assets WHERE id = ?")
        .bind(asset_id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(current) = current else {
        bail!("asset not found: {}", asset_id);
    };

    let mut metadata = parse_metadata(&current)
        .with_context(|| format!("asset {} has unreadable metadata", asset_id))?;
    merge_namespace(&mut metadata, namespace, fields);

    sqlx::query("UPDATE assets SET metadata_json = ?, updated_at = ? WHERE id = ?")
        .bind(serde_json::to_string(&metadata)?)
        .bind(chrono::Utc::now().timestamp())
        .bind(asset_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[async_trait]
impl AssetStore for SqliteAssetStore {
    async fn get_asset(&self, asset_id: &str) -> Result<Option<Asset>> {
        Ok(self.get_record(asset_id).await?.map(|r| r.asset))
    }

    async fn update_asset_metadata(
        &self,
        asset_id: &str,
        namespace: MetadataNamespace,
        fields: Map<String, Value>,
    ) -> Result<()> {
        // Take the write lock up front; a deferred transaction could fail
        // with SQLITE_BUSY when upgrading from read to write. Dropping `tx`
        // before commit rolls it back.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        merge_locked(&mut *tx, asset_id, namespace, fields).await?;
        tx.commit().await?;
        Ok(())
    }
}
