use anyhow::Result;

use crate::config::Config;
use crate::db;

/// Creates the `assets` table and its indexes. Safe to run repeatedly.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assets (
            id TEXT PRIMARY KEY,
            file_location TEXT NOT NULL,
            file_name TEXT NOT NULL,
            source TEXT NOT NULL DEFAULT 'GCS',
            file_category TEXT,
            content_type TEXT,
            metadata_json TEXT NOT NULL DEFAULT '{}',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_assets_updated_at ON assets(updated_at DESC)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}
