//! # Asset Insights CLI (`asset-insights`)
//!
//! ## Usage
//!
//! ```bash
//! asset-insights --config ./config/asset-insights.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `init` | Create the SQLite database and run schema migrations |
//! | `serve` | Start the push endpoint |
//! | `register <id>` | Insert or update an asset |
//! | `show <id>` | Print an asset and its metadata as JSON |
//! | `process <id>` | Run the pipeline once for a stored asset |
//! | `envelope <id>` | Print the push envelope for a stored asset |
//!
//! ## Examples
//!
//! ```bash
//! # Try the endpoint locally
//! asset-insights envelope a1 > body.json
//! curl -X POST -H 'content-type: application/json' --data @body.json localhost:8080/
//!
//! # Force the sports prompts, skipping classification
//! asset-insights process a1 --genre sports
//! ```

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use serde_json::Map;
use std::path::PathBuf;
use std::sync::Arc;

use asset_insights::config;
use asset_insights::envelope::{encode_push_envelope, AssetNotification};
use asset_insights::logging::init_logging;
use asset_insights::migrate;
use asset_insights::pipeline::{AssetPipeline, PipelineOutcome};
use asset_insights::server;
use asset_insights::show;
use asset_insights::sqlite_store::SqliteAssetStore;
use asset_insights::vertex::VertexGenerator;
use asset_insights_core::generation::FixedClassifier;
use asset_insights_core::models::{Asset, Genre, Source};

/// Asset Insights: genre-aware summaries, key sections, and categorization
/// for uploaded media assets.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/asset-insights.example.toml` for a full example.
#[derive(Parser)]
#[command(name = "asset-insights", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/asset-insights.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Start the HTTP push endpoint on `[server].bind`.
    Serve,

    /// Insert an asset, or update its descriptive fields.
    ///
    /// Existing metadata is kept.
    Register {
        /// Asset id.
        id: String,

        /// Media location (`gs://...` or a YouTube URL).
        #[arg(long)]
        location: String,

        /// Original file name.
        #[arg(long)]
        name: String,

        /// Media source: `GCS` or `youtube`.
        #[arg(long, default_value = "GCS")]
        source: String,

        /// File category assigned by ingestion (required before processing).
        #[arg(long)]
        category: Option<String>,

        /// MIME content type (required before processing).
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Print an asset and its metadata as JSON.
    Show {
        /// Asset id.
        id: String,
    },

    /// Run the pipeline once for a stored asset, without HTTP.
    Process {
        /// Asset id.
        id: String,

        /// Skip classification and use this genre
        /// (`sports`, `entertainment`, `documentary`, `other`).
        #[arg(long)]
        genre: Option<String>,
    },

    /// Print the push envelope the transport would deliver for an asset.
    Envelope {
        /// Asset id.
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    init_logging(&cfg.logging)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Serve => {
            let store = Arc::new(SqliteAssetStore::open(&cfg).await?);
            let generator = Arc::new(VertexGenerator::new(&cfg.generation)?);
            let pipeline = Arc::new(AssetPipeline::from_config(&cfg, store, generator));
            server::run_server(&cfg, pipeline).await?;
        }
        Commands::Register {
            id,
            location,
            name,
            source,
            category,
            content_type,
        } => {
            let source =
                Source::parse(&source).ok_or_else(|| anyhow!("unknown source: '{}'", source))?;
            let asset = Asset {
                id,
                file_location: location,
                file_name: name,
                source,
                file_category: category,
                content_type,
                metadata: Map::new(),
            };
            let store = SqliteAssetStore::open(&cfg).await?;
            store.put_asset(&asset).await?;
            store.close().await;
            println!("Registered asset {}", asset.id);
        }
        Commands::Show { id } => {
            show::run_show(&cfg, &id).await?;
        }
        Commands::Process { id, genre } => {
            let store = Arc::new(SqliteAssetStore::open(&cfg).await?);
            let notification = load_notification(&store, &id).await?;
            let generator = Arc::new(VertexGenerator::new(&cfg.generation)?);

            let pipeline = match genre {
                Some(tag) => {
                    let genre = Genre::parse_tag(&tag)
                        .ok_or_else(|| anyhow!("unknown genre: '{}'", tag))?;
                    AssetPipeline::new(
                        store.clone(),
                        Arc::new(FixedClassifier(genre)),
                        generator,
                        cfg.generation.model.clone(),
                        cfg.pipeline.concurrent_tasks,
                    )
                }
                None => AssetPipeline::from_config(&cfg, store.clone(), generator),
            };

            let outcome = Arc::new(pipeline).handle_isolated(notification).await;
            store.close().await;
            report(&id, &outcome);
        }
        Commands::Envelope { id } => {
            let store = SqliteAssetStore::open(&cfg).await?;
            let notification = load_notification(&store, &id).await;
            store.close().await;
            let envelope = encode_push_envelope(&notification?);
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
    }

    Ok(())
}

async fn load_notification(store: &SqliteAssetStore, id: &str) -> Result<AssetNotification> {
    let Some(record) = store.get_record(id).await? else {
        bail!("asset not found: {}", id);
    };
    let asset = record.asset;
    Ok(AssetNotification {
        asset_id: asset.id,
        file_location: asset.file_location,
        file_name: asset.file_name,
        source: asset.source,
    })
}

fn report(id: &str, outcome: &PipelineOutcome) {
    match outcome {
        PipelineOutcome::AssetNotFound => println!("{}: asset not found", id),
        PipelineOutcome::PrerequisiteMissing(missing) => {
            println!("{}: missing {}", id, missing.join(", "))
        }
        PipelineOutcome::Processed { status, genre } => {
            println!("{}: {} (genre: {})", id, status, genre)
        }
        PipelineOutcome::Aborted(err) => println!("{}: aborted: {}", id, err),
    }
}
