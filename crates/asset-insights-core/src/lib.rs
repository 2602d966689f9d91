//! # Asset Insights Core
//!
//! Runtime-agnostic logic for Asset Insights: the asset data model, the
//! genre → prompt-set table, response schemas, the generation and store
//! traits, and the consolidation of task outcomes into one metadata
//! update.
//!
//! This crate contains no tokio, sqlx, HTTP client, or other I/O
//! dependencies. Network-facing implementations of [`generation::Generator`]
//! and [`store::AssetStore`] live in the `asset-insights` crate.
//!
//! ```text
//!   Classifier ──▶ genre ──▶ prompts::select ──▶ Generator (x3)
//!                                                   │
//!                          TaskResult ×3 ◀──────────┘
//!                               │
//!                      consolidate::consolidate
//!                               │
//!                      AssetStore::update_asset_metadata
//! ```

pub mod consolidate;
pub mod generation;
pub mod models;
pub mod prompts;
pub mod schema;
pub mod store;
pub mod task;
