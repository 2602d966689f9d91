//! # Asset Insights
//!
//! Genre-aware metadata generation for uploaded media assets.
//!
//! An upstream ingestion process publishes an "asset uploaded" message.
//! This service receives it over a push subscription, classifies the
//! video's genre, asks a multimodal model for a summary, key sections, and
//! a detailed categorization using prompts tuned for that genre, and
//! writes the consolidated result onto the asset's metadata document.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Push envelope│──▶│   Pipeline   │──▶│  Classifier  │
//! │  (POST /)    │   │  controller  │   └──────────────┘
//! └──────────────┘   │              │   ┌──────────────┐
//!                    │              │──▶│ Task runners │──▶ Vertex AI
//!                    │              │   │  (x3, join)  │
//!                    │              │   └──────────────┘
//!                    │              │   ┌──────────────┐
//!                    │              │──▶│ Consolidator │
//!                    └──────┬───────┘   └──────────────┘
//!                           ▼
//!                    ┌──────────────┐
//!                    │ Asset store  │  summary.*, video_details.*
//!                    │   (SQLite)   │
//!                    └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! asset-insights init
//! asset-insights register a1 --location gs://media/a1.mp4 --name a1.mp4 \
//!     --category video --content-type video/mp4
//! asset-insights process a1
//! asset-insights show a1
//! asset-insights serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`logging`] | Tracing subscriber setup |
//! | [`envelope`] | Push envelope decoding |
//! | [`vertex`] | Vertex AI `generateContent` client |
//! | [`classifier`] | Model-backed genre classifier |
//! | [`tasks`] | Summary, key sections, and categorization runners |
//! | [`pipeline`] | Per-notification controller |
//! | [`server`] | HTTP push endpoint |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite asset store |
//! | [`show`] | Asset inspection |
//!
//! Data model, prompts, schemas, consolidation, and the store trait live
//! in the `asset-insights-core` crate.

pub mod classifier;
pub mod config;
pub mod db;
pub mod envelope;
pub mod logging;
pub mod migrate;
pub mod pipeline;
pub mod server;
pub mod show;
pub mod sqlite_store;
pub mod tasks;
pub mod vertex;
