//! HTTP push endpoint.
//!
//! Receives push-subscription deliveries and hands each decoded
//! notification to the [`AssetPipeline`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/` | Push delivery; runs the pipeline for one asset |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Response contract
//!
//! | Situation | Status | Body |
//! |-----------|--------|------|
//! | envelope cannot be decoded | `400` | `Bad Request: <reason>` (plain text) |
//! | anything else | `204` | empty |
//!
//! A `4xx` tells the transport the message is poison. `204` is returned even
//! when processing failed: the outcome is recorded on the asset, and a
//! redelivery would only repeat the same expensive model calls.
//!
//! The response is sent after processing finishes, so the transport's ack
//! deadline must cover a full run.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::envelope::decode_push_envelope;
use crate::pipeline::AssetPipeline;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<AssetPipeline>,
}

/// Builds the router without binding, so tests can serve it on any listener.
pub fn router(pipeline: Arc<AssetPipeline>) -> Router {
    Router::new()
        .route("/", post(handle_push))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { pipeline })
}

/// Binds to `[server].bind` and serves until the process is terminated.
pub async fn run_server(config: &Config, pipeline: Arc<AssetPipeline>) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::info!(
        bind = %bind_addr,
        model = %config.generation.model,
        region = %config.generation.region,
        "push endpoint listening"
    );

    axum::serve(listener, router(pipeline)).await?;
    Ok(())
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST / ============

async fn handle_push(State(state): State<AppState>, body: Bytes) -> Response {
    let span = tracing::info_span!("asset_notification", request_id = %Uuid::new_v4());

    async move {
        let notification = match decode_push_envelope(&body) {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "rejecting push message");
                return (StatusCode::BAD_REQUEST, format!("Bad Request: {}", e)).into_response();
            }
        };

        let asset_id = notification.asset_id.clone();
        let outcome = state.pipeline.clone().handle_isolated(notification).await;
        tracing::info!(asset_id = %asset_id, outcome = outcome.label(), "notification handled");

        StatusCode::NO_CONTENT.into_response()
    }
    .instrument(span)
    .await
}
