//! HTTP chat server.
//!
//! Exposes the answering pipeline to the mobile and web frontends.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/chat` | Answer one question |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Chat Contract
//!
//! Request:
//!
//! ```json
//! { "userMessage": "[Context: College of Engineering] Where is the dean's office?" }
//! ```
//!
//! `category` may be sent as a separate field; it then takes precedence
//! over any `[Context: …]` tag, which is still stripped from the question.
//!
//! Every request is answered with `200`. A body that is not a JSON object
//! with a string `userMessage` is treated as an empty question. Internal
//! failures become a degraded reply with a stable reason code:
//!
//! ```json
//! { "reply": "I can't reach the knowledge base right now.",
//!   "outcome": "degraded", "reason": "retrieval_failed",
//!   "category": "College of Engineering" }
//! ```
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the Expo web build
//! and local development servers can call the API.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use navi_core::pipeline::PipelineRun;
use navi_core::{AnswerOutcome, AnsweringPipeline, DegradeReason};

use crate::config::Config;
use crate::pipeline::build_pipeline;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<AnsweringPipeline>,
}

/// Starts the chat server from configuration.
///
/// Builds the pipeline, binds to `[server].bind`, and serves until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config).await?;
    serve(Arc::new(pipeline), &config.server.bind).await
}

/// Serve `pipeline` on `bind_addr`.
pub async fn serve(pipeline: Arc<AnsweringPipeline>, bind_addr: &str) -> anyhow::Result<()> {
    let app = router(pipeline);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %bind_addr, "chat server listening");
    println!("Navi server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the router with CORS and request tracing applied.
pub fn router(pipeline: Arc<AnsweringPipeline>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { pipeline })
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` when the server is running.
    status: String,
    /// The crate version from `Cargo.toml`.
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/chat ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub user_message: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub reply: String,
    /// `"answered"` or `"degraded"`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// The category the question was scoped to, once parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Handler for `POST /api/chat`.
///
/// A missing or null `userMessage` is treated as an empty question and
/// degrades to `invalid_query`. So does a body that fails to deserialize,
/// so clients always get the same response shape.
async fn handle_chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatResponse> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!(error = %rejection, "unreadable chat request");
            return Json(ChatResponse::from_outcome(
                AnswerOutcome::degraded(DegradeReason::InvalidQuery),
                None,
            ));
        }
    };

    let message = req.user_message.unwrap_or_default();
    let run = match req.category.as_deref() {
        Some(category) => state.pipeline.run_scoped(category, &message).await,
        None => state.pipeline.run(&message).await,
    };

    Json(ChatResponse::from_run(run))
}

impl ChatResponse {
    fn from_run(run: PipelineRun) -> Self {
        Self::from_outcome(run.outcome, run.query.map(|q| q.category))
    }

    fn from_outcome(outcome: AnswerOutcome, category: Option<String>) -> Self {
        let reason = outcome.reason().map(|r| r.code().to_string());
        let label = if outcome.is_answered() { "answered" } else { "degraded" };
        Self {
            reply: outcome.reply().to_string(),
            outcome: label.to_string(),
            reason,
            category,
        }
    }
}
