//! HTTP API
//!
//! JSON REST surface over the `InterviewService`, mounted under `/api/v1`:
//!
//! - `GET  /health`
//! - `GET  /interview/languages`, `GET /interview/languages/:code`
//! - `GET  /interview/experience-levels`
//! - `POST /interview/start`
//! - `POST /interview/prompt-preview`
//! - `POST /interview/:id/answer`
//! - `POST /interview/:id/pause`, `/resume`, `/complete`
//! - `GET  /interview/:id/progress`
//! - `POST /ai/generate-text`
//!
//! Failures render as `{"error": {"code", "message", "hint"}}`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Json, Router};
use sdk::errors::EngineError;
use sdk::types::{
    CompletionSummary, ExperienceLevelInfo, GenerateTextRequest, GenerateTextResponse,
    HealthResponse, LanguageInfo, Progress, PromptPreview, PromptPreviewRequest, StartInterviewRequest, StartInterviewResponse, SubmitAnswerRequest,
    TransitionResponse, TurnResponse,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};

use crate::interview::InterviewService;

pub mod error;

pub use error::ApiError;

type AppState = Arc<InterviewService>;
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Build the application router
pub fn router(service: Arc<InterviewService>, cors_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/interview/languages", get(languages))
        .route("/interview/languages/:code", get(language))
        .route("/interview/experience-levels", get(experience_levels))
        .route("/interview/start", post(start))
        .route("/interview/prompt-preview", post(prompt_preview))
        .route("/interview/:id/answer", post(submit_answer))
        .route("/interview/:id/pause", post(pause))
        .route("/interview/:id/resume", post(resume))
        .route("/interview/:id/complete", post(complete))
        .route("/interview/:id/progress", get(progress))
        .route("/ai/generate-text", post(generate_text));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(cors_origins))
        .with_state(service)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o.trim() == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.trim().parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(
    service: Arc<InterviewService>,
    addr: &str,
    cors_origins: &[String],
) -> Result<(), EngineError> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| EngineError::Config(format!("Invalid bind address '{}': {}", addr, e)))?;
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;

    info!("Viva API listening on http://{}/api/v1", local);

    axum::serve(listener, router(service, cors_origins))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down API server");
        })
        .await?;

    Ok(())
}

async fn health(State(service): State<AppState>) -> Json<HealthResponse> {
    Json(service.health())
}

async fn languages(State(service): State<AppState>) -> Json<Vec<LanguageInfo>> {
    Json(service.languages())
}

async fn language(
    State(service): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<LanguageInfo>, ApiError> {
    Ok(Json(service.language(&code)?))
}

async fn experience_levels(State(service): State<AppState>) -> Json<Vec<ExperienceLevelInfo>> {
    Json(service.experience_levels())
}

async fn start(
    State(service): State<AppState>,
    payload: Result<Json<StartInterviewRequest>, JsonRejection>,
) -> ApiResult<StartInterviewResponse> {
    let Json(request) = payload?;
    Ok(Json(service.start(request).await?))
}

async fn prompt_preview(
    State(service): State<AppState>,
    payload: Result<Json<PromptPreviewRequest>, JsonRejection>,
) -> ApiResult<PromptPreview> {
    let Json(request) = payload?;
    Ok(Json(service.prompt_preview(&request)?))
}

async fn submit_answer(
    State(service): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SubmitAnswerRequest>, JsonRejection>,
) -> ApiResult<TurnResponse> {
    let Json(request) = payload?;
    Ok(Json(service.submit_answer(&id, request).await?))
}

async fn pause(
    State(service): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<TransitionResponse> {
    Ok(Json(service.pause(&id).await?))
}

async fn resume(
    State(service): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<TransitionResponse> {
    Ok(Json(service.resume(&id).await?))
}

async fn complete(
    State(service): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<CompletionSummary> {
    Ok(Json(service.complete(&id).await?))
}

async fn progress(State(service): State<AppState>, Path(id): Path<String>) -> ApiResult<Progress> {
    Ok(Json(service.progress(&id).await?))
}

async fn generate_text(
    State(service): State<AppState>,
    payload: Result<Json<GenerateTextRequest>, JsonRejection>,
) -> ApiResult<GenerateTextResponse> {
    let Json(request) = payload?;
    Ok(Json(service.generate_text(request).await?))
}
