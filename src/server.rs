use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;

use crate::ai::Evaluator;
use crate::config::ServiceConfig;
use crate::models::{Evaluation, EvaluationPayload, EvaluationRequest, ValidationError};

#[derive(Clone)]
pub struct AppState {
    evaluator: Evaluator,
    model: Arc<str>,
}

impl AppState {
    pub fn new(evaluator: Evaluator, model: &str) -> Self {
        Self {
            evaluator,
            model: Arc::from(model),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthBody<'a> {
    status: &'static str,
    model: &'a str,
}

/// Client-side failures, reported before any oracle call.
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    InvalidBody,
    PayloadTooLarge,
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            tracing::debug!(reason = %rejection.body_text(), "rejected request body");
            ApiError::InvalidBody
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::InvalidBody => (StatusCode::BAD_REQUEST, "Invalid JSON body".to_string()),
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large".to_string(),
            ),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl IntoResponse for Evaluation {
    fn into_response(self) -> Response {
        let status = if self.is_degraded() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };
        (status, Json(self.into_result())).into_response()
    }
}

async fn evaluate(
    State(state): State<AppState>,
    payload: Result<Json<EvaluationPayload>, JsonRejection>,
) -> Result<Evaluation, ApiError> {
    let Json(payload) = payload?;
    let request = EvaluationRequest::try_from(payload).inspect_err(|_| {
        tracing::warn!("evaluation request missing required fields");
    })?;
    Ok(state.evaluator.evaluate(&request).await)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthBody {
        status: "ok",
        model: &state.model,
    })
    .into_response()
}

pub fn router(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/evaluate", post(evaluate))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .with_state(state)
}

pub async fn run_server(config: &ServiceConfig, evaluator: Evaluator) -> anyhow::Result<()> {
    let app = router(AppState::new(evaluator, &config.model), config.body_limit_bytes);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %listener.local_addr()?, model = %config.model, "evaluation service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("evaluation service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
