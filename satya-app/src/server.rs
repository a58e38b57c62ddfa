//! `satya serve`: the analysis pipeline behind a small JSON API.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
};
use satya_analyzer::{AnalysisRequest, Analyzer, CombinedReport, Credentials};
use satya_common::{ErrorKind, SatyaError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Clone)]
pub struct AppState {
    analyzer: Arc<Analyzer>,
    credentials: Arc<Credentials>,
}

impl AppState {
    pub fn new(analyzer: Analyzer, credentials: Credentials) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            credentials: Arc::new(credentials),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeBody {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

fn status_for(err: &SatyaError) -> StatusCode {
    match err.kind() {
        ErrorKind::Input => StatusCode::BAD_REQUEST,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    tracing::info!(port, "server.listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Json<CombinedReport>, ApiError> {
    let Json(body) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "server.analyze.bad_body");
        api_error(StatusCode::BAD_REQUEST, "No text provided")
    })?;
    let text = body
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "No text provided"))?;

    let request = AnalysisRequest::new(text, (*state.credentials).clone());
    match state.analyzer.analyze(&request).await {
        Ok(report) => Ok(Json(report)),
        Err(err) => Err(api_error(status_for(&err), err.to_string())),
    }
}
