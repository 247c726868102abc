//! HTTP server mode: trigger runs and manage subscribers over REST

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::{authorize, rejection, require_api_key, AuthDecision};
use crate::config::Settings;
use crate::engine::ScrapeEngine;
use crate::error::{Error, Result};

/// App state shared across handlers
pub struct AppState {
    pub settings: Arc<Settings>,
    pub engine: Arc<ScrapeEngine>,
}

impl AppState {
    /// Create shared state
    pub fn new(settings: Arc<Settings>, engine: Arc<ScrapeEngine>) -> Arc<Self> {
        Arc::new(Self { settings, engine })
    }
}

/// Query string for unsubscribe
#[derive(Debug, Deserialize)]
struct UnsubscribeQuery {
    #[serde(default)]
    token: Option<String>,
}

/// Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub(crate) fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Status code for an error surfaced by a handler
fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Validation { .. } => StatusCode::BAD_REQUEST,
        Error::Unauthorized { .. } => StatusCode::FORBIDDEN,
        Error::RunInProgress => StatusCode::CONFLICT,
        Error::State { .. } | Error::Registry { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &Error) -> Response {
    let status = status_for(error);
    if status.is_server_error() {
        tracing::error!(error = %error, "Request failed");
    }
    (status, Json(ApiResponse::<()>::error(error.to_string()))).into_response()
}

fn respond<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(data) => Json(ApiResponse::success(data)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Build the router
pub fn router(state: Arc<AppState>) -> Router {
    // Build CORS layer - allow all origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/scrape", get(scrape).post(scrape))
        .route("/checkpoints", get(checkpoints))
        .route("/subscribers", get(subscribers))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(health))
        .route("/subscribe/:email", post(subscribe))
        .route("/unsubscribe/:email", get(unsubscribe).post(unsubscribe))
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server
pub async fn serve(settings: Arc<Settings>, engine: Arc<ScrapeEngine>, port: u16) -> Result<()> {
    if settings.api_key.is_none() {
        tracing::warn!("LISTWATCH_API_KEY is not set; protected routes will reject every request");
    }

    let app = router(AppState::new(settings, engine));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Run every source once
async fn scrape(State(state): State<Arc<AppState>>) -> Response {
    respond(state.engine.run(&state.settings.sources).await)
}

/// Stored checkpoint per source
async fn checkpoints(State(state): State<Arc<AppState>>) -> Response {
    respond(state.engine.checkpoints().await)
}

/// Subscriber addresses; tokens are never exposed here
async fn subscribers(State(state): State<Arc<AppState>>) -> Response {
    let result = state.engine.registry().list().await.map(|list| {
        let addresses: Vec<String> = list.into_iter().map(|s| s.address).collect();
        json!({ "count": addresses.len(), "subscribers": addresses })
    });
    respond(result)
}

/// Add a subscriber
async fn subscribe(State(state): State<Arc<AppState>>, Path(email): Path<String>) -> Response {
    match state.engine.registry().add(&email).await {
        Ok(outcome) => {
            let status = if outcome.added {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(ApiResponse::success(outcome))).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// Remove a subscriber.
///
/// With tokens the token authorizes the removal; a plain list has no
/// per-subscriber secret, so the API key is required instead.
async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
    Query(query): Query<UnsubscribeQuery>,
    headers: HeaderMap,
) -> Response {
    let registry = state.engine.registry();

    if !registry.issues_tokens() {
        let decision = authorize(&headers, state.settings.api_key.as_deref());
        if decision != AuthDecision::Allowed {
            return rejection(decision);
        }
    }

    let result = registry
        .remove(&email, query.token.as_deref())
        .await
        .map(|removed| json!({ "address": email.trim().to_lowercase(), "removed": removed }));
    respond(result)
}
