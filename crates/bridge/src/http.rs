//! Engine-facing HTTP endpoints.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use botomy_core::api::ErrorBody;
use botomy_core::{ActionBatch, ResetResponse, Snapshot};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::store::RendezvousStore;

/// Router state.
#[derive(Clone)]
pub struct AppState {
    store: Arc<RendezvousStore>,
}

/// Engine-facing routes: `POST /` (ingress) and `GET /reset` (reset negotiation).
pub fn router(store: Arc<RendezvousStore>) -> Router {
    let state = AppState { store };
    Router::new()
        .route("/", post(play))
        .route("/reset", get(reset))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve [`router`] on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: tokio::net::TcpListener,
    store: Arc<RendezvousStore>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn healthz() -> &'static str {
    "ok"
}

// The body is parsed by hand: engines do not reliably send a JSON content type.
async fn play(State(st): State<AppState>, body: Bytes) -> Result<Json<ActionBatch>, ApiError> {
    let snapshot: Snapshot =
        serde_json::from_slice(&body).map_err(ApiError::MalformedSnapshot)?;
    Ok(Json(st.store.ingest(snapshot).await))
}

async fn reset(State(st): State<AppState>) -> Json<ResetResponse> {
    Json(st.store.poll_reset().await.into())
}

/// Request failures answered with a JSON error body.
#[derive(Debug)]
pub enum ApiError {
    /// `POST /` body did not parse as a snapshot.
    MalformedSnapshot(serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, msg) = match self {
            ApiError::MalformedSnapshot(e) => {
                tracing::warn!(error = %e, "rejected malformed snapshot");
                (StatusCode::UNPROCESSABLE_ENTITY, format!("malformed snapshot: {e}"))
            }
        };
        (code, Json(ErrorBody { error: msg })).into_response()
    }
}
