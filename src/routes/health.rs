//! Health check endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::state::AppState;
use crud_controller::{ApiError, Envelope};
use data_access::RoutineExecutor;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /health; 503 when the database does not answer
async fn health<E: RoutineExecutor + 'static>(
    State(state): State<AppState<E>>,
) -> Result<Envelope<HealthResponse>, ApiError> {
    state.procedures.ping().await.map_err(|e| {
        ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", "Database unavailable")
            .with_details(serde_json::Value::String(e.to_string()))
            .with_source(e)
    })?;

    Ok(Envelope::success(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// Health routes
pub fn router<E: RoutineExecutor + 'static>() -> Router<AppState<E>> {
    Router::new().route("/health", get(health::<E>))
}
