use crate::error::{ServerError, ServerResult};
use crate::state::{ServerMetadata, ServerState};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Liveness probe. 200 whenever the process is serving.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "tableconfigs-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
    }))
}

/// Readiness probe.
///
/// Enumerates the store once; a failing store answers 503 with the store
/// error in the component map.
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let controller = state.controller.clone();
    let probe = tokio::task::spawn_blocking(move || controller.names()).await;

    let (status, store_status) = match probe {
        Ok(Ok(_)) => (StatusCode::OK, "ready".to_string()),
        Ok(Err(err)) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        Err(err) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
    };

    let body = Json(json!({
        "status": if status.is_success() { "ready" } else { "unavailable" },
        "service": "tableconfigs-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
        "components": {
            "api": "ready",
            "store": store_status,
        }
    }));
    (status, body)
}

/// Prometheus exposition of the installed recorder.
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    if !state.config.metrics_enabled {
        return Err(ServerError::MetricsDisabled);
    }
    let handle = state.metrics.as_ref().ok_or(ServerError::MetricsDisabled)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}

/// Server metadata endpoint
pub async fn server_metadata(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let metadata = ServerMetadata {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime_seconds(),
        store_backend: format!("{:?}", state.config.store.backend),
        tuners: state
            .controller
            .tuners()
            .names()
            .map(str::to_string)
            .collect(),
    };

    Ok(Json(serde_json::to_value(metadata).map_err(|e| {
        ServerError::Internal(format!("metadata serialization failed: {e}"))
    })?))
}
