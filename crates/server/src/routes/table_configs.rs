//! Composite table config endpoints.
//!
//! Handlers take the raw request body as text and hand it to the controller
//! untouched, so unknown keys survive long enough to be reported back under
//! `unrecognizedProperties`. Every controller call hits the store and runs on
//! the blocking pool.
//!
//! `/configs/validate` is matched before `/configs/{name}`, so a table named
//! `validate` can be created but is only reachable through the list endpoint
//! over HTTP.

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use tableconfigs::{TableConfigsController, TableConfigsError};

/// Run a controller call on the blocking pool and count its outcome.
async fn run<T, F>(state: &ServerState, op: &'static str, f: F) -> ServerResult<T>
where
    F: FnOnce(&TableConfigsController) -> Result<T, TableConfigsError> + Send + 'static,
    T: Send + 'static,
{
    let controller = state.controller.clone();
    let result = tokio::task::spawn_blocking(move || f(&controller))
        .await
        .map_err(|e| ServerError::Internal(format!("{op} task failed: {e}")))?;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(err) => err.code(),
    };
    metrics::counter!("tableconfigs_operations_total", "op" => op, "outcome" => outcome)
        .increment(1);

    result.map_err(ServerError::from)
}

/// GET /configs
///
/// A JSON array of strings, each one stored envelope serialized, ordered by
/// table name.
pub async fn list(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let documents = run(&state, "list", |c| c.list()).await?;
    Ok(Json(documents))
}

/// POST /configs
pub async fn create(
    State(state): State<Arc<ServerState>>,
    body: String,
) -> ServerResult<impl IntoResponse> {
    let outcome = run(&state, "create", move |c| c.create(&body)).await?;
    Ok(Json(outcome))
}

/// POST /configs/validate
///
/// Dry run: decode and validate, never persist.
pub async fn validate(
    State(state): State<Arc<ServerState>>,
    body: String,
) -> ServerResult<impl IntoResponse> {
    let outcome = run(&state, "validate", move |c| c.validate(&body)).await?;
    Ok(Json(outcome))
}

/// GET /configs/{name}
pub async fn get(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let table_configs = run(&state, "get", move |c| c.get(&name)).await?;
    Ok(Json(table_configs))
}

/// PUT /configs/{name}
pub async fn update(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
    body: String,
) -> ServerResult<impl IntoResponse> {
    let outcome = run(&state, "update", move |c| c.update(&name, &body)).await?;
    Ok(Json(outcome))
}

/// DELETE /configs/{name}
pub async fn delete(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let status = run(&state, "delete", move |c| c.delete(&name)).await?;
    Ok(Json(json!({ "status": status })))
}
