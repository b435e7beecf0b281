//! API route handlers
//!
//! - `health`: liveness, readiness, metrics and server metadata
//! - `table_configs`: the composite table config lifecycle

pub mod health;
pub mod table_configs;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info (GET /)
///
/// ```json
/// {
///   "name": "TableConfigs Server",
///   "version": "0.1.0",
///   "api_version": "v1",
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "TableConfigs Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "GET /configs",
            "POST /configs",
            "POST /configs/validate",
            "GET /configs/{name}",
            "PUT /configs/{name}",
            "DELETE /configs/{name}",
            "GET /health",
            "GET /ready",
            "GET /metrics",
            "GET /metadata"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
