use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tableconfigs::TableConfigsError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    TableConfigs(#[from] TableConfigsError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metrics are disabled")]
    MetricsDisabled,

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ServerError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::TableConfigs(err) => match err {
                TableConfigsError::MalformedInput(_)
                | TableConfigsError::Validation(_)
                | TableConfigsError::UnknownTuner { .. } => StatusCode::BAD_REQUEST,
                TableConfigsError::AlreadyExists { .. } => StatusCode::CONFLICT,
                TableConfigsError::NotFound { .. } => StatusCode::NOT_FOUND,
                TableConfigsError::DerivationInvariant { .. }
                | TableConfigsError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
                TableConfigsError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound | ServerError::MetricsDisabled => StatusCode::NOT_FOUND,
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ServerError::TableConfigs(err) => err.code(),
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::MetricsDisabled => "METRICS_DISABLED",
            ServerError::NotFound => "NOT_FOUND",
        }
    }

    /// Structured context for the failure, when there is any.
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ServerError::TableConfigs(TableConfigsError::Validation(violation)) => Some(json!({
                "pointer": violation.pointer(),
                "reason": violation.to_string(),
            })),
            ServerError::TableConfigs(TableConfigsError::UnknownTuner {
                table_type, tuner, ..
            }) => Some(json!({
                "tableType": table_type.to_string(),
                "tuner": tuner,
            })),
            ServerError::TableConfigs(
                TableConfigsError::AlreadyExists { name } | TableConfigsError::NotFound { name },
            ) => Some(json!({ "tableName": name })),
            _ => None,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("Invalid address: {err}"))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Config(err.to_string())
    }
}

impl From<store::StoreError> for ServerError {
    fn from(err: store::StoreError) -> Self {
        ServerError::TableConfigs(err.into())
    }
}
