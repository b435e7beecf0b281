use store::StoreError;
use thiserror::Error;

use crate::table::TableType;
use crate::validation::Violation;

/// Every way a lifecycle operation can fail.
///
/// Only [`TableConfigsError::Store`] and
/// [`TableConfigsError::DerivationInvariant`] can occur after the
/// document has been accepted as valid; everything else is rejected before
/// the store is touched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableConfigsError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("validation failed: {0}")]
    Validation(#[from] Violation),

    #[error("TableConfigs {name} already exists")]
    AlreadyExists { name: String },

    #[error("TableConfigs {name} not found")]
    NotFound { name: String },

    #[error("unknown tuner '{tuner}' in {table_type} table config of {name}")]
    UnknownTuner {
        name: String,
        table_type: TableType,
        tuner: String,
    },

    #[error("derived TableConfigs {name} is no longer valid: {violation}")]
    DerivationInvariant { name: String, violation: Violation },

    #[error("failed to serialize TableConfigs: {0}")]
    Serialization(String),

    #[error("metadata store unavailable: {0}")]
    Store(#[from] StoreError),
}

impl TableConfigsError {
    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            TableConfigsError::MalformedInput(_) => "MALFORMED_INPUT",
            TableConfigsError::Validation(_) => "VALIDATION_FAILED",
            TableConfigsError::AlreadyExists { .. } => "ALREADY_EXISTS",
            TableConfigsError::NotFound { .. } => "NOT_FOUND",
            TableConfigsError::UnknownTuner { .. } => "UNKNOWN_TUNER",
            TableConfigsError::DerivationInvariant { .. }
            | TableConfigsError::Serialization(_) => "INTERNAL_ERROR",
            TableConfigsError::Store(_) => "STORE_UNAVAILABLE",
        }
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            TableConfigsError::DerivationInvariant { .. }
                | TableConfigsError::Serialization(_)
                | TableConfigsError::Store(_)
        )
    }
}
