//! Pure validation of a composite resource.
//!
//! Checks run in a fixed precedence and the first failure wins, so the same
//! document always produces the same violation.

use thiserror::Error;

use crate::composite::TableConfigs;
use crate::schema::{SchemaViolation, illegal_resource_name_char};
use crate::table::{TableConfigViolation, TableType};

/// One way a composite resource can be invalid.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("tableName must not be empty")]
    EmptyName,

    #[error("tableName '{name}' contains illegal character {found:?}")]
    IllegalName { name: String, found: char },

    #[error("schema is required")]
    MissingSchema,

    #[error("at least one of offline or realtime table config is required")]
    MissingTableConfig,

    #[error("schemaName '{schema_name}' does not match tableName '{name}'")]
    SchemaNameMismatch { name: String, schema_name: String },

    #[error("invalid schema: {0}")]
    InvalidSchema(#[source] SchemaViolation),

    #[error("{table_type} table config tableName '{found}' does not match tableName '{name}'")]
    TableNameMismatch {
        table_type: TableType,
        name: String,
        found: String,
    },

    #[error("invalid {table_type} table config: {reason}")]
    InvalidTableConfig {
        table_type: TableType,
        #[source]
        reason: TableConfigViolation,
    },

    #[error(
        "hybrid table time columns differ: offline {offline:?}, realtime {realtime:?}"
    )]
    HybridTimeColumnMismatch {
        offline: Option<String>,
        realtime: Option<String>,
    },

    #[error("tableName '{found}' in body does not match '{expected}' in request path")]
    PathNameMismatch { expected: String, found: String },
}

impl Violation {
    /// JSON pointer of the sub-document the violation is about.
    pub fn pointer(&self) -> &'static str {
        match self {
            Violation::EmptyName
            | Violation::IllegalName { .. }
            | Violation::PathNameMismatch { .. } => "/tableName",
            Violation::MissingSchema | Violation::InvalidSchema(_) => "/schema",
            Violation::SchemaNameMismatch { .. } => "/schema/schemaName",
            Violation::MissingTableConfig | Violation::HybridTimeColumnMismatch { .. } => "",
            Violation::TableNameMismatch { table_type, .. } => match table_type {
                TableType::Offline => "/offline/tableName",
                TableType::Realtime => "/realtime/tableName",
            },
            Violation::InvalidTableConfig { table_type, .. } => match table_type {
                TableType::Offline => "/offline",
                TableType::Realtime => "/realtime",
            },
        }
    }
}

/// Validate a decoded composite resource. Never touches the store.
pub fn validate(configs: &TableConfigs) -> Result<(), Violation> {
    let name = configs.table_name.as_str();
    if name.is_empty() {
        return Err(Violation::EmptyName);
    }
    if let Some(found) = illegal_resource_name_char(name) {
        return Err(Violation::IllegalName {
            name: name.to_string(),
            found,
        });
    }

    let schema = configs.schema.as_ref().ok_or(Violation::MissingSchema)?;

    if configs.offline.is_none() && configs.realtime.is_none() {
        return Err(Violation::MissingTableConfig);
    }

    if schema.schema_name != name {
        return Err(Violation::SchemaNameMismatch {
            name: name.to_string(),
            schema_name: schema.schema_name.clone(),
        });
    }

    schema.validate().map_err(Violation::InvalidSchema)?;

    for slot in [TableType::Offline, TableType::Realtime] {
        let Some(table) = configs.table_config(slot) else {
            continue;
        };
        if table.table_name != name {
            return Err(Violation::TableNameMismatch {
                table_type: slot,
                name: name.to_string(),
                found: table.table_name.clone(),
            });
        }
        table
            .validate(slot, schema)
            .map_err(|reason| Violation::InvalidTableConfig {
                table_type: slot,
                reason,
            })?;
    }

    if let (Some(offline), Some(realtime)) = (&configs.offline, &configs.realtime)
        && offline.time_column_name() != realtime.time_column_name()
    {
        return Err(Violation::HybridTimeColumnMismatch {
            offline: offline.time_column_name().map(str::to_string),
            realtime: realtime.time_column_name().map(str::to_string),
        });
    }

    Ok(())
}

/// [`validate`], plus agreement between the body's name and the name the
/// caller addressed.
pub fn validate_for_path(path_name: &str, configs: &TableConfigs) -> Result<(), Violation> {
    validate(configs)?;
    if configs.table_name != path_name {
        return Err(Violation::PathNameMismatch {
            expected: path_name.to_string(),
            found: configs.table_name.clone(),
        });
    }
    Ok(())
}
