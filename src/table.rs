//! Table-config sub-documents (the `offline` and `realtime` slots).
//!
//! Only the blocks the lifecycle engine reads or rewrites are modelled:
//! segment validation settings, indexing lists, storage quota, tenants, the
//! dimension-table flag and tuner directives. Anything else a client sends is
//! captured as an unrecognized property.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::schema::{FieldCategory, SchemaDoc, TimeUnit, is_positive_int};

/// The two table flavours a composite resource can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableType {
    /// Batch-loaded segments.
    Offline,
    /// Segments consumed from a stream.
    Realtime,
}

impl fmt::Display for TableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableType::Offline => f.write_str("OFFLINE"),
            TableType::Realtime => f.write_str("REALTIME"),
        }
    }
}

/// `segmentsConfig`: time column, replication and retention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_column_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas_per_partition: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_time_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retention_time_value: Option<String>,
    #[serde(flatten)]
    pub(crate) unrecognized: BTreeMap<String, Value>,
}

/// `tableIndexConfig`: per-index column lists plus stream settings.
///
/// Column lists keep their input order for storage, but equality treats them
/// as sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inverted_index_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub no_dictionary_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sorted_column: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub range_index_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bloom_filter_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stream_configs: BTreeMap<String, String>,
    #[serde(flatten)]
    pub(crate) unrecognized: BTreeMap<String, Value>,
}

impl IndexingConfig {
    /// Each index list paired with its wire name.
    pub fn column_lists(&self) -> [(&'static str, &[String]); 5] {
        [
            ("invertedIndexColumns", self.inverted_index_columns.as_slice()),
            ("noDictionaryColumns", self.no_dictionary_columns.as_slice()),
            ("sortedColumn", self.sorted_column.as_slice()),
            ("rangeIndexColumns", self.range_index_columns.as_slice()),
            ("bloomFilterColumns", self.bloom_filter_columns.as_slice()),
        ]
    }
}

impl PartialEq for IndexingConfig {
    fn eq(&self, other: &Self) -> bool {
        self.column_lists()
            .iter()
            .zip(other.column_lists().iter())
            .all(|((_, a), (_, b))| same_columns(a, b))
            && self.stream_configs == other.stream_configs
            && self.unrecognized == other.unrecognized
    }
}

fn same_columns(a: &[String], b: &[String]) -> bool {
    let mut a: Vec<&str> = a.iter().map(String::as_str).collect();
    let mut b: Vec<&str> = b.iter().map(String::as_str).collect();
    a.sort_unstable();
    b.sort_unstable();
    a.dedup();
    b.dedup();
    a == b
}

/// `quota`: storage cap such as `"200M"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
    #[serde(flatten)]
    pub(crate) unrecognized: BTreeMap<String, Value>,
}

/// `tenants`: broker and server tenant tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(flatten)]
    pub(crate) unrecognized: BTreeMap<String, Value>,
}

/// A named tuner directive, resolved against the tuner registry at derivation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunerConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tuner_properties: BTreeMap<String, String>,
    #[serde(flatten)]
    pub(crate) unrecognized: BTreeMap<String, Value>,
}

impl TunerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// One table config (offline or realtime).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfigDoc {
    pub table_name: String,
    pub table_type: TableType,
    #[serde(default)]
    pub segments_config: SegmentsConfig,
    #[serde(default)]
    pub table_index_config: IndexingConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<QuotaConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenants: Option<TenantConfig>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_dim_table: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tuner_configs: Vec<TunerConfig>,
    #[serde(flatten)]
    pub(crate) unrecognized: BTreeMap<String, Value>,
}

/// Reasons a table config fails its own validation against the schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableConfigViolation {
    #[error("tableType {found} does not belong in the {expected} slot")]
    TableTypeMismatch { expected: TableType, found: TableType },

    #[error("time column '{column}' is not a date-time field of the schema")]
    InvalidTimeColumn { column: String },

    #[error("{field} must be at least 1, got {value}")]
    InvalidReplication { field: &'static str, value: u32 },

    #[error("retention requires a known time unit and a positive value, got unit {unit:?} value {value:?}")]
    InvalidRetention {
        unit: Option<String>,
        value: Option<String>,
    },

    #[error("{index} column '{column}' does not exist in the schema")]
    UnknownIndexColumn { index: &'static str, column: String },

    #[error("column '{column}' cannot be both inverted-indexed and in noDictionaryColumns")]
    ConflictingIndex { column: String },

    #[error("realtime table config requires streamConfigs with a streamType")]
    MissingStreamConfigs,

    #[error("invalid storage quota '{storage}'")]
    InvalidStorageQuota { storage: String },

    #[error("dimension tables are only supported as offline tables")]
    DimTableNotOffline,

    #[error("dimension table requires primary key columns in the schema")]
    DimTableWithoutPrimaryKey,

    #[error("tuner config name must not be empty")]
    EmptyTunerName,
}

impl TableConfigDoc {
    pub fn new(table_name: impl Into<String>, table_type: TableType) -> Self {
        Self {
            table_name: table_name.into(),
            table_type,
            segments_config: SegmentsConfig::default(),
            table_index_config: IndexingConfig::default(),
            quota: None,
            tenants: None,
            is_dim_table: false,
            tuner_configs: Vec::new(),
            unrecognized: BTreeMap::new(),
        }
    }

    pub fn time_column_name(&self) -> Option<&str> {
        self.segments_config.time_column_name.as_deref()
    }

    pub fn storage_quota(&self) -> Option<&str> {
        self.quota.as_ref().and_then(|q| q.storage.as_deref())
    }

    /// Validate this config as the occupant of `slot`, against `schema`.
    ///
    /// Name agreement with the enclosing resource is checked by the caller.
    pub fn validate(&self, slot: TableType, schema: &SchemaDoc) -> Result<(), TableConfigViolation> {
        if self.table_type != slot {
            return Err(TableConfigViolation::TableTypeMismatch {
                expected: slot,
                found: self.table_type,
            });
        }

        self.validate_segments(schema)?;
        self.validate_indexing(schema)?;

        if let Some(storage) = self.storage_quota()
            && parse_data_size(storage).is_none()
        {
            return Err(TableConfigViolation::InvalidStorageQuota {
                storage: storage.to_string(),
            });
        }

        if self.is_dim_table {
            if slot != TableType::Offline {
                return Err(TableConfigViolation::DimTableNotOffline);
            }
            if schema.primary_key_columns.is_empty() {
                return Err(TableConfigViolation::DimTableWithoutPrimaryKey);
            }
        }

        if self.tuner_configs.iter().any(|t| t.name.trim().is_empty()) {
            return Err(TableConfigViolation::EmptyTunerName);
        }

        Ok(())
    }

    fn validate_segments(&self, schema: &SchemaDoc) -> Result<(), TableConfigViolation> {
        let segments = &self.segments_config;

        if let Some(column) = &segments.time_column_name
            && schema.category_of(column) != Some(FieldCategory::DateTime)
        {
            return Err(TableConfigViolation::InvalidTimeColumn {
                column: column.clone(),
            });
        }

        for (field, value) in [
            ("replication", segments.replication),
            ("replicasPerPartition", segments.replicas_per_partition),
        ] {
            if let Some(0) = value {
                return Err(TableConfigViolation::InvalidReplication { field, value: 0 });
            }
        }

        match (&segments.retention_time_unit, &segments.retention_time_value) {
            (None, None) => {}
            (Some(unit), Some(value))
                if unit.parse::<TimeUnit>().is_ok() && is_positive_int(value) => {}
            (unit, value) => {
                return Err(TableConfigViolation::InvalidRetention {
                    unit: unit.clone(),
                    value: value.clone(),
                });
            }
        }

        Ok(())
    }

    fn validate_indexing(&self, schema: &SchemaDoc) -> Result<(), TableConfigViolation> {
        let indexing = &self.table_index_config;

        for (index, columns) in indexing.column_lists() {
            if let Some(column) = columns.iter().find(|c| !schema.has_column(c)) {
                return Err(TableConfigViolation::UnknownIndexColumn {
                    index,
                    column: column.clone(),
                });
            }
        }

        if let Some(column) = indexing
            .inverted_index_columns
            .iter()
            .find(|c| indexing.no_dictionary_columns.contains(c))
        {
            return Err(TableConfigViolation::ConflictingIndex {
                column: column.clone(),
            });
        }

        if self.table_type == TableType::Realtime {
            let has_stream_type = indexing
                .stream_configs
                .get("streamType")
                .is_some_and(|s| !s.trim().is_empty());
            if !has_stream_type {
                return Err(TableConfigViolation::MissingStreamConfigs);
            }
        }

        Ok(())
    }
}

/// Parse a data size such as `"200M"`, `"1.5G"` or `"512KB"` into bytes.
pub fn parse_data_size(size: &str) -> Option<u64> {
    let size = size.trim();
    let split = size
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(size.len());
    let (number, unit) = size.split_at(split);
    let number: f64 = number.parse().ok()?;
    let multiplier: u64 = match unit.to_ascii_uppercase().as_str() {
        "B" => 1,
        "K" | "KB" => 1 << 10,
        "M" | "MB" => 1 << 20,
        "G" | "GB" => 1 << 30,
        "T" | "TB" => 1 << 40,
        _ => return None,
    };
    if !number.is_finite() || number < 0.0 {
        return None;
    }
    Some((number * multiplier as f64) as u64)
}

fn is_false(value: &bool) -> bool {
    !*value
}
