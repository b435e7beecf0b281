//! Schema sub-document of a composite table config.
//!
//! The lifecycle engine treats a schema as mostly opaque: it needs the schema
//! name, the field names per category (dimension, metric, date-time) and the
//! primary-key columns. [`SchemaDoc::validate`] is the schema's own validator,
//! invoked by the validation engine as one delegated check.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Column data types understood by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Int,
    Long,
    Float,
    Double,
    BigDecimal,
    Boolean,
    Timestamp,
    String,
    Json,
    Bytes,
}

impl DataType {
    /// Metric columns must hold numbers (or raw bytes for sketches).
    pub fn is_metric_compatible(self) -> bool {
        matches!(
            self,
            DataType::Int
                | DataType::Long
                | DataType::Float
                | DataType::Double
                | DataType::BigDecimal
                | DataType::Bytes
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Int => "INT",
            DataType::Long => "LONG",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::BigDecimal => "BIG_DECIMAL",
            DataType::Boolean => "BOOLEAN",
            DataType::Timestamp => "TIMESTAMP",
            DataType::String => "STRING",
            DataType::Json => "JSON",
            DataType::Bytes => "BYTES",
        };
        f.write_str(s)
    }
}

/// Time units accepted in date-time formats, granularities and retention settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl FromStr for TimeUnit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NANOSECONDS" => Ok(TimeUnit::Nanoseconds),
            "MICROSECONDS" => Ok(TimeUnit::Microseconds),
            "MILLISECONDS" => Ok(TimeUnit::Milliseconds),
            "SECONDS" => Ok(TimeUnit::Seconds),
            "MINUTES" => Ok(TimeUnit::Minutes),
            "HOURS" => Ok(TimeUnit::Hours),
            "DAYS" => Ok(TimeUnit::Days),
            _ => Err(()),
        }
    }
}

/// Which section of the schema a column was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldCategory {
    Dimension,
    Metric,
    DateTime,
}

/// A dimension or metric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: String,
    pub data_type: DataType,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub single_value_field: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_null_value: Option<Value>,
    #[serde(flatten)]
    pub(crate) unrecognized: BTreeMap<String, Value>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            single_value_field: true,
            default_null_value: None,
            unrecognized: BTreeMap::new(),
        }
    }
}

/// A date-time column with its encoding format and granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeFieldSpec {
    pub name: String,
    pub data_type: DataType,
    pub format: String,
    pub granularity: String,
    #[serde(flatten)]
    pub(crate) unrecognized: BTreeMap<String, Value>,
}

impl DateTimeFieldSpec {
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
        format: impl Into<String>,
        granularity: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            format: format.into(),
            granularity: granularity.into(),
            unrecognized: BTreeMap::new(),
        }
    }
}

/// The schema sub-document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDoc {
    pub schema_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dimension_field_specs: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub metric_field_specs: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub date_time_field_specs: Vec<DateTimeFieldSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key_columns: Vec<String>,
    #[serde(flatten)]
    pub(crate) unrecognized: BTreeMap<String, Value>,
}

/// Reasons a schema fails its own validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("schema name '{name}' is empty or contains illegal characters")]
    InvalidSchemaName { name: String },

    #[error("field name must not be empty")]
    EmptyFieldName,

    #[error("field name '{field}' contains illegal character {found:?}")]
    IllegalFieldName { field: String, found: char },

    #[error("field '{field}' is declared more than once")]
    DuplicateField { field: String },

    #[error("metric field '{field}' has non-numeric data type {data_type}")]
    NonNumericMetric { field: String, data_type: DataType },

    #[error("date-time field '{field}' has invalid format '{format}'")]
    InvalidDateTimeFormat { field: String, format: String },

    #[error("date-time field '{field}' has invalid granularity '{granularity}'")]
    InvalidGranularity { field: String, granularity: String },

    #[error("primary key column '{column}' is not a schema field")]
    UnknownPrimaryKeyColumn { column: String },
}

impl SchemaDoc {
    pub fn new(schema_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            ..Default::default()
        }
    }

    pub fn with_dimension(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.dimension_field_specs
            .push(FieldSpec::new(name, data_type));
        self
    }

    pub fn with_metric(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.metric_field_specs.push(FieldSpec::new(name, data_type));
        self
    }

    pub fn with_date_time(
        mut self,
        name: impl Into<String>,
        data_type: DataType,
        format: impl Into<String>,
        granularity: impl Into<String>,
    ) -> Self {
        self.date_time_field_specs
            .push(DateTimeFieldSpec::new(name, data_type, format, granularity));
        self
    }

    pub fn with_primary_key(mut self, columns: Vec<String>) -> Self {
        self.primary_key_columns = columns;
        self
    }

    pub fn dimension_names(&self) -> impl Iterator<Item = &str> {
        self.dimension_field_specs.iter().map(|f| f.name.as_str())
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metric_field_specs.iter().map(|f| f.name.as_str())
    }

    pub fn date_time_names(&self) -> impl Iterator<Item = &str> {
        self.date_time_field_specs.iter().map(|f| f.name.as_str())
    }

    /// Category of the named column, if the schema declares it.
    pub fn category_of(&self, column: &str) -> Option<FieldCategory> {
        if self.dimension_names().any(|n| n == column) {
            Some(FieldCategory::Dimension)
        } else if self.metric_names().any(|n| n == column) {
            Some(FieldCategory::Metric)
        } else if self.date_time_names().any(|n| n == column) {
            Some(FieldCategory::DateTime)
        } else {
            None
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.category_of(column).is_some()
    }

    /// Run the schema's own consistency checks. Returns the first violation.
    pub fn validate(&self) -> Result<(), SchemaViolation> {
        if self.schema_name.is_empty() || illegal_resource_name_char(&self.schema_name).is_some() {
            return Err(SchemaViolation::InvalidSchemaName {
                name: self.schema_name.clone(),
            });
        }

        let mut seen = HashSet::new();
        let all_names = self
            .dimension_names()
            .chain(self.metric_names())
            .chain(self.date_time_names());
        for name in all_names {
            if name.is_empty() {
                return Err(SchemaViolation::EmptyFieldName);
            }
            if let Some(found) = illegal_field_name_char(name) {
                return Err(SchemaViolation::IllegalFieldName {
                    field: name.to_string(),
                    found,
                });
            }
            if !seen.insert(name) {
                return Err(SchemaViolation::DuplicateField {
                    field: name.to_string(),
                });
            }
        }

        for metric in &self.metric_field_specs {
            if !metric.data_type.is_metric_compatible() {
                return Err(SchemaViolation::NonNumericMetric {
                    field: metric.name.clone(),
                    data_type: metric.data_type,
                });
            }
        }

        for spec in &self.date_time_field_specs {
            if !is_valid_date_time_format(&spec.format) {
                return Err(SchemaViolation::InvalidDateTimeFormat {
                    field: spec.name.clone(),
                    format: spec.format.clone(),
                });
            }
            if !is_valid_granularity(&spec.granularity) {
                return Err(SchemaViolation::InvalidGranularity {
                    field: spec.name.clone(),
                    granularity: spec.granularity.clone(),
                });
            }
        }

        for column in &self.primary_key_columns {
            if !seen.contains(column.as_str()) {
                return Err(SchemaViolation::UnknownPrimaryKeyColumn {
                    column: column.clone(),
                });
            }
        }

        Ok(())
    }
}

/// First character that may not appear in a table or schema name. Names
/// double as store keys and URL path segments, so `/` is excluded too.
pub(crate) fn illegal_resource_name_char(name: &str) -> Option<char> {
    name.chars()
        .find(|c| c.is_whitespace() || c.is_control() || *c == '/')
}

/// First character that may not appear in a column name.
pub(crate) fn illegal_field_name_char(name: &str) -> Option<char> {
    name.chars().find(|c| c.is_whitespace() || c.is_control())
}

/// `size:UNIT:EPOCH` or `size:UNIT:SIMPLE_DATE_FORMAT:pattern`.
fn is_valid_date_time_format(format: &str) -> bool {
    let mut parts = format.splitn(4, ':');
    let (Some(size), Some(unit), Some(kind)) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if !is_positive_int(size) || unit.parse::<TimeUnit>().is_err() {
        return false;
    }
    match (kind, parts.next()) {
        ("EPOCH", None) => true,
        ("SIMPLE_DATE_FORMAT", Some(pattern)) => !pattern.trim().is_empty(),
        _ => false,
    }
}

/// `size:UNIT`.
fn is_valid_granularity(granularity: &str) -> bool {
    match granularity.split_once(':') {
        Some((size, unit)) => is_positive_int(size) && unit.parse::<TimeUnit>().is_ok(),
        None => false,
    }
}

pub(crate) fn is_positive_int(s: &str) -> bool {
    s.parse::<u64>().is_ok_and(|n| n > 0)
}

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}
