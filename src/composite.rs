//! The composite resource: one schema plus up to two table configs, managed
//! as a single unit under one name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TableConfigsError;
use crate::schema::SchemaDoc;
use crate::table::{TableConfigDoc, TableType};
use crate::unrecognized::{TrackUnrecognized, UnrecognizedProperties};

/// `{tableName, schema, offline, realtime}`.
///
/// `schema`, `offline` and `realtime` are optional at the type level so that
/// their absence can be reported by the validation engine rather than as a
/// decode failure. `tableName` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfigs {
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offline: Option<TableConfigDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realtime: Option<TableConfigDoc>,
    #[serde(flatten)]
    pub(crate) unrecognized: BTreeMap<String, Value>,
}

/// A freshly decoded envelope with its unrecognized keys split out.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTableConfigs {
    pub table_configs: TableConfigs,
    pub unrecognized: UnrecognizedProperties,
}

impl TableConfigs {
    pub fn new(
        table_name: impl Into<String>,
        schema: Option<SchemaDoc>,
        offline: Option<TableConfigDoc>,
        realtime: Option<TableConfigDoc>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            schema,
            offline,
            realtime,
            unrecognized: BTreeMap::new(),
        }
    }

    /// Decode a raw JSON envelope.
    ///
    /// Fails with [`TableConfigsError::MalformedInput`] when the text is not
    /// JSON, is not an object, lacks `tableName`, or carries an ill-typed
    /// known field. Unknown keys are not errors; they come back in
    /// [`DecodedTableConfigs::unrecognized`].
    pub fn decode(raw: &str) -> Result<DecodedTableConfigs, TableConfigsError> {
        let mut table_configs: TableConfigs = serde_json::from_str(raw)
            .map_err(|e| TableConfigsError::MalformedInput(e.to_string()))?;
        let unrecognized = table_configs.take_unrecognized();
        Ok(DecodedTableConfigs {
            table_configs,
            unrecognized,
        })
    }

    /// Like [`TableConfigs::decode`], from an already parsed JSON value.
    pub fn decode_value(value: Value) -> Result<DecodedTableConfigs, TableConfigsError> {
        let mut table_configs: TableConfigs = serde_json::from_value(value)
            .map_err(|e| TableConfigsError::MalformedInput(e.to_string()))?;
        let unrecognized = table_configs.take_unrecognized();
        Ok(DecodedTableConfigs {
            table_configs,
            unrecognized,
        })
    }

    /// Move every unrecognized key, at any depth, out of this document.
    pub fn take_unrecognized(&mut self) -> UnrecognizedProperties {
        let mut out = UnrecognizedProperties::new();
        self.drain_unrecognized("", &mut out);
        out
    }

    /// The table config occupying `slot`.
    pub fn table_config(&self, slot: TableType) -> Option<&TableConfigDoc> {
        match slot {
            TableType::Offline => self.offline.as_ref(),
            TableType::Realtime => self.realtime.as_ref(),
        }
    }

    pub fn table_config_mut(&mut self, slot: TableType) -> Option<&mut TableConfigDoc> {
        match slot {
            TableType::Offline => self.offline.as_mut(),
            TableType::Realtime => self.realtime.as_mut(),
        }
    }

    pub fn is_hybrid(&self) -> bool {
        self.offline.is_some() && self.realtime.is_some()
    }

    pub fn to_json_string(&self) -> Result<String, TableConfigsError> {
        serde_json::to_string(self).map_err(|e| TableConfigsError::Serialization(e.to_string()))
    }

    pub(crate) fn to_json_bytes(&self) -> Result<Vec<u8>, TableConfigsError> {
        serde_json::to_vec(self).map_err(|e| TableConfigsError::Serialization(e.to_string()))
    }
}
