//! Lifecycle controller: decode, validate, derive and persist composite
//! resources against a [`MetadataStore`].
//!
//! The controller holds no resource cache. Every read goes to the store, and
//! the conditional store write is the single commit point of create and
//! update.

use std::sync::Arc;

use serde::Serialize;
use store::{MetadataStore, StoreError};
use tracing::{debug, info, warn};

use crate::composite::{DecodedTableConfigs, TableConfigs};
use crate::config::ControllerConfig;
use crate::derivation::derive;
use crate::error::TableConfigsError;
use crate::tuner::TunerRegistry;
use crate::unrecognized::UnrecognizedProperties;
use crate::validation::{self, Violation};

/// Result of a dry-run validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateOutcome {
    pub unrecognized_properties: UnrecognizedProperties,
}

/// Result of a successful create or update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    pub unrecognized_properties: UnrecognizedProperties,
    pub status: String,
}

/// Orchestrates every operation on composite table configs.
///
/// Cheap to clone; clones share the store and tuner registry.
#[derive(Clone)]
pub struct TableConfigsController {
    store: Arc<dyn MetadataStore>,
    tuners: Arc<TunerRegistry>,
    config: ControllerConfig,
}

impl TableConfigsController {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        tuners: Arc<TunerRegistry>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            store,
            tuners,
            config,
        }
    }

    /// A controller with the built-in tuners and default policies.
    pub fn with_store(store: Arc<dyn MetadataStore>) -> Self {
        Self::new(
            store,
            Arc::new(TunerRegistry::with_defaults()),
            ControllerConfig::default(),
        )
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn tuners(&self) -> &TunerRegistry {
        &self.tuners
    }

    /// Decode and validate without touching the store.
    pub fn validate(&self, raw: &str) -> Result<ValidateOutcome, TableConfigsError> {
        let DecodedTableConfigs {
            table_configs,
            unrecognized,
        } = TableConfigs::decode(raw)?;
        log_unrecognized("validate", &table_configs.table_name, &unrecognized);
        validation::validate(&table_configs).map_err(|v| rejected("validate", &table_configs, v))?;
        Ok(ValidateOutcome {
            unrecognized_properties: unrecognized,
        })
    }

    /// Store a new resource. Fails with `AlreadyExists` if the name is taken.
    pub fn create(&self, raw: &str) -> Result<WriteOutcome, TableConfigsError> {
        let DecodedTableConfigs {
            mut table_configs,
            unrecognized,
        } = TableConfigs::decode(raw)?;
        let name = table_configs.table_name.clone();
        log_unrecognized("create", &name, &unrecognized);

        validation::validate(&table_configs).map_err(|v| rejected("create", &table_configs, v))?;

        if self.store.contains(&name)? {
            return Err(TableConfigsError::AlreadyExists { name });
        }

        let bytes = self.derive_and_encode(&mut table_configs)?;
        if !self.store.insert_if_absent(&name, &bytes)? {
            // A concurrent create committed between the check and the write.
            warn!(table = %name, op = "create", "lost create race");
            return Err(TableConfigsError::AlreadyExists { name });
        }

        info!(table = %name, op = "create", "stored table configs");
        Ok(WriteOutcome {
            unrecognized_properties: unrecognized,
            status: format!("TableConfigs {name} successfully added"),
        })
    }

    /// Overwrite an existing resource addressed as `path_name`.
    ///
    /// The body's `tableName` must equal `path_name`. The stored document is
    /// fully replaced, never merged.
    pub fn update(&self, path_name: &str, raw: &str) -> Result<WriteOutcome, TableConfigsError> {
        let DecodedTableConfigs {
            mut table_configs,
            unrecognized,
        } = TableConfigs::decode(raw)?;
        log_unrecognized("update", path_name, &unrecognized);

        validation::validate_for_path(path_name, &table_configs)
            .map_err(|v| rejected("update", &table_configs, v))?;

        let name = table_configs.table_name.clone();
        if !self.store.contains(&name)? {
            return Err(TableConfigsError::NotFound { name });
        }

        let bytes = self.derive_and_encode(&mut table_configs)?;
        if !self.store.replace_if_present(&name, &bytes)? {
            // Deleted concurrently between the check and the write.
            warn!(table = %name, op = "update", "lost update race");
            return Err(TableConfigsError::NotFound { name });
        }

        info!(table = %name, op = "update", "replaced table configs");
        Ok(WriteOutcome {
            unrecognized_properties: unrecognized,
            status: format!("TableConfigs updated for {name}"),
        })
    }

    /// Remove the resource under `name`. Succeeds whether or not it existed.
    pub fn delete(&self, name: &str) -> Result<String, TableConfigsError> {
        let existed = self.store.delete(name)?;
        info!(table = %name, op = "delete", existed, "deleted table configs");
        Ok(format!("TableConfigs {name} deleted"))
    }

    /// The stored resource under `name`.
    pub fn get(&self, name: &str) -> Result<TableConfigs, TableConfigsError> {
        let bytes = self
            .store
            .get(name)?
            .ok_or_else(|| TableConfigsError::NotFound {
                name: name.to_string(),
            })?;
        Ok(decode_stored(name, &bytes)?)
    }

    /// Every stored resource, re-serialized, in ascending name order.
    pub fn list(&self) -> Result<Vec<String>, TableConfigsError> {
        let mut documents = Vec::new();
        self.store.scan(&mut |key, bytes| {
            let table_configs = decode_stored(key, bytes)?;
            let text = serde_json::to_string(&table_configs).map_err(|e| StoreError::corrupt(key, e))?;
            documents.push(text);
            Ok(())
        })?;
        debug!(op = "list", count = documents.len(), "listed table configs");
        Ok(documents)
    }

    /// Names of every stored resource, in ascending order.
    pub fn names(&self) -> Result<Vec<String>, TableConfigsError> {
        let mut names = Vec::new();
        self.store.scan(&mut |key, _| {
            names.push(key.to_string());
            Ok(())
        })?;
        Ok(names)
    }

    /// Derive, re-check and serialize a validated resource.
    fn derive_and_encode(&self, table_configs: &mut TableConfigs) -> Result<Vec<u8>, TableConfigsError> {
        derive(table_configs, &self.config, &self.tuners)?;
        validation::validate(table_configs).map_err(|violation| {
            warn!(table = %table_configs.table_name, %violation, "derivation produced an invalid document");
            TableConfigsError::DerivationInvariant {
                name: table_configs.table_name.clone(),
                violation,
            }
        })?;
        table_configs.to_json_bytes()
    }
}

fn decode_stored(key: &str, bytes: &[u8]) -> Result<TableConfigs, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::corrupt(key, e))
}

fn rejected(op: &'static str, table_configs: &TableConfigs, violation: Violation) -> TableConfigsError {
    debug!(
        table = %table_configs.table_name,
        op,
        pointer = violation.pointer(),
        %violation,
        "rejected table configs"
    );
    TableConfigsError::Validation(violation)
}

fn log_unrecognized(op: &'static str, name: &str, unrecognized: &UnrecognizedProperties) {
    if !unrecognized.is_empty() {
        debug!(
            table = %name,
            op,
            unrecognized = ?unrecognized.pointers().collect::<Vec<_>>(),
            "request carried unrecognized properties"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use store::InMemoryStore;

    fn controller() -> (TableConfigsController, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (TableConfigsController::with_store(store.clone()), store)
    }

    fn body(name: &str) -> serde_json::Value {
        json!({
            "tableName": name,
            "schema": {
                "schemaName": name,
                "dimensionFieldSpecs": [{ "name": "country", "dataType": "STRING" }],
                "metricFieldSpecs": [{ "name": "clicks", "dataType": "LONG" }],
                "dateTimeFieldSpecs": [{
                    "name": "ts", "dataType": "LONG",
                    "format": "1:MILLISECONDS:EPOCH", "granularity": "1:MILLISECONDS"
                }]
            },
            "offline": {
                "tableName": name,
                "tableType": "OFFLINE",
                "segmentsConfig": { "timeColumnName": "ts" }
            }
        })
    }

    #[test]
    fn create_then_get() {
        let (controller, _) = controller();
        let outcome = controller.create(&body("events").to_string()).unwrap();
        assert_eq!(outcome.status, "TableConfigs events successfully added");
        assert!(outcome.unrecognized_properties.is_empty());

        let stored = controller.get("events").unwrap();
        assert_eq!(stored.table_name, "events");
        assert!(stored.offline.is_some());
    }

    #[test]
    fn second_create_is_rejected_and_store_unchanged() {
        let (controller, store) = controller();
        controller.create(&body("events").to_string()).unwrap();
        let before = store.get("events").unwrap();

        let mut changed = body("events");
        changed["offline"]["segmentsConfig"]["replication"] = json!(4);
        assert_eq!(
            controller.create(&changed.to_string()),
            Err(TableConfigsError::AlreadyExists {
                name: "events".into()
            })
        );
        assert_eq!(store.get("events").unwrap(), before);
    }

    #[test]
    fn invalid_document_never_reaches_store() {
        let (controller, store) = controller();
        let mut raw = body("events");
        raw.as_object_mut().unwrap().remove("schema");
        assert!(matches!(
            controller.create(&raw.to_string()),
            Err(TableConfigsError::Validation(Violation::MissingSchema))
        ));
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn update_requires_existing_resource() {
        let (controller, store) = controller();
        assert_eq!(
            controller.update("events", &body("events").to_string()),
            Err(TableConfigsError::NotFound {
                name: "events".into()
            })
        );
        assert_eq!(store.len().unwrap(), 0);

        controller.create(&body("events").to_string()).unwrap();
        let mut changed = body("events");
        changed["offline"]["segmentsConfig"]["replication"] = json!(3);
        let outcome = controller.update("events", &changed.to_string()).unwrap();
        assert_eq!(outcome.status, "TableConfigs updated for events");
        assert_eq!(
            controller
                .get("events")
                .unwrap()
                .offline
                .unwrap()
                .segments_config
                .replication,
            Some(3)
        );
    }

    #[test]
    fn update_rejects_path_body_mismatch() {
        let (controller, _) = controller();
        controller.create(&body("events").to_string()).unwrap();
        assert!(matches!(
            controller.update("other", &body("events").to_string()),
            Err(TableConfigsError::Validation(Violation::PathNameMismatch { .. }))
        ));
    }

    #[test]
    fn derivation_producing_invalid_document_writes_nothing() {
        use crate::{SchemaDoc, TableConfigDoc};
        use std::collections::BTreeMap;

        let store = Arc::new(InMemoryStore::new());
        let mut tuners = TunerRegistry::with_defaults();
        tuners.register(
            "ghostColumn",
            |_: &SchemaDoc, table: &mut TableConfigDoc, _: &BTreeMap<String, String>| {
                table
                    .table_index_config
                    .inverted_index_columns
                    .push("ghost".to_string());
            },
        );
        let controller =
            TableConfigsController::new(store.clone(), Arc::new(tuners), ControllerConfig::default());

        let mut raw = body("events");
        raw["offline"]["tunerConfigs"] = json!([{ "name": "ghostColumn" }]);
        let text = raw.to_string();

        // The submitted document is valid; only the derived one is not.
        controller.validate(&text).unwrap();
        let err = controller.create(&text).unwrap_err();
        assert!(matches!(
            &err,
            TableConfigsError::DerivationInvariant {
                name,
                violation: Violation::InvalidTableConfig { .. },
            } if name == "events"
        ));
        assert!(!err.is_client_error());
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn delete_is_idempotent() {
        let (controller, _) = controller();
        assert_eq!(controller.delete("events").unwrap(), "TableConfigs events deleted");
        controller.create(&body("events").to_string()).unwrap();
        controller.delete("events").unwrap();
        assert!(matches!(
            controller.get("events"),
            Err(TableConfigsError::NotFound { .. })
        ));
    }

    #[test]
    fn validate_never_writes() {
        let (controller, store) = controller();
        let outcome = controller.validate(&body("events").to_string()).unwrap();
        assert!(outcome.unrecognized_properties.is_empty());
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn corrupt_record_surfaces_as_store_error() {
        let (controller, store) = controller();
        store.put("events", b"not json").unwrap();
        assert!(matches!(
            controller.get("events"),
            Err(TableConfigsError::Store(StoreError::Corrupt { .. }))
        ));
        assert!(matches!(controller.list(), Err(TableConfigsError::Store(_))));
    }

    #[test]
    fn list_is_name_ordered() {
        let (controller, _) = controller();
        controller.create(&body("b_table").to_string()).unwrap();
        controller.create(&body("a_table").to_string()).unwrap();
        assert_eq!(controller.names().unwrap(), vec!["a_table", "b_table"]);
        let listed = controller.list().unwrap();
        assert_eq!(listed.len(), 2);
        let first: TableConfigs = serde_json::from_str(&listed[0]).unwrap();
        assert_eq!(first.table_name, "a_table");
    }
}
