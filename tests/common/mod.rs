//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};
use store::{InMemoryStore, MetadataStore};
use tableconfigs::{ControllerConfig, TableConfigsController, TunerRegistry};

pub const MIN_REPLICAS: u32 = 2;
pub const DIM_TABLE_MAX_SIZE: &str = "150M";

pub fn schema(name: &str) -> Value {
    json!({
        "schemaName": name,
        "dimensionFieldSpecs": [
            { "name": "dimA", "dataType": "STRING" },
            { "name": "dimB", "dataType": "INT" }
        ],
        "metricFieldSpecs": [
            { "name": "metricA", "dataType": "INT" },
            { "name": "metricB", "dataType": "DOUBLE" }
        ],
        "dateTimeFieldSpecs": [{
            "name": "timeColumn",
            "dataType": "LONG",
            "format": "1:MILLISECONDS:EPOCH",
            "granularity": "1:MILLISECONDS"
        }]
    })
}

pub fn dim_schema(name: &str) -> Value {
    let mut schema = schema(name);
    schema["primaryKeyColumns"] = json!(["dimA"]);
    schema
}

pub fn offline(name: &str) -> Value {
    json!({
        "tableName": name,
        "tableType": "OFFLINE",
        "segmentsConfig": {
            "timeColumnName": "timeColumn",
            "retentionTimeUnit": "DAYS",
            "retentionTimeValue": "50"
        }
    })
}

pub fn realtime(name: &str) -> Value {
    json!({
        "tableName": name,
        "tableType": "REALTIME",
        "segmentsConfig": {
            "timeColumnName": "timeColumn",
            "retentionTimeUnit": "DAYS",
            "retentionTimeValue": "5"
        },
        "tableIndexConfig": {
            "streamConfigs": {
                "streamType": "kafka",
                "stream.kafka.topic.name": "events",
                "stream.kafka.consumer.type": "lowlevel"
            }
        }
    })
}

pub fn with_tuner(mut table: Value, tuner: &str) -> Value {
    table["tunerConfigs"] = json!([{ "name": tuner }]);
    table
}

/// A composite envelope. `Value::Null` parts are omitted.
pub fn envelope(name: &str, schema: Value, offline: Value, realtime: Value) -> Value {
    let mut envelope = json!({ "tableName": name });
    for (key, part) in [("schema", schema), ("offline", offline), ("realtime", realtime)] {
        if !part.is_null() {
            envelope[key] = part;
        }
    }
    envelope
}

pub fn hybrid(name: &str) -> Value {
    envelope(name, schema(name), offline(name), realtime(name))
}

pub fn controller_with(store: Arc<dyn MetadataStore>) -> TableConfigsController {
    TableConfigsController::new(
        store,
        Arc::new(TunerRegistry::with_defaults()),
        ControllerConfig::default()
            .with_min_replicas(MIN_REPLICAS)
            .with_dim_table_max_size(DIM_TABLE_MAX_SIZE),
    )
}

pub fn controller() -> (TableConfigsController, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    (controller_with(store.clone()), store)
}
