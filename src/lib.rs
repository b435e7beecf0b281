//! # TableConfigs
//!
//! Validation, derivation and lifecycle management for composite table
//! configs: one schema plus an offline and/or realtime table config, managed
//! as a single resource under one name.
//!
//! ## Flow
//!
//! ```text
//! raw JSON ──decode──▶ TableConfigs + UnrecognizedProperties
//!                         │
//!                         ├─ validate ──▶ first Violation, or pass
//!                         ├─ derive   ──▶ replicas, dim-table quota, tuners
//!                         └─ commit   ──▶ MetadataStore (insert_if_absent / replace_if_present)
//! ```
//!
//! Validation and derivation are pure. The store write is the only side
//! effect and happens after both succeed.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use store::InMemoryStore;
//! use tableconfigs::TableConfigsController;
//!
//! let controller = TableConfigsController::with_store(Arc::new(InMemoryStore::new()));
//! let raw = r#"{
//!     "tableName": "events",
//!     "schema": { "schemaName": "events",
//!                 "dimensionFieldSpecs": [{ "name": "country", "dataType": "STRING" }] },
//!     "offline": { "tableName": "events", "tableType": "OFFLINE" },
//!     "illegalKey1": 1
//! }"#;
//!
//! let outcome = controller.create(raw).unwrap();
//! assert_eq!(outcome.status, "TableConfigs events successfully added");
//! assert!(outcome.unrecognized_properties.contains("/illegalKey1"));
//! ```

pub mod composite;
pub mod config;
pub mod controller;
pub mod derivation;
pub mod error;
pub mod schema;
pub mod table;
pub mod tuner;
pub mod unrecognized;
pub mod validation;

pub use composite::{DecodedTableConfigs, TableConfigs};
pub use config::{ConfigError, ControllerConfig};
pub use controller::{TableConfigsController, ValidateOutcome, WriteOutcome};
pub use error::TableConfigsError;
pub use schema::{DataType, DateTimeFieldSpec, FieldSpec, SchemaDoc, SchemaViolation};
pub use table::{
    IndexingConfig, QuotaConfig, SegmentsConfig, TableConfigDoc, TableConfigViolation,
    TableType, TenantConfig, TunerConfig,
};
pub use tuner::{AUTO_INDEX_TUNER, AutoIndexTuner, TableTuner, TunerRegistry};
pub use unrecognized::UnrecognizedProperties;
pub use validation::{Violation, validate};
