//! # TableConfigs Store
//!
//! The durable side of the composite table-config lifecycle. Every stored
//! resource is one opaque document (serialized JSON bytes) under its name;
//! there are no secondary indexes beyond name lookup and full enumeration.
//!
//! ## Backends
//!
//! All storage goes through the [`MetadataStore`] trait. Two implementations
//! ship with the crate:
//!
//! - [`InMemoryStore`], a `RwLock<BTreeMap>` used by tests and ephemeral servers.
//! - `RedbStore`, a pure Rust ACID embedded database (enabled via the
//!   `backend-redb` feature, on by default).
//!
//! ## Conditional writes
//!
//! Create-if-absent and update-if-present are exposed as
//! [`MetadataStore::insert_if_absent`] and [`MetadataStore::replace_if_present`].
//! Both are atomic per key: no concurrent writer to the same key can slip in
//! between the existence check and the write.
//!
//! ## Example
//!
//! ```
//! use store::{BackendConfig, MetadataStore};
//!
//! let store = BackendConfig::in_memory().build().unwrap();
//! assert!(store.insert_if_absent("events", b"{}").unwrap());
//! assert!(!store.insert_if_absent("events", b"{}").unwrap());
//! assert_eq!(store.get("events").unwrap(), Some(b"{}".to_vec()));
//! ```

mod backend;

pub use backend::{BackendConfig, InMemoryStore, MetadataStore};

#[cfg(feature = "backend-redb")]
pub use backend::RedbStore;

use thiserror::Error;

/// Failures of the backing metadata store.
///
/// The lifecycle controller surfaces every variant as "store unavailable";
/// retry policy, if any, belongs to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Corrupt record under key '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

impl StoreError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }

    pub fn corrupt<E: std::fmt::Display>(key: &str, err: E) -> Self {
        Self::Corrupt {
            key: key.to_string(),
            reason: err.to_string(),
        }
    }
}
