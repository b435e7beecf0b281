use crate::StoreError;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Trait for a key-value metadata store holding one document per resource name.
/// This allows for different storage implementations (e.g., in-memory, Redb).
pub trait MetadataStore: Send + Sync {
    /// Insert or overwrite a document (last writer wins).
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    /// Retrieve a document by key.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    /// Delete a document. Returns whether one existed; deleting an absent
    /// key is not an error.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;
    /// Scan all documents in ascending key order, calling the visitor for each one.
    fn scan(
        &self,
        visitor: &mut dyn FnMut(&str, &[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;
    /// Write `value` only if `key` is absent. Returns `false` (and writes
    /// nothing) when a document already exists.
    fn insert_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError>;
    /// Overwrite `value` only if `key` is present. Returns `false` (and writes
    /// nothing) when no document exists.
    fn replace_if_present(&self, key: &str, value: &[u8]) -> Result<bool, StoreError>;

    /// Whether a document exists under `key`.
    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}

/// Configuration for selecting and building a store backend.
///
/// # Example
/// ```
/// use store::BackendConfig;
///
/// // In-memory (for testing)
/// let config = BackendConfig::in_memory();
///
/// // Redb (pure Rust, recommended)
/// let config = BackendConfig::redb("/data/tableconfigs.redb");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BackendConfig {
    /// Use Redb for storage. The `path` is the file path for the database.
    ///
    /// Requires the `backend-redb` feature to be enabled at compile time (enabled by default).
    Redb { path: String },
    /// Use an in-memory map for storage. Contents are lost on drop.
    #[default]
    InMemory,
}

impl BackendConfig {
    /// Create an in-memory backend configuration.
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    /// Create a Redb backend configuration.
    pub fn redb<P: Into<String>>(path: P) -> Self {
        BackendConfig::Redb { path: path.into() }
    }

    /// Build the store described by this configuration.
    ///
    /// Fails with [`StoreError::Backend`] if the database cannot be opened or
    /// the backend was compiled out.
    pub fn build(&self) -> Result<Box<dyn MetadataStore>, StoreError> {
        match self {
            BackendConfig::InMemory => Ok(Box::new(InMemoryStore::new())),
            BackendConfig::Redb { path } => {
                #[cfg(feature = "backend-redb")]
                {
                    Ok(Box::new(RedbStore::open(path)?))
                }
                #[cfg(not(feature = "backend-redb"))]
                {
                    let _ = path;
                    Err(StoreError::backend("redb backend disabled at compile time"))
                }
            }
        }
    }
}

/// An in-memory store using a `RwLock` around a `BTreeMap`.
///
/// Conditional writes hold the write lock across the existence check and the
/// insert, which gives the single-writer-per-key guarantee.
pub struct InMemoryStore {
    records: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.is_empty())
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, Vec<u8>>>, StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, Vec<u8>>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataStore for InMemoryStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.write()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.read()?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.write()?.remove(key).is_some())
    }

    fn scan(
        &self,
        visitor: &mut dyn FnMut(&str, &[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        // A read lock is held for the duration of the scan.
        let guard = self.read()?;
        for (key, value) in guard.iter() {
            visitor(key, value)?;
        }
        Ok(())
    }

    fn insert_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        let mut guard = self.write()?;
        if guard.contains_key(key) {
            return Ok(false);
        }
        guard.insert(key.to_string(), value.to_vec());
        Ok(true)
    }

    fn replace_if_present(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        let mut guard = self.write()?;
        match guard.get_mut(key) {
            Some(slot) => {
                *slot = value.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.read()?.contains_key(key))
    }
}

/// The Redb backend implementation.
#[cfg(feature = "backend-redb")]
pub mod redb;

#[cfg(feature = "backend-redb")]
pub use self::redb::RedbStore;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn in_memory_conditional_writes() {
        let store = InMemoryStore::new();

        assert!(!store.replace_if_present("a", b"1").unwrap());
        assert_eq!(store.get("a").unwrap(), None);

        assert!(store.insert_if_absent("a", b"1").unwrap());
        assert!(!store.insert_if_absent("a", b"2").unwrap());
        assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));

        assert!(store.replace_if_present("a", b"3").unwrap());
        assert_eq!(store.get("a").unwrap(), Some(b"3".to_vec()));
    }

    #[test]
    fn in_memory_delete_is_idempotent() {
        let store = InMemoryStore::new();
        assert!(!store.delete("missing").unwrap());
        store.put("a", b"1").unwrap();
        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());
        assert!(!store.contains("a").unwrap());
    }

    #[test]
    fn in_memory_scan_is_ordered_by_key() {
        let store = InMemoryStore::new();
        store.put("b", b"2").unwrap();
        store.put("a", b"1").unwrap();
        store.put("c", b"3").unwrap();

        let mut keys = Vec::new();
        store
            .scan(&mut |key, _| {
                keys.push(key.to_string());
                Ok(())
            })
            .unwrap();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn concurrent_insert_if_absent_has_one_winner() {
        let store = Arc::new(InMemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store
                        .insert_if_absent("contended", format!("{i}").as_bytes())
                        .unwrap()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[test]
    fn in_memory_config_builds() {
        let store = BackendConfig::default().build().unwrap();
        store.put("k", b"v").unwrap();
        assert!(store.contains("k").unwrap());
    }
}
