//! Redb (Rust embedded database) backend for the table-configs metadata store.
//!
//! Redb is a pure Rust embedded key-value store with ACID transactions and a
//! single writer at a time. Conditional writes run their existence check and
//! their insert inside one write transaction, so the check cannot be
//! invalidated by another writer before commit.
//!
//! # Configuration Example
//! ```yaml
//! store:
//!   backend: "redb"
//!   path: "/data/tableconfigs.redb"
//! ```

use crate::{MetadataStore, StoreError};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

/// Table holding one serialized composite resource per name.
const TABLE_CONFIGS: TableDefinition<&str, &[u8]> = TableDefinition::new("table_configs");

/// Redb-backed [`MetadataStore`].
///
/// The `Arc<Database>` wrapper allows safe sharing across threads.
/// Redb handles its own internal locking and MVCC.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a Redb database at the given path.
    ///
    /// # Example
    /// ```no_run
    /// use store::RedbStore;
    ///
    /// let store = RedbStore::open("/tmp/tableconfigs.redb").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref()).map_err(StoreError::backend)?;

        // Accessing the table creates it if it doesn't exist
        let write_txn = db.begin_write().map_err(StoreError::backend)?;
        {
            let _table = write_txn
                .open_table(TABLE_CONFIGS)
                .map_err(StoreError::backend)?;
        }
        write_txn.commit().map_err(StoreError::backend)?;

        tracing::debug!(path = %path.as_ref().display(), "opened redb metadata store");
        Ok(Self { db: Arc::new(db) })
    }

    fn insert(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write().map_err(StoreError::backend)?;
        {
            let mut table = write_txn
                .open_table(TABLE_CONFIGS)
                .map_err(StoreError::backend)?;
            table.insert(key, value).map_err(StoreError::backend)?;
        }
        write_txn.commit().map_err(StoreError::backend)
    }
}

impl MetadataStore for RedbStore {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.insert(key, value)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let read_txn = self.db.begin_read().map_err(StoreError::backend)?;
        let table = read_txn
            .open_table(TABLE_CONFIGS)
            .map_err(StoreError::backend)?;

        match table.get(key).map_err(StoreError::backend)? {
            Some(value) => Ok(Some(value.value().to_vec())),
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write().map_err(StoreError::backend)?;
        let existed = {
            let mut table = write_txn
                .open_table(TABLE_CONFIGS)
                .map_err(StoreError::backend)?;
            let removed = table.remove(key).map_err(StoreError::backend)?;
            removed.is_some()
        };
        write_txn.commit().map_err(StoreError::backend)?;
        Ok(existed)
    }

    fn scan(
        &self,
        visitor: &mut dyn FnMut(&str, &[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let read_txn = self.db.begin_read().map_err(StoreError::backend)?;
        let table = read_txn
            .open_table(TABLE_CONFIGS)
            .map_err(StoreError::backend)?;

        for item in table.iter().map_err(StoreError::backend)? {
            let (key, value) = item.map_err(StoreError::backend)?;
            visitor(key.value(), value.value())?;
        }
        Ok(())
    }

    fn insert_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        self.write_when(key, value, false)
    }

    fn replace_if_present(&self, key: &str, value: &[u8]) -> Result<bool, StoreError> {
        self.write_when(key, value, true)
    }
}

impl RedbStore {
    /// Insert `value` iff the key's existence equals `must_exist`, inside one
    /// write transaction.
    fn write_when(&self, key: &str, value: &[u8], must_exist: bool) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write().map_err(StoreError::backend)?;
        {
            let mut table = write_txn
                .open_table(TABLE_CONFIGS)
                .map_err(StoreError::backend)?;
            let exists = table.get(key).map_err(StoreError::backend)?.is_some();
            if exists != must_exist {
                drop(table);
                write_txn.abort().map_err(StoreError::backend)?;
                return Ok(false);
            }
            table.insert(key, value).map_err(StoreError::backend)?;
        }
        write_txn.commit().map_err(StoreError::backend)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_redb_store_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path()).unwrap();

        store.put("key1", b"value1").unwrap();
        assert_eq!(store.get("key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(store.get("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_redb_store_conditional_writes() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path()).unwrap();

        assert!(!store.replace_if_present("key1", b"v0").unwrap());
        assert_eq!(store.get("key1").unwrap(), None);

        assert!(store.insert_if_absent("key1", b"v1").unwrap());
        assert!(!store.insert_if_absent("key1", b"v2").unwrap());
        assert_eq!(store.get("key1").unwrap(), Some(b"v1".to_vec()));

        assert!(store.replace_if_present("key1", b"v3").unwrap());
        assert_eq!(store.get("key1").unwrap(), Some(b"v3".to_vec()));
    }

    #[test]
    fn test_redb_store_delete() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path()).unwrap();

        store.put("key1", b"value1").unwrap();
        assert!(store.delete("key1").unwrap());
        assert_eq!(store.get("key1").unwrap(), None);
        // absent key
        assert!(!store.delete("key1").unwrap());
    }

    #[test]
    fn test_redb_store_scan() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path()).unwrap();

        store.put("key2", b"value2").unwrap();
        store.put("key1", b"value1").unwrap();

        let mut collected = Vec::new();
        store
            .scan(&mut |key, value| {
                collected.push((key.to_string(), value.to_vec()));
                Ok(())
            })
            .unwrap();

        assert_eq!(
            collected,
            vec![
                ("key1".to_string(), b"value1".to_vec()),
                ("key2".to_string(), b"value2".to_vec()),
            ]
        );
    }

    #[test]
    fn test_redb_store_survives_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        {
            let store = RedbStore::open(temp_file.path()).unwrap();
            store.insert_if_absent("key1", b"value1").unwrap();
        }
        let store = RedbStore::open(temp_file.path()).unwrap();
        assert_eq!(store.get("key1").unwrap(), Some(b"value1".to_vec()));
    }
}
