//! Lifecycle against the durable redb backend.

#![cfg(feature = "embedded")]

mod common;

use std::sync::Arc;

use common::{controller_with, hybrid};
use store::{BackendConfig, RedbStore};
use tableconfigs::TableConfigsError;
use tempfile::tempdir;

#[test]
fn resources_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tableconfigs.redb");

    {
        let store = Arc::new(RedbStore::open(&path).unwrap());
        let controller = controller_with(store);
        controller.create(&hybrid("events").to_string()).unwrap();
        controller.create(&hybrid("clicks").to_string()).unwrap();
        controller.delete("clicks").unwrap();
    }

    let store = BackendConfig::redb(path.to_string_lossy()).build().unwrap();
    let controller = controller_with(Arc::from(store));
    assert_eq!(controller.names().unwrap(), vec!["events"]);
    assert_eq!(controller.get("events").unwrap().table_name, "events");
    assert!(matches!(
        controller.create(&hybrid("events").to_string()),
        Err(TableConfigsError::AlreadyExists { .. })
    ));
}
