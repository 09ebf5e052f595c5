//! Engine configuration loaded from disk.

use exoquery::{Client, Deferred, EngineConfig, SortOrder, CONFIG_FILE_NAME};
use std::sync::Arc;
use tempfile::TempDir;

use crate::common::Portal;

#[test]
fn config_file_drives_batching_and_chunking() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "batch_size = 1\nchunk_size = 10\n").unwrap();
    let config = EngineConfig::from_file(&path).unwrap();

    let portal = Portal::new();
    let client = Client::with_config(Deferred::new(Arc::clone(&portal.store)), config).unwrap();

    client
        .tree(
            &portal.auth,
            client.tree_options(),
            |rid, _| Ok(rid.clone()),
            |_| {},
        )
        .unwrap();
    // One node per round trip: 1 + 3 + 3
    assert_eq!(portal.store.calls(), 7);

    let rows = client
        .read_many(
            &portal.auth,
            vec![portal.series[0].clone()],
            client.read_request(40, SortOrder::Asc),
        )
        .count();
    assert_eq!(rows, 40);
    assert_eq!(portal.store.calls(), 11);
}

#[test]
fn default_file_is_written_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    EngineConfig::write_default_if_missing(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, EngineConfig::default_toml());
    assert_eq!(
        EngineConfig::from_file(&path).unwrap(),
        EngineConfig::default()
    );
}
