//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use exoquery::{Auth, Client, Deferred, MemoryStore, Point, ResourceId, ResourceType};
use serde_json::json;

pub type StoreClient = Client<Deferred<Arc<MemoryStore>>>;

/// A portal with two devices, each holding a few series.
///
/// ```text
/// portal
/// ├── device-1
/// │   ├── temp       (0..200, every 5s)
/// │   └── humidity   (0..200, every 10s)
/// ├── device-2
/// │   └── temp       (100..300, every 5s)
/// └── portal-log     (dataport, 3 points)
/// ```
pub struct Portal {
    pub store: Arc<MemoryStore>,
    pub auth: Auth,
    pub portal: ResourceId,
    pub devices: Vec<ResourceId>,
    pub series: Vec<ResourceId>,
    pub log: ResourceId,
}

impl Portal {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let (portal, cik) = store.create_root("portal");

        let device_1 = store
            .create(&portal, ResourceType::Client, "device-1")
            .unwrap();
        let device_2 = store
            .create(&portal, ResourceType::Client, "device-2")
            .unwrap();
        let log = store
            .create(&portal, ResourceType::Dataport, "portal-log")
            .unwrap();
        store
            .record(&log, (1..=3).map(|t| Point::new(t, json!(format!("event {}", t)))))
            .unwrap();

        let series = vec![
            Self::series(&store, &device_1, "temp", (0..200).step_by(5)),
            Self::series(&store, &device_1, "humidity", (0..200).step_by(10)),
            Self::series(&store, &device_2, "temp", (100..300).step_by(5)),
        ];

        Self {
            store,
            auth: Auth::cik(cik),
            portal,
            devices: vec![device_1, device_2],
            series,
            log,
        }
    }

    fn series(
        store: &MemoryStore,
        parent: &ResourceId,
        name: &str,
        timestamps: impl Iterator<Item = i64>,
    ) -> ResourceId {
        let rid = store.create(parent, ResourceType::Dataport, name).unwrap();
        store
            .record(&rid, timestamps.map(|t| Point::new(t, json!(t as f64 / 10.0))))
            .unwrap();
        store.map(&rid, name).unwrap();
        rid
    }

    pub fn client(&self) -> StoreClient {
        Client::new(Deferred::new(Arc::clone(&self.store)))
    }
}
