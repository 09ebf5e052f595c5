//! Test modules for the executor crate.

pub mod tree;

use std::sync::Arc;

use exo_core::{Auth, Point, ResourceId, ResourceType};
use serde_json::json;

use crate::{Client, Deferred, Executor, MemoryStore};

pub(crate) type TestTransport = Deferred<Arc<MemoryStore>>;

/// A store with one root client, shared by the transport under test.
pub(crate) struct Fixture {
    pub store: Arc<MemoryStore>,
    pub auth: Auth,
    pub root: ResourceId,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let (root, cik) = store.create_root("root");
        Self {
            store,
            auth: Auth::cik(cik),
            root,
        }
    }

    pub fn executor(&self) -> Executor<TestTransport> {
        Executor::new(Deferred::new(Arc::clone(&self.store)))
    }

    pub fn client(&self) -> Client<TestTransport> {
        Client::new(Deferred::new(Arc::clone(&self.store)))
    }

    /// A dataport under the root holding one point per timestamp, valued
    /// with the timestamp itself.
    pub fn dataport(&self, name: &str, timestamps: impl IntoIterator<Item = i64>) -> ResourceId {
        let rid = self
            .store
            .create(&self.root, ResourceType::Dataport, name)
            .unwrap();
        self.store
            .record(&rid, timestamps.into_iter().map(|t| Point::new(t, json!(t))))
            .unwrap();
        rid
    }
}
