//! exoquery - client-side query engine for hierarchical time-series resources
//!
//! exoquery talks to a remote server that exposes a tree of resources
//! (clients containing dataports, datarules, dispatches and further
//! clients) through a batched RPC interface. It turns many small requests
//! into few round trips.
//!
//! # Quick Start
//!
//! ```ignore
//! use exoquery::{Auth, Client, Deferred, MemoryStore, SortOrder};
//!
//! let client = Client::new(Deferred::new(MemoryStore::new()));
//! let auth = Auth::cik(cik);
//!
//! // Whole hierarchy, one round trip per generation
//! let tree = client.tree(&auth, client.tree_options(), |rid, _| Ok(rid.clone()), |_| {})?;
//!
//! // Many series, chunked and merged into rows
//! let request = client.read_request(5000, SortOrder::Desc);
//! for row in client.read_many(&auth, rids, request) {
//!     let row = row?;
//! }
//! ```
//!
//! # Architecture
//!
//! All remote work goes through the [`Executor`], which sends one round
//! trip per batch of commands. The [`Client`] struct provides a convenient
//! high-level interface over it.

// Re-export the public API from exo-executor
pub use exo_executor::*;
