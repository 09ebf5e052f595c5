//! # Exo Executor
//!
//! Client-side engine for batched remote queries against a hierarchical
//! time-series resource server.
//!
//! It provides:
//! - [`Executor`] - queues commands per auth context and sends them in one
//!   round trip, raising or non-raising
//! - [`dispatch`] - sends many independent command sets in a bounded number
//!   of round trips
//! - [`SeriesReader`] - reads many series in chunks and merges them into
//!   time-aligned rows
//! - [`TreeBuilder`] - materializes a resource hierarchy one generation per
//!   round trip
//! - [`Client`] - typed wrapper over all of the above
//!
//! ## Quick Start
//!
//! ```text
//! use exo_executor::{Client, Deferred, MemoryStore};
//! use exo_core::{Auth, SortOrder};
//!
//! let client = Client::new(Deferred::new(MemoryStore::new()));
//! let auth = Auth::cik(cik);
//!
//! let request = client.read_request(1000, SortOrder::Desc);
//! for row in client.read_many(&auth, rids, request) {
//!     let row = row?;
//!     println!("{} {:?}", row.timestamp, row.values);
//! }
//! ```
//!
//! ## Round trips
//!
//! | Operation | Round trips |
//! |-----------|-------------|
//! | `execute` / `execute_many` | 1 (0 for no commands) |
//! | `dispatch` of N sets, batch B | ceil(N / B) |
//! | `read_many`, limit <= chunk | 1 |
//! | `read_many`, limit > chunk | at most ceil(limit / chunk) + 1 |
//! | `record` of N points | ceil(N / chunk) (0 for no points) |
//! | `tree` | one per generation, split by batch size |

#![warn(missing_docs)]

mod api;
mod command;
mod config;
pub mod dispatch;
mod error;
mod executor;
mod memory;
pub mod merge;
mod output;
pub mod reader;
mod transport;
pub mod tree;

// Test modules
#[cfg(test)]
mod tests;

// =============================================================================
// Public API - Everything users need is re-exported here
// =============================================================================

pub use api::{Client, ListedResource, Listing, ListingWithInfo};
pub use command::{Command, LookupKind};
pub use config::{EngineConfig, CONFIG_FILE_NAME};
pub use dispatch::{dispatch, Batches, CommandSet, Completed, DEFAULT_BATCH_SIZE};
pub use error::{Error, ErrorCategory};
pub use executor::{Executor, RoundTripStats};
pub use memory::{MemoryStore, STATUS_AUTH, STATUS_INVALID, STATUS_RESTRICTED};
pub use merge::merge;
pub use output::{CallRecord, Response};
pub use reader::{ReadRequest, SeriesCursor, SeriesReader, DEFAULT_CHUNK_SIZE};
pub use transport::{Deferred, Rpc, Transport};
pub use tree::{NodeInfo, NodeVisit, TreeBuilder, TreeNode, TreeOptions};

// Re-export the data model so users don't need exo-core directly
pub use exo_core::{
    Auth, InfoOptions, ListingOptions, Point, ReadOptions, ResourceId, ResourceSelector,
    ResourceType, Row, Selection, SortOrder, Timestamp, Value,
};

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;
