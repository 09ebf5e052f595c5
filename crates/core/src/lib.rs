//! Core types for the exo client engine
//!
//! This crate defines the data model shared by every layer:
//! - ResourceId: 40-character hex identifier for a remote resource
//! - ResourceType / ResourceSelector: what a resource is and how to address it
//! - Auth: the authentication context commands are queued against
//! - Point / Row / SortOrder / Selection: time series data
//! - ReadOptions / InfoOptions / ListingOptions: remote procedure options
//! - Error: validation errors

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod options;
pub mod series;
pub mod types;

pub use error::{Error, Result};
pub use options::{InfoOptions, ListingOptions, ReadOptions, INFO_KEYS};
pub use series::{Point, Row, Selection, SortOrder, Timestamp};
pub use types::{Auth, ResourceId, ResourceSelector, ResourceType, RESOURCE_ID_LEN};

/// Opaque JSON value used for point values and info objects.
pub use serde_json::Value;
