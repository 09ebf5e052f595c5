//! Option objects passed to remote procedures
//!
//! These serialize to exactly the JSON objects the remote store expects;
//! unset fields are omitted rather than sent as null.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::series::{Selection, SortOrder, Timestamp};

/// Options for a `read` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Maximum number of points to return
    pub limit: u64,
    /// Order of returned points
    #[serde(default)]
    pub sort: SortOrder,
    /// Inclusive lower time bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starttime: Option<Timestamp>,
    /// Inclusive upper time bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endtime: Option<Timestamp>,
    /// Server-side down-sampling
    #[serde(default)]
    pub selection: Selection,
}

impl ReadOptions {
    /// Read up to `limit` points in the given order, unbounded in time.
    pub fn new(limit: u64, sort: SortOrder) -> Self {
        Self {
            limit,
            sort,
            starttime: None,
            endtime: None,
            selection: Selection::All,
        }
    }

    /// Set the inclusive time window.
    pub fn window(mut self, starttime: Option<Timestamp>, endtime: Option<Timestamp>) -> Self {
        self.starttime = starttime;
        self.endtime = endtime;
        self
    }

    /// Set the selection mode.
    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }
}

/// Keys an `info` call may return.
pub const INFO_KEYS: [&str; 9] = [
    "aliases",
    "basic",
    "counts",
    "description",
    "key",
    "shares",
    "subscribers",
    "tags",
    "usage",
];

/// Options for an `info` call: which info keys to include.
///
/// An empty set asks the server for its default info object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InfoOptions(BTreeMap<String, bool>);

impl InfoOptions {
    /// Server defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request one more key.
    pub fn with(mut self, key: impl Into<String>) -> Self {
        self.0.insert(key.into(), true);
        self
    }

    /// Only the client key.
    pub fn key_only() -> Self {
        Self::new().with("key")
    }

    /// Build options from include and exclude lists.
    ///
    /// The server returns nothing when any key is set to false, so exclusion
    /// is expressed by requesting every known key except the excluded ones.
    /// When `exclude` is empty, exactly the `include` keys are requested.
    pub fn from_include_exclude(include: &[&str], exclude: &[&str]) -> Self {
        let mut options = Self::new();
        if !exclude.is_empty() {
            for key in INFO_KEYS.iter().filter(|k| !exclude.contains(k)) {
                options.0.insert((*key).to_string(), true);
            }
        } else {
            for key in include {
                options.0.insert((*key).to_string(), true);
            }
        }
        options
    }

    /// Whether `key` is requested.
    pub fn includes(&self, key: &str) -> bool {
        self.0.get(key).copied().unwrap_or(false)
    }

    /// Whether no keys are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Requested keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter(|(_, on)| **on).map(|(k, _)| k.as_str())
    }
}

/// Options for a `listing` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingOptions {
    /// Only resources owned by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned: Option<bool>,
    /// Only public resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    /// Only resources shared with and activated by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated: Option<bool>,
    /// Only aliased resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliased: Option<bool>,
}
