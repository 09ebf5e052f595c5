//! Command enum defining the remote procedures the engine issues.
//!
//! Commands are the "instruction set" sent over the batched transport. Every
//! remote operation the engine performs is represented as a variant here.
//!
//! Commands are:
//! - **Self-contained**: All arguments for the procedure are in the variant
//! - **Immutable once queued**: The transport takes them by value
//! - **Positional on the wire**: [`Command::arguments`] renders the ordered
//!   argument list the remote procedure expects

use exo_core::{
    InfoOptions, ListingOptions, Point, ReadOptions, ResourceId, ResourceSelector, ResourceType,
    Timestamp, Value,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// What a `lookup` call resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupKind {
    /// Alias of a child of the calling client
    Alias,
    /// The calling client's own rid (key is empty)
    Aliased,
    /// Owner of a rid
    Owner,
    /// Resource behind a share code
    Shared,
}

impl LookupKind {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKind::Alias => "alias",
            LookupKind::Aliased => "aliased",
            LookupKind::Owner => "owner",
            LookupKind::Shared => "shared",
        }
    }
}

/// A remote operation plus its arguments.
///
/// # Command Categories
///
/// | Category | Variants | Description |
/// |----------|----------|-------------|
/// | Data | `Read`, `Write`, `Record`, `Flush` | Time series access |
/// | Metadata | `Info`, `Listing`, `Lookup` | Hierarchy inspection |
/// | Lifecycle | `Drop` | Resource removal |
///
/// # Example
///
/// ```ignore
/// use exo_executor::Command;
/// use exo_core::{ReadOptions, SortOrder};
///
/// let cmd = Command::read(rid, ReadOptions::new(10, SortOrder::Desc));
/// assert_eq!(cmd.procedure(), "read");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum Command {
    /// Read points from a series.
    /// Returns: list of `[timestamp, value]` pairs
    Read {
        /// Series to read
        rid: ResourceSelector,
        /// Count, order and window
        options: ReadOptions,
    },

    /// Write one value at the current time.
    /// Returns: null
    Write {
        /// Series to write to
        rid: ResourceSelector,
        /// Value to store
        value: Value,
    },

    /// Store values at given timestamps.
    /// Returns: null
    Record {
        /// Series to write to
        rid: ResourceSelector,
        /// Points to store, sent as `[[timestamp, value], ...]`
        entries: Vec<Point>,
    },

    /// Delete points, optionally bounded in time.
    /// Returns: null
    Flush {
        /// Series to delete from
        rid: ResourceSelector,
        /// Only delete points after this time
        #[serde(default, skip_serializing_if = "Option::is_none")]
        newerthan: Option<Timestamp>,
        /// Only delete points before this time
        #[serde(default, skip_serializing_if = "Option::is_none")]
        olderthan: Option<Timestamp>,
    },

    /// Get a resource's metadata.
    /// Returns: info object
    Info {
        /// Resource to describe
        rid: ResourceSelector,
        /// Info keys to include
        options: InfoOptions,
    },

    /// List a client's children, grouped by type.
    /// Returns: `{type: [rid, ...]}`
    Listing {
        /// Child types to list
        types: Vec<ResourceType>,
        /// Filters on the listed children
        options: ListingOptions,
        /// Client whose children are listed
        rid: ResourceSelector,
    },

    /// Resolve an alias, owner or share code to a rid.
    /// Returns: rid string
    Lookup {
        /// What `key` names
        kind: LookupKind,
        /// Alias, rid or share code
        key: String,
    },

    /// Remove a resource and everything below it.
    /// Returns: null
    Drop {
        /// Resource to remove
        rid: ResourceId,
    },
}

impl Command {
    /// Read points from a resource.
    pub fn read(rid: impl Into<ResourceSelector>, options: ReadOptions) -> Self {
        Command::Read {
            rid: rid.into(),
            options,
        }
    }

    /// Get metadata for a resource.
    pub fn info(rid: impl Into<ResourceSelector>, options: InfoOptions) -> Self {
        Command::Info {
            rid: rid.into(),
            options,
        }
    }

    /// List the children of a client.
    pub fn listing(
        types: Vec<ResourceType>,
        options: ListingOptions,
        rid: impl Into<ResourceSelector>,
    ) -> Self {
        Command::Listing {
            types,
            options,
            rid: rid.into(),
        }
    }

    /// Store points on a series.
    pub fn record(rid: impl Into<ResourceSelector>, entries: Vec<Point>) -> Self {
        Command::Record {
            rid: rid.into(),
            entries,
        }
    }

    /// Resolve the rid of the calling client.
    pub fn lookup_self() -> Self {
        Command::Lookup {
            kind: LookupKind::Aliased,
            key: String::new(),
        }
    }

    /// Resolve an alias of a child of the calling client.
    pub fn lookup_alias(alias: impl Into<String>) -> Self {
        Command::Lookup {
            kind: LookupKind::Alias,
            key: alias.into(),
        }
    }

    /// Name of the remote procedure.
    pub fn procedure(&self) -> &'static str {
        match self {
            Command::Read { .. } => "read",
            Command::Write { .. } => "write",
            Command::Record { .. } => "record",
            Command::Flush { .. } => "flush",
            Command::Info { .. } => "info",
            Command::Listing { .. } => "listing",
            Command::Lookup { .. } => "lookup",
            Command::Drop { .. } => "drop",
        }
    }

    /// Ordered argument list, auth omitted, as sent on the wire.
    pub fn arguments(&self) -> Vec<Value> {
        match self {
            Command::Read { rid, options } => vec![json!(rid), json!(options)],
            Command::Write { rid, value } => vec![json!(rid), value.clone()],
            Command::Record { rid, entries } => vec![json!(rid), json!(entries)],
            Command::Flush {
                rid,
                newerthan,
                olderthan,
            } => {
                let mut args = vec![json!(rid)];
                let mut options = serde_json::Map::new();
                if let Some(t) = newerthan {
                    options.insert("newerthan".to_string(), json!(t));
                }
                if let Some(t) = olderthan {
                    options.insert("olderthan".to_string(), json!(t));
                }
                // flush takes no options argument at all when unbounded
                if !options.is_empty() {
                    args.push(Value::Object(options));
                }
                args
            }
            Command::Info { rid, options } => vec![json!(rid), json!(options)],
            Command::Listing {
                types,
                options,
                rid,
            } => vec![json!(types), json!(options), json!(rid)],
            Command::Lookup { kind, key } => vec![json!(kind.as_str()), json!(key)],
            Command::Drop { rid } => vec![json!(rid)],
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let args: Vec<String> = self.arguments().iter().map(|a| a.to_string()).collect();
        write!(f, "{}({})", self.procedure(), args.join(", "))
    }
}
