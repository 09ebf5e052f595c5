//! Core types for the exo client engine
//!
//! This module defines the foundational identifiers:
//! - ResourceId: 40-character hexadecimal resource identifier
//! - ResourceType: Discriminates between resource kinds (client, dataport, ...)
//! - ResourceSelector: Addresses a resource by rid or by alias
//! - Auth: The authentication context commands are queued against

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Length of a resource identifier in hex characters.
pub const RESOURCE_ID_LEN: usize = 40;

/// Opaque identifier of a resource in the remote hierarchy.
///
/// A ResourceId is exactly 40 hexadecimal characters. Equality is an exact
/// string match, so `"AB..."` and `"ab..."` are different ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(String);

impl ResourceId {
    /// Parse and validate a resource identifier.
    ///
    /// # Errors
    /// Returns `Error::InvalidResourceId` if the string is not 40 hex chars.
    pub fn parse(s: &str) -> Result<Self> {
        if Self::is_valid(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(Error::InvalidResourceId(s.to_string()))
        }
    }

    /// The identifier whose hex digits spell `index`, zero-padded.
    pub fn from_index(index: u64) -> Self {
        Self(format!("{:040x}", index))
    }

    /// Check whether a string has the shape of a resource identifier.
    pub fn is_valid(s: &str) -> bool {
        s.len() == RESOURCE_ID_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Get the string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ResourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        if Self::is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(Error::InvalidResourceId(s))
        }
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

/// Kind of a remote resource.
///
/// Only clients contain other resources; everything else is a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// Container resource owning children
    Client,
    /// Time series data stream
    Dataport,
    /// Scripted or computed data stream
    Datarule,
    /// Outbound notification resource
    Dispatch,
}

impl ResourceType {
    /// All resource types, in the order the tree builder lists them.
    pub const ALL: [ResourceType; 4] = [
        ResourceType::Client,
        ResourceType::Dataport,
        ResourceType::Datarule,
        ResourceType::Dispatch,
    ];

    /// Whether resources of this type have children.
    pub fn is_container(&self) -> bool {
        matches!(self, ResourceType::Client)
    }

    /// Whether points can be read from resources of this type.
    pub fn is_readable(&self) -> bool {
        matches!(self, ResourceType::Dataport | ResourceType::Datarule)
    }

    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Client => "client",
            ResourceType::Dataport => "dataport",
            ResourceType::Datarule => "datarule",
            ResourceType::Dispatch => "dispatch",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "client" => Ok(ResourceType::Client),
            "dataport" => Ok(ResourceType::Dataport),
            "datarule" => Ok(ResourceType::Datarule),
            "dispatch" => Ok(ResourceType::Dispatch),
            other => Err(Error::InvalidInput(format!("unknown resource type '{}'", other))),
        }
    }
}

/// Addresses a resource either directly or through an alias.
///
/// `Alias("")` is the resource the auth context itself belongs to.
/// Serializes as a bare rid string or as `{"alias": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceSelector {
    /// A resource identifier
    Rid(ResourceId),
    /// An alias relative to the calling client
    Alias {
        /// Alias name; empty means the calling client itself
        alias: String,
    },
}

impl ResourceSelector {
    /// The calling client itself.
    pub fn own() -> Self {
        ResourceSelector::Alias {
            alias: String::new(),
        }
    }

    /// Select by alias.
    pub fn alias(alias: impl Into<String>) -> Self {
        ResourceSelector::Alias {
            alias: alias.into(),
        }
    }

    /// The rid, when the selector is a direct reference.
    pub fn rid(&self) -> Option<&ResourceId> {
        match self {
            ResourceSelector::Rid(rid) => Some(rid),
            ResourceSelector::Alias { .. } => None,
        }
    }
}

impl From<ResourceId> for ResourceSelector {
    fn from(rid: ResourceId) -> Self {
        ResourceSelector::Rid(rid)
    }
}

impl From<&ResourceId> for ResourceSelector {
    fn from(rid: &ResourceId) -> Self {
        ResourceSelector::Rid(rid.clone())
    }
}

impl fmt::Display for ResourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceSelector::Rid(rid) => write!(f, "{}", rid),
            ResourceSelector::Alias { alias } => write!(f, "alias:{:?}", alias),
        }
    }
}

/// Authentication context.
///
/// Commands are queued per context, and every round trip is made on behalf
/// of exactly one context. A context acting on a child client carries the
/// child's rid in `client_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Auth {
    /// Client interface key
    pub cik: String,
    /// Child client to act as, using the owner's key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<ResourceId>,
}

impl Auth {
    /// Context authenticated by a client key.
    pub fn cik(cik: impl Into<String>) -> Self {
        Self {
            cik: cik.into(),
            client_id: None,
        }
    }

    /// Context acting as a child client of the key's owner.
    pub fn as_client(&self, client_id: ResourceId) -> Self {
        Self {
            cik: self.cik.clone(),
            client_id: Some(client_id),
        }
    }
}

impl fmt::Display for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Keys are credentials; only a prefix is ever printed.
        let shown: String = self.cik.chars().take(8).collect();
        match &self.client_id {
            Some(client) => write!(f, "{}…/{}", shown, client),
            None => write!(f, "{}…", shown),
        }
    }
}
