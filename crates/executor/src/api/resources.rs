//! Resource metadata, lookup and hierarchy operations.

use exo_core::{Auth, InfoOptions, ListingOptions, ResourceId, ResourceSelector, ResourceType};
use serde_json::Value;

use super::Client;
use crate::tree::{parse_listing, NodeInfo, NodeVisit, TreeBuilder, TreeNode, TreeOptions};
use crate::{Command, Error, LookupKind, Result, Transport};

/// Children of a client grouped by type, in the order the types were asked for.
pub type Listing = Vec<(ResourceType, Vec<ResourceId>)>;

impl<T: Transport> Client<T> {
    // =========================================================================
    // Metadata
    // =========================================================================

    /// Get a resource's info object.
    pub fn info(
        &self,
        auth: &Auth,
        rid: impl Into<ResourceSelector>,
        options: InfoOptions,
    ) -> Result<Value> {
        self.executor.execute_one(auth, Command::info(rid, options))
    }

    /// Get a client's key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the resource has no key, i.e. it
    /// is not a client.
    pub fn key(&self, auth: &Auth, rid: impl Into<ResourceSelector>) -> Result<String> {
        let rid = rid.into();
        let info = self.info(auth, rid.clone(), InfoOptions::key_only())?;
        match info.get("key") {
            Some(Value::String(key)) => Ok(key.clone()),
            _ => Err(Error::invalid_input(format!("{} has no key", rid))),
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Resolve an alias of a child of the calling client.
    pub fn lookup(&self, auth: &Auth, alias: &str) -> Result<ResourceId> {
        let value = self.executor.execute_one(auth, Command::lookup_alias(alias))?;
        parse_rid("lookup", value)
    }

    /// Resolve the rid of the calling client.
    pub fn lookup_aliased_self(&self, auth: &Auth) -> Result<ResourceId> {
        let value = self.executor.execute_one(auth, Command::lookup_self())?;
        parse_rid("lookup", value)
    }

    /// Resolve the client that owns `rid`.
    pub fn lookup_owner(&self, auth: &Auth, rid: &ResourceId) -> Result<ResourceId> {
        let command = Command::Lookup {
            kind: LookupKind::Owner,
            key: rid.as_str().to_string(),
        };
        parse_rid("lookup", self.executor.execute_one(auth, command)?)
    }

    /// Resolve the resource behind a share code.
    pub fn lookup_shared(&self, auth: &Auth, code: &str) -> Result<ResourceId> {
        let command = Command::Lookup {
            kind: LookupKind::Shared,
            key: code.to_string(),
        };
        parse_rid("lookup", self.executor.execute_one(auth, command)?)
    }

    // =========================================================================
    // Hierarchy
    // =========================================================================

    /// List the children of a client.
    pub fn listing(
        &self,
        auth: &Auth,
        types: &[ResourceType],
        options: ListingOptions,
        rid: impl Into<ResourceSelector>,
    ) -> Result<Listing> {
        let value = self
            .executor
            .execute_one(auth, Command::listing(types.to_vec(), options, rid))?;
        Ok(group_by_type(parse_listing(&value, types)?, types))
    }

    /// Drop resources and everything below them, in one round trip.
    pub fn drop_resources(&self, auth: &Auth, rids: &[ResourceId]) -> Result<()> {
        let commands = rids
            .iter()
            .map(|rid| Command::Drop { rid: rid.clone() })
            .collect();
        self.executor.execute(auth, commands).map(|_| ())
    }

    /// Tree options taken from this client's configuration.
    pub fn tree_options(&self) -> TreeOptions {
        TreeOptions {
            types: self.config.listing_types.clone(),
            batch_size: self.config.batch_size,
            ..TreeOptions::default()
        }
    }

    /// Build the resource tree below `auth`'s client.
    ///
    /// See [`TreeBuilder::build`] for the hooks.
    pub fn tree<F, V>(
        &self,
        auth: &Auth,
        options: TreeOptions,
        node_id: F,
        visit: V,
    ) -> Result<TreeNode>
    where
        F: FnMut(&ResourceId, &NodeInfo) -> Result<ResourceId>,
        V: FnMut(&NodeVisit<'_>),
    {
        TreeBuilder::new(&self.executor, auth, options).build(node_id, visit)
    }
}

fn parse_rid(procedure: &str, value: Value) -> Result<ResourceId> {
    match value {
        Value::String(s) => Ok(ResourceId::parse(&s)?),
        other => Err(Error::malformed(procedure, format!("not a rid: {}", other))),
    }
}

fn group_by_type(
    pairs: Vec<(ResourceType, ResourceId)>,
    types: &[ResourceType],
) -> Listing {
    let mut listing: Listing = types.iter().map(|t| (*t, Vec::new())).collect();
    for (kind, rid) in pairs {
        if let Some((_, rids)) = listing.iter_mut().find(|(t, _)| *t == kind) {
            rids.push(rid);
        }
    }
    listing
}
