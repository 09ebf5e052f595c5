//! Listing with per-child metadata in two round trips.

use exo_core::{
    Auth, InfoOptions, ListingOptions, Point, ReadOptions, ResourceId, ResourceSelector,
    ResourceType,
};
use serde_json::Value;

use super::Client;
use crate::tree::parse_listing;
use crate::{Command, Error, Result, Transport};

/// A listed child with its info and, for readable types, its latest points.
#[derive(Debug, Clone, PartialEq)]
pub struct ListedResource {
    /// Child rid
    pub rid: ResourceId,
    /// Info object
    pub info: Value,
    /// Points read, when reads were requested and the type is readable
    pub read: Option<Vec<Point>>,
}

/// Listed children grouped by type, in the order the types were asked for.
pub type ListingWithInfo = Vec<(ResourceType, Vec<ListedResource>)>;

impl<T: Transport> Client<T> {
    /// List the calling client's children together with their info.
    ///
    /// One round trip lists the children. A second sends an info command
    /// per child, followed by a read per dataport and datarule when
    /// `read_options` is given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `types` is empty, and fails on the
    /// first failed command of either round trip.
    pub fn listing_with_info(
        &self,
        auth: &Auth,
        types: &[ResourceType],
        info_options: InfoOptions,
        listing_options: ListingOptions,
        read_options: Option<ReadOptions>,
    ) -> Result<ListingWithInfo> {
        if types.is_empty() {
            return Err(Error::invalid_input("listing needs at least one type"));
        }
        let listing = self.executor.execute_one(
            auth,
            Command::listing(types.to_vec(), listing_options, ResourceSelector::own()),
        )?;
        let rids = parse_listing(&listing, types)?;

        let readable: Vec<&ResourceId> = match &read_options {
            Some(_) => rids
                .iter()
                .filter(|(kind, _)| kind.is_readable())
                .map(|(_, rid)| rid)
                .collect(),
            None => Vec::new(),
        };
        let mut commands: Vec<Command> = rids
            .iter()
            .map(|(_, rid)| Command::info(rid, info_options.clone()))
            .collect();
        if let Some(options) = &read_options {
            commands.extend(readable.iter().map(|rid| Command::read(*rid, options.clone())));
        }

        let mut results = self.executor.execute(auth, commands)?.into_iter();
        let infos: Vec<Value> = results.by_ref().take(rids.len()).collect();
        let mut reads = readable
            .iter()
            .map(|_| {
                let value = results
                    .next()
                    .ok_or_else(|| Error::malformed("read", "missing response"))?;
                serde_json::from_value::<Vec<Point>>(value)
                    .map_err(|e| Error::malformed("read", e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter();

        let mut grouped: ListingWithInfo = types.iter().map(|t| (*t, Vec::new())).collect();
        for ((kind, rid), info) in rids.iter().zip(infos) {
            let read = if read_options.is_some() && kind.is_readable() {
                reads.next()
            } else {
                None
            };
            if let Some((_, members)) = grouped.iter_mut().find(|(t, _)| t == kind) {
                members.push(ListedResource {
                    rid: rid.clone(),
                    info,
                    read,
                });
            }
        }
        Ok(grouped)
    }
}
