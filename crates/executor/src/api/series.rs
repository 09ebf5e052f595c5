//! Time series operations.

use exo_core::{Auth, Point, ReadOptions, ResourceId, ResourceSelector, SortOrder, Timestamp};
use serde_json::Value;

use super::Client;
use crate::reader::{ReadRequest, SeriesReader};
use crate::{Command, Error, Result, Transport};

impl<T: Transport> Client<T> {
    /// Read points from one resource in a single round trip.
    pub fn read(
        &self,
        auth: &Auth,
        rid: impl Into<ResourceSelector>,
        options: ReadOptions,
    ) -> Result<Vec<Point>> {
        let value = self.executor.execute_one(auth, Command::read(rid, options))?;
        serde_json::from_value(value).map_err(|e| Error::malformed("read", e.to_string()))
    }

    /// A read request using this client's configured chunk size.
    pub fn read_request(&self, limit: u64, sort: SortOrder) -> ReadRequest {
        ReadRequest::new(limit, sort).chunk_size(self.config.chunk_size)
    }

    /// Read several resources into time-aligned rows.
    ///
    /// Nothing is sent until the returned reader is first polled.
    pub fn read_many<'a>(
        &'a self,
        auth: &'a Auth,
        resources: Vec<ResourceId>,
        request: ReadRequest,
    ) -> SeriesReader<'a, T> {
        SeriesReader::new(&self.executor, auth, resources, request)
    }

    /// Append a value to a dataport.
    pub fn write(
        &self,
        auth: &Auth,
        rid: impl Into<ResourceSelector>,
        value: impl Into<Value>,
    ) -> Result<()> {
        let command = Command::Write {
            rid: rid.into(),
            value: value.into(),
        };
        self.executor.execute_one(auth, command).map(|_| ())
    }

    /// Store points at their own timestamps.
    ///
    /// Entries go out in chunks of the configured `chunk_size`, one round
    /// trip per chunk, in order. A failed chunk stops the upload; earlier
    /// chunks stay stored.
    pub fn record(
        &self,
        auth: &Auth,
        rid: impl Into<ResourceSelector>,
        entries: Vec<Point>,
    ) -> Result<()> {
        let rid = rid.into();
        let chunk_size = usize::try_from(self.config.chunk_size)
            .unwrap_or(usize::MAX)
            .max(1);
        for chunk in entries.chunks(chunk_size) {
            self.executor
                .execute_one(auth, Command::record(rid.clone(), chunk.to_vec()))?;
        }
        Ok(())
    }

    /// Delete points from several resources in one round trip.
    ///
    /// `newer_than` and `older_than` are exclusive; when both are given
    /// only points strictly between them are removed.
    pub fn flush(
        &self,
        auth: &Auth,
        rids: &[ResourceId],
        newer_than: Option<Timestamp>,
        older_than: Option<Timestamp>,
    ) -> Result<()> {
        let commands = rids
            .iter()
            .map(|rid| Command::Flush {
                rid: rid.into(),
                newerthan: newer_than,
                olderthan: older_than,
            })
            .collect();
        self.executor.execute(auth, commands).map(|_| ())
    }
}
