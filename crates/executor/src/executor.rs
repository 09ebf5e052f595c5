//! The Executor - deferred multi-call layer over a [`Transport`].
//!
//! The Executor queues a list of commands against one auth context and sends
//! them in a single round trip. It offers two access modes:
//!
//! - [`Executor::execute`] (raising): the first failed command fails the whole
//!   call with that command and its raw result; other results are discarded.
//! - [`Executor::execute_many`] (non-raising): every outcome becomes a
//!   [`Response`]; only a failed round trip is an error.
//!
//! Zero commands never touch the transport.

use std::time::{Duration, Instant};

use exo_core::Auth;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::{CallRecord, Command, Error, Response, Result, Transport};

/// Counters for round trips performed through an [`Executor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundTripStats {
    /// Number of transport dispatches
    pub round_trips: u64,
    /// Number of commands sent across all round trips
    pub commands: u64,
    /// Wall time spent inside the transport
    pub elapsed: Duration,
}

/// The command executor - single entry point to the transport.
///
/// # Example
///
/// ```ignore
/// use exo_executor::{Command, Deferred, Executor, MemoryStore};
///
/// let executor = Executor::new(Deferred::new(MemoryStore::new()));
///
/// // Raising: Vec<Value>, one per command
/// let rids = executor.execute(&auth, vec![Command::lookup_self()])?;
///
/// // Non-raising: Vec<Response>, failures included
/// let responses = executor.execute_many(&auth, vec![Command::lookup_alias("gone")])?;
/// ```
pub struct Executor<T> {
    transport: T,
    stats: Mutex<RoundTripStats>,
}

impl<T: Transport> Executor<T> {
    /// Create an executor over a transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            stats: Mutex::new(RoundTripStats::default()),
        }
    }

    /// Execute commands in one round trip, failing on the first failed command.
    ///
    /// Returns one result per command, in order.
    pub fn execute(&self, auth: &Auth, commands: Vec<Command>) -> Result<Vec<Value>> {
        self.round_trip(auth, commands)?
            .into_iter()
            .map(CallRecord::into_result)
            .collect()
    }

    /// Execute a single command, failing if it fails.
    pub fn execute_one(&self, auth: &Auth, command: Command) -> Result<Value> {
        let mut results = self.execute(auth, vec![command])?;
        results
            .pop()
            .ok_or_else(|| Error::transport("round trip returned no result"))
    }

    /// Execute commands in one round trip without raising for individual failures.
    ///
    /// Returns one [`Response`] per command, in order.
    pub fn execute_many(&self, auth: &Auth, commands: Vec<Command>) -> Result<Vec<Response>> {
        Ok(self
            .round_trip(auth, commands)?
            .into_iter()
            .map(Response::from)
            .collect())
    }

    /// Counters for all round trips so far.
    pub fn stats(&self) -> RoundTripStats {
        *self.stats.lock()
    }

    /// Get a reference to the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn round_trip(&self, auth: &Auth, commands: Vec<Command>) -> Result<Vec<CallRecord>> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }
        if self.transport.has_pending(auth) {
            return Err(Error::BatchInFlight {
                auth: auth.to_string(),
            });
        }

        let count = commands.len();
        for command in commands {
            self.transport.enqueue(auth, command);
        }

        let start = Instant::now();
        let records = self.transport.dispatch(auth);
        let elapsed = start.elapsed();

        {
            let mut stats = self.stats.lock();
            stats.round_trips += 1;
            stats.commands += count as u64;
            stats.elapsed += elapsed;
        }
        debug!(
            target: "exo::executor",
            auth = %auth,
            commands = count,
            elapsed_ms = elapsed.as_millis() as u64,
            ok = records.is_ok(),
            "Round trip"
        );

        let records = records?;
        if records.len() != count {
            return Err(Error::transport(format!(
                "sent {} commands but received {} responses",
                count,
                records.len()
            )));
        }
        Ok(records)
    }
}
