//! Transport seam between the engine and the remote store.
//!
//! The engine only needs three primitives from the outside world, captured
//! by [`Transport`]: queue a command for a context, ask whether anything is
//! queued, and send everything queued in one round trip.
//!
//! Most RPC clients expose a single "call these N procedures" operation
//! instead. [`Deferred`] adapts any such [`Rpc`] into a [`Transport`] by
//! keeping the per-context queue itself.

use std::collections::HashMap;
use std::sync::Arc;

use exo_core::Auth;
use parking_lot::Mutex;

use crate::{CallRecord, Command, Error, Result};

/// Batched remote-procedure transport.
///
/// Implementations must return one [`CallRecord`] per queued command, in
/// queue order, from each `dispatch`, and must leave the context's queue
/// empty afterwards whether or not the round trip succeeded.
pub trait Transport {
    /// Queue one command against a context. No network effect.
    fn enqueue(&self, auth: &Auth, command: Command);

    /// Whether any commands are queued and undispatched for a context.
    fn has_pending(&self, auth: &Auth) -> bool;

    /// Perform exactly one round trip for everything queued on `auth`.
    fn dispatch(&self, auth: &Auth) -> Result<Vec<CallRecord>>;
}

/// A single synchronous multi-command remote call.
pub trait Rpc {
    /// Run `commands` in one round trip and return their outcomes in order.
    fn call(&self, auth: &Auth, commands: &[Command]) -> Result<Vec<CallRecord>>;
}

impl<R: Rpc + ?Sized> Rpc for Arc<R> {
    fn call(&self, auth: &Auth, commands: &[Command]) -> Result<Vec<CallRecord>> {
        (**self).call(auth, commands)
    }
}

impl<R: Rpc + ?Sized> Rpc for &R {
    fn call(&self, auth: &Auth, commands: &[Command]) -> Result<Vec<CallRecord>> {
        (**self).call(auth, commands)
    }
}

/// Queues commands per context and flushes them through an [`Rpc`].
pub struct Deferred<R> {
    rpc: R,
    pending: Mutex<HashMap<Auth, Vec<Command>>>,
}

impl<R: Rpc> Deferred<R> {
    /// Wrap an RPC client.
    pub fn new(rpc: R) -> Self {
        Self {
            rpc,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// The wrapped RPC client.
    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Number of queued commands for a context.
    pub fn pending_len(&self, auth: &Auth) -> usize {
        self.pending.lock().get(auth).map_or(0, Vec::len)
    }
}

impl<R: Rpc> Transport for Deferred<R> {
    fn enqueue(&self, auth: &Auth, command: Command) {
        self.pending
            .lock()
            .entry(auth.clone())
            .or_default()
            .push(command);
    }

    fn has_pending(&self, auth: &Auth) -> bool {
        self.pending.lock().get(auth).is_some_and(|q| !q.is_empty())
    }

    fn dispatch(&self, auth: &Auth) -> Result<Vec<CallRecord>> {
        // Take the queue before calling out so a failed call leaves it empty.
        let commands = self.pending.lock().remove(auth).unwrap_or_default();
        if commands.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.rpc.call(auth, &commands)?;
        if records.len() != commands.len() {
            return Err(Error::transport(format!(
                "sent {} commands but received {} responses",
                commands.len(),
                records.len()
            )));
        }
        Ok(records)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn enqueue(&self, auth: &Auth, command: Command) {
        (**self).enqueue(auth, command)
    }

    fn has_pending(&self, auth: &Auth) -> bool {
        (**self).has_pending(auth)
    }

    fn dispatch(&self, auth: &Auth) -> Result<Vec<CallRecord>> {
        (**self).dispatch(auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    struct Echo {
        calls: Cell<usize>,
        drop_last: bool,
    }

    impl Echo {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
                drop_last: false,
            }
        }
    }

    impl Rpc for Echo {
        fn call(&self, _auth: &Auth, commands: &[Command]) -> Result<Vec<CallRecord>> {
            self.calls.set(self.calls.get() + 1);
            let mut out: Vec<CallRecord> = commands
                .iter()
                .enumerate()
                .map(|(i, c)| CallRecord::ok(c.clone(), json!(i)))
                .collect();
            if self.drop_last {
                out.pop();
            }
            Ok(out)
        }
    }

    #[test]
    fn test_dispatch_returns_records_in_queue_order() {
        let t = Deferred::new(Echo::new());
        let auth = Auth::cik("k");
        t.enqueue(&auth, Command::lookup_alias("a"));
        t.enqueue(&auth, Command::lookup_alias("b"));
        assert!(t.has_pending(&auth));
        assert_eq!(t.pending_len(&auth), 2);

        let records = t.dispatch(&auth).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].command, Command::lookup_alias("a"));
        assert_eq!(records[1].result, json!(1));
        assert!(!t.has_pending(&auth));
    }

    #[test]
    fn test_queues_are_per_context() {
        let t = Deferred::new(Echo::new());
        let a = Auth::cik("a");
        let b = Auth::cik("b");
        t.enqueue(&a, Command::lookup_self());
        assert!(t.has_pending(&a));
        assert!(!t.has_pending(&b));
    }

    #[test]
    fn test_empty_dispatch_skips_rpc() {
        let t = Deferred::new(Echo::new());
        assert!(t.dispatch(&Auth::cik("k")).unwrap().is_empty());
        assert_eq!(t.rpc().calls.get(), 0);
    }

    #[test]
    fn test_short_response_is_transport_failure() {
        let t = Deferred::new(Echo {
            calls: Cell::new(0),
            drop_last: true,
        });
        let auth = Auth::cik("k");
        t.enqueue(&auth, Command::lookup_self());
        t.enqueue(&auth, Command::lookup_self());
        let err = t.dispatch(&auth).unwrap_err();
        assert!(err.is_transport());
        assert!(!t.has_pending(&auth));
    }
}
