//! Command batch dispatcher.
//!
//! Groups [`CommandSet`]s into batches of at most `batch_size` sets, sends
//! each batch as one non-raising multi-call, and splits the flat response
//! list back into one slice per set using each set's own command count.
//!
//! Instead of a completion callback, every set carries a caller-owned
//! `context` value that comes back, by value, next to its responses.
//!
//! The returned [`Batches`] iterator is lazy, forward-only and not
//! restartable. Pulling an item performs at most one round trip. After a
//! transport failure it yields that error once and then ends.

use std::collections::VecDeque;

use exo_core::Auth;
use tracing::debug;

use crate::{Command, Executor, Response, Result, Transport};

/// Default number of command sets per round trip.
///
/// Keeps requests small enough to finish well inside server timeouts.
pub const DEFAULT_BATCH_SIZE: usize = 25;

/// Commands for one logical unit of work, plus the caller's context.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSet<C> {
    /// Commands, in the order their responses are wanted
    pub commands: Vec<Command>,
    /// Returned unchanged with the responses
    pub context: C,
}

impl<C> CommandSet<C> {
    /// Create a command set.
    pub fn new(commands: Vec<Command>, context: C) -> Self {
        Self { commands, context }
    }
}

/// Responses for one [`CommandSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct Completed<C> {
    /// The set's context
    pub context: C,
    /// One response per command in the set
    pub responses: Vec<Response>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchState {
    Running,
    Exhausted,
    Failed,
}

/// Lazy sequence of per-set responses. See [`dispatch`].
pub struct Batches<'a, T, I, C> {
    executor: &'a Executor<T>,
    auth: &'a Auth,
    sets: I,
    batch_size: usize,
    ready: VecDeque<Completed<C>>,
    state: BatchState,
    batches_sent: usize,
}

/// Dispatch command sets in batches of `batch_size` sets per round trip.
///
/// A `batch_size` of zero is treated as one.
pub fn dispatch<'a, T, S, C>(
    executor: &'a Executor<T>,
    auth: &'a Auth,
    sets: S,
    batch_size: usize,
) -> Batches<'a, T, S::IntoIter, C>
where
    T: Transport,
    S: IntoIterator<Item = CommandSet<C>>,
{
    Batches {
        executor,
        auth,
        sets: sets.into_iter(),
        batch_size: batch_size.max(1),
        ready: VecDeque::new(),
        state: BatchState::Running,
        batches_sent: 0,
    }
}

impl<'a, T, I, C> Batches<'a, T, I, C>
where
    T: Transport,
    I: Iterator<Item = CommandSet<C>>,
{
    /// Number of round trips made so far. Groups of empty sets are not
    /// sent and not counted.
    pub fn batches_sent(&self) -> usize {
        self.batches_sent
    }

    /// Whether the sequence has ended, normally or by failure.
    pub fn is_finished(&self) -> bool {
        self.state != BatchState::Running && self.ready.is_empty()
    }

    fn run_batch(&mut self) -> Result<bool> {
        let group: Vec<CommandSet<C>> = self.sets.by_ref().take(self.batch_size).collect();
        if group.is_empty() {
            return Ok(false);
        }

        let mut counts = Vec::with_capacity(group.len());
        let mut commands = Vec::new();
        let mut contexts = Vec::with_capacity(group.len());
        for set in group {
            counts.push(set.commands.len());
            commands.extend(set.commands);
            contexts.push(set.context);
        }

        debug!(
            target: "exo::dispatch",
            batch = self.batches_sent,
            sets = contexts.len(),
            commands = commands.len(),
            "Dispatching batch"
        );
        let sent = !commands.is_empty();
        let responses = self.executor.execute_many(self.auth, commands)?;
        if sent {
            self.batches_sent += 1;
        }

        let mut responses = responses.into_iter();
        for (context, count) in contexts.into_iter().zip(counts) {
            let slice: Vec<Response> = responses.by_ref().take(count).collect();
            self.ready.push_back(Completed {
                context,
                responses: slice,
            });
        }
        Ok(true)
    }
}

impl<'a, T, I, C> Iterator for Batches<'a, T, I, C>
where
    T: Transport,
    I: Iterator<Item = CommandSet<C>>,
{
    type Item = Result<Completed<C>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(done) = self.ready.pop_front() {
            return Some(Ok(done));
        }
        if self.state != BatchState::Running {
            return None;
        }
        match self.run_batch() {
            Ok(true) => self.ready.pop_front().map(Ok),
            Ok(false) => {
                self.state = BatchState::Exhausted;
                None
            }
            Err(e) => {
                self.state = BatchState::Failed;
                Some(Err(e))
            }
        }
    }
}

impl<'a, T, I, C> std::iter::FusedIterator for Batches<'a, T, I, C>
where
    T: Transport,
    I: Iterator<Item = CommandSet<C>>,
{
}
