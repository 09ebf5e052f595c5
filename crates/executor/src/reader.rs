//! Chunked multi-resource pagination reader.
//!
//! Reads up to `limit` points from each of N resources and returns them as
//! time-aligned [`Row`]s.
//!
//! When `limit` fits in one chunk, a single round trip reads every resource.
//! Otherwise each resource gets its own [`SeriesCursor`] and time is walked
//! in chunks: every round issues one bounded read per live resource, anchored
//! at that resource's bound. Descending reads step the bound to one second
//! before the oldest point just read; ascending reads step it to one second
//! after the newest. A resource is exhausted when its quota is used up or a
//! round returns nothing for it. The read ends when no resource is live, or
//! when a whole round returns no points at all.
//!
//! The per-resource results are merged with [`merge`] and truncated to
//! `limit` rows.

use chrono::Utc;
use exo_core::{Auth, Point, ReadOptions, ResourceId, Row, Selection, SortOrder, Timestamp};
use tracing::{debug, warn};

use crate::merge::merge;
use crate::{Command, Error, Executor, Result, Transport};

/// Default number of points per resource per round.
pub const DEFAULT_CHUNK_SIZE: u64 = 212;

/// Parameters of a multi-resource read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    /// Maximum number of rows returned
    pub limit: u64,
    /// Order of returned rows
    pub sort: SortOrder,
    /// Inclusive lower time bound
    pub start: Option<Timestamp>,
    /// Inclusive upper time bound
    pub end: Option<Timestamp>,
    /// Server-side down-sampling
    pub selection: Selection,
    /// Points per resource per round
    pub chunk_size: u64,
}

impl ReadRequest {
    /// Read up to `limit` rows in the given order, unbounded in time.
    pub fn new(limit: u64, sort: SortOrder) -> Self {
        Self {
            limit,
            sort,
            start: None,
            end: None,
            selection: Selection::All,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the inclusive time window.
    pub fn window(mut self, start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Set the selection mode.
    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Set the chunk size.
    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    fn options(&self) -> ReadOptions {
        ReadOptions::new(self.limit, self.sort)
            .window(self.start, self.end)
            .selection(self.selection)
    }
}

/// Pagination state of one resource during a chunked read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesCursor {
    /// Points still wanted from this resource
    pub remaining_limit: i64,
    /// Time the next read is anchored at
    pub bound: Timestamp,
    /// No further reads are issued once set
    pub exhausted: bool,
}

impl SeriesCursor {
    /// A fresh cursor wanting `limit` points, anchored at `bound`.
    pub fn new(limit: u64, bound: Timestamp) -> Self {
        Self {
            remaining_limit: i64::try_from(limit).unwrap_or(i64::MAX),
            bound,
            exhausted: false,
        }
    }

    /// Number of points to request next round.
    pub fn next_count(&self, chunk_size: u64) -> u64 {
        u64::try_from(self.remaining_limit.max(0))
            .unwrap_or(0)
            .min(chunk_size)
    }

    /// Options for the next bounded read of this resource.
    pub fn next_options(&self, request: &ReadRequest) -> ReadOptions {
        let (starttime, endtime) = match request.sort {
            SortOrder::Desc => (request.start, Some(self.bound)),
            SortOrder::Asc => (Some(self.bound), request.end),
        };
        ReadOptions::new(self.next_count(request.chunk_size), request.sort)
            .window(starttime, endtime)
            .selection(request.selection)
    }

    /// Account for the points one round returned.
    ///
    /// The bound only ever moves away from where the read started; a round
    /// that would not move it exhausts the cursor instead.
    pub fn advance(&mut self, points: &[Point], sort: SortOrder) {
        self.remaining_limit -= i64::try_from(points.len()).unwrap_or(i64::MAX);
        if points.is_empty() || self.remaining_limit <= 0 {
            self.exhausted = true;
            return;
        }

        let timestamps = points.iter().map(|p| p.timestamp);
        let (next, progressed) = match sort {
            SortOrder::Desc => {
                let next = timestamps.min().unwrap_or(self.bound).saturating_sub(1);
                (next, next < self.bound)
            }
            SortOrder::Asc => {
                let next = timestamps.max().unwrap_or(self.bound).saturating_add(1);
                (next, next > self.bound)
            }
        };
        if progressed {
            self.bound = next;
        } else {
            warn!(
                target: "exo::reader",
                bound = self.bound,
                next,
                "Read returned points outside its window; stopping this series"
            );
            self.exhausted = true;
        }
    }
}

struct SeriesState {
    rid: ResourceId,
    cursor: SeriesCursor,
    points: Vec<Point>,
}

enum ReaderState {
    Pending,
    Streaming(std::vec::IntoIter<Row>),
    Exhausted,
}

/// Lazy, forward-only sequence of merged rows.
///
/// Nothing is read until the first call to `next`, which performs every
/// round of the read. Later calls only hand out rows. A failure is yielded
/// once, after which the sequence is exhausted.
pub struct SeriesReader<'a, T> {
    executor: &'a Executor<T>,
    auth: &'a Auth,
    resources: Vec<ResourceId>,
    request: ReadRequest,
    progress: Option<Box<dyn FnMut(u64) + 'a>>,
    points_read: u64,
    rounds: usize,
    state: ReaderState,
}

impl<'a, T: Transport> SeriesReader<'a, T> {
    /// Prepare a read of `resources`. No round trip happens here.
    pub fn new(
        executor: &'a Executor<T>,
        auth: &'a Auth,
        resources: Vec<ResourceId>,
        request: ReadRequest,
    ) -> Self {
        Self {
            executor,
            auth,
            resources,
            request,
            progress: None,
            points_read: 0,
            rounds: 0,
            state: ReaderState::Pending,
        }
    }

    /// Call `progress` with the cumulative point count after each round.
    pub fn with_progress(mut self, progress: impl FnMut(u64) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Rounds performed so far.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Points received so far, before merging and truncation.
    pub fn points_read(&self) -> u64 {
        self.points_read
    }

    fn fetch(&mut self) -> Result<Vec<Row>> {
        if self.resources.is_empty() {
            return Ok(Vec::new());
        }
        if self.request.chunk_size == 0 {
            return Err(Error::invalid_input("chunk_size must be greater than 0"));
        }

        let series = if self.request.limit <= self.request.chunk_size {
            self.read_single()?
        } else {
            self.read_chunked()?
        };

        let mut rows = merge(series, self.request.sort);
        rows.truncate(usize::try_from(self.request.limit).unwrap_or(usize::MAX));
        Ok(rows)
    }

    fn read_single(&mut self) -> Result<Vec<Vec<Point>>> {
        let options = self.request.options();
        let commands = self
            .resources
            .iter()
            .map(|rid| Command::read(rid, options.clone()))
            .collect();
        self.round(commands)
    }

    fn read_chunked(&mut self) -> Result<Vec<Vec<Point>>> {
        let anchor = match self.request.sort {
            SortOrder::Desc => self.request.end.unwrap_or_else(|| Utc::now().timestamp()),
            SortOrder::Asc => self.request.start.unwrap_or(0),
        };
        let mut states: Vec<SeriesState> = self
            .resources
            .iter()
            .map(|rid| SeriesState {
                rid: rid.clone(),
                cursor: SeriesCursor::new(self.request.limit, anchor),
                points: Vec::new(),
            })
            .collect();

        loop {
            let live: Vec<usize> = (0..states.len())
                .filter(|&i| !states[i].cursor.exhausted)
                .collect();
            if live.is_empty() {
                break;
            }

            let commands = live
                .iter()
                .map(|&i| {
                    let state = &states[i];
                    Command::read(&state.rid, state.cursor.next_options(&self.request))
                })
                .collect();
            let results = self.round(commands)?;

            let mut returned = 0usize;
            for (&i, points) in live.iter().zip(results) {
                returned += points.len();
                let state = &mut states[i];
                state.cursor.advance(&points, self.request.sort);
                state.points.extend(points);
            }
            debug!(
                target: "exo::reader",
                round = self.rounds,
                live = live.len(),
                returned,
                "Read round"
            );

            if returned == 0 {
                break;
            }
        }

        Ok(states.into_iter().map(|s| s.points).collect())
    }

    fn round(&mut self, commands: Vec<Command>) -> Result<Vec<Vec<Point>>> {
        let values = self.executor.execute(self.auth, commands)?;
        let series = values
            .into_iter()
            .map(|v| {
                serde_json::from_value::<Vec<Point>>(v)
                    .map_err(|e| Error::malformed("read", e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        self.rounds += 1;
        self.points_read += series.iter().map(|s| s.len() as u64).sum::<u64>();
        if let Some(progress) = self.progress.as_mut() {
            progress(self.points_read);
        }
        Ok(series)
    }
}

impl<'a, T: Transport> Iterator for SeriesReader<'a, T> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, ReaderState::Pending) {
            match self.fetch() {
                Ok(rows) => self.state = ReaderState::Streaming(rows.into_iter()),
                Err(e) => {
                    self.state = ReaderState::Exhausted;
                    return Some(Err(e));
                }
            }
        }
        match &mut self.state {
            ReaderState::Streaming(rows) => match rows.next() {
                Some(row) => Some(Ok(row)),
                None => {
                    self.state = ReaderState::Exhausted;
                    None
                }
            },
            _ => None,
        }
    }
}

impl<'a, T: Transport> std::iter::FusedIterator for SeriesReader<'a, T> {}
