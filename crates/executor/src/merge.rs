//! K-way merge of independently ordered series into time-aligned rows.
//!
//! Each input series is treated as a stack whose top is its oldest
//! unconsumed point. At every step the smallest timestamp among the tops is
//! chosen, a row is built with the value of every series whose top has that
//! timestamp (and `None` for the rest), and only those series are popped.
//! The rows are finally ordered by the requested [`SortOrder`].
//!
//! Every input point lands in exactly one row and no two rows share a
//! timestamp, provided no single series repeats a timestamp.

use exo_core::{Point, Row, SortOrder};

/// Merge series into rows with one value slot per series.
///
/// Series may be in either time order; each is oriented so its oldest point
/// is consumed first.
pub fn merge(series: Vec<Vec<Point>>, sort: SortOrder) -> Vec<Row> {
    let mut stacks: Vec<Vec<Point>> = series
        .into_iter()
        .map(|mut s| {
            // Top of the stack must be the oldest point.
            if let (Some(first), Some(last)) = (s.first(), s.last()) {
                if first.timestamp < last.timestamp {
                    s.reverse();
                }
            }
            s
        })
        .collect();

    let mut rows = Vec::new();
    while let Some(timestamp) = stacks
        .iter()
        .filter_map(|s| s.last().map(|p| p.timestamp))
        .min()
    {
        let values = stacks
            .iter_mut()
            .map(|s| {
                if s.last().is_some_and(|top| top.timestamp == timestamp) {
                    s.pop().map(|p| p.value)
                } else {
                    None
                }
            })
            .collect();
        rows.push(Row { timestamp, values });
    }

    match sort {
        SortOrder::Asc => rows.sort_by_key(|r| r.timestamp),
        SortOrder::Desc => rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
    }
    rows
}
