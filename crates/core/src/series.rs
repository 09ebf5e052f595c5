//! Time series types
//!
//! A series is an ordered list of [`Point`]s read from one resource.
//! Rows are what the merge step produces: one timestamp aligned to a value
//! (or a gap) per input series.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Seconds since the Unix epoch, as the remote store reports them.
pub type Timestamp = i64;

/// One recorded value in a series.
///
/// On the wire a point is the pair `[timestamp, value]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Timestamp, Value)", into = "(Timestamp, Value)")]
pub struct Point {
    /// When the value was recorded
    pub timestamp: Timestamp,
    /// The recorded value, opaque to the engine
    pub value: Value,
}

impl Point {
    /// Create a point.
    pub fn new(timestamp: Timestamp, value: impl Into<Value>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }
}

impl From<(Timestamp, Value)> for Point {
    fn from((timestamp, value): (Timestamp, Value)) -> Self {
        Self { timestamp, value }
    }
}

impl From<Point> for (Timestamp, Value) {
    fn from(p: Point) -> Self {
        (p.timestamp, p.value)
    }
}

/// Time-aligned values from several series.
///
/// `values[i]` belongs to the i-th requested resource and is `None` when that
/// resource has no point at `timestamp`.
///
/// On the wire a gap and a recorded JSON `null` are both `null`, so
/// `Some(Value::Null)` decodes back as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Timestamp, Vec<Option<Value>>)", into = "(Timestamp, Vec<Option<Value>>)")]
pub struct Row {
    /// Shared timestamp of the row
    pub timestamp: Timestamp,
    /// One slot per input series
    pub values: Vec<Option<Value>>,
}

impl From<(Timestamp, Vec<Option<Value>>)> for Row {
    fn from((timestamp, values): (Timestamp, Vec<Option<Value>>)) -> Self {
        Self { timestamp, values }
    }
}

impl From<Row> for (Timestamp, Vec<Option<Value>>) {
    fn from(r: Row) -> Self {
        (r.timestamp, r.values)
    }
}

/// Order in which points are requested and rows are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first
    #[default]
    Asc,
    /// Newest first
    Desc,
}

impl SortOrder {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::InvalidInput(format!(
                "sort must be \"asc\" or \"desc\", got '{}'",
                other
            ))),
        }
    }
}

/// Server-side down-sampling of a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    /// Every point
    #[default]
    All,
    /// Evenly spaced points across the requested window
    Autowindow,
    /// Points bucketed by a window the caller gives
    Givenwindow,
}

impl FromStr for Selection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Selection::All),
            "autowindow" => Ok(Selection::Autowindow),
            "givenwindow" => Ok(Selection::Givenwindow),
            other => Err(Error::InvalidInput(format!("unknown selection '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_point_wire_form_is_pair() {
        let p = Point::new(1_400_000_000, json!(3.5));
        assert_eq!(serde_json::to_value(&p).unwrap(), json!([1_400_000_000, 3.5]));

        let back: Point = serde_json::from_value(json!([7, "x"])).unwrap();
        assert_eq!(back, Point::new(7, "x"));
    }

    #[test]
    fn test_point_rejects_object_form() {
        assert!(serde_json::from_value::<Point>(json!({"timestamp": 1})).is_err());
    }

    #[test]
    fn test_row_wire_form() {
        let row = Row {
            timestamp: 3,
            values: vec![Some(json!("a")), None],
        };
        assert_eq!(serde_json::to_value(&row).unwrap(), json!([3, ["a", null]]));
    }

    #[test]
    fn test_row_recorded_null_decodes_as_gap() {
        let row = Row {
            timestamp: 3,
            values: vec![Some(Value::Null), Some(json!(1))],
        };
        let back: Row = serde_json::from_value(serde_json::to_value(&row).unwrap()).unwrap();
        assert_eq!(back.values, vec![None, Some(json!(1))]);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert_eq!(SortOrder::default(), SortOrder::Asc);
        assert!("up".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_selection_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(Selection::Autowindow).unwrap(),
            json!("autowindow")
        );
    }
}
