//! Outcomes of remote commands.
//!
//! The transport reports every command as a raw [`CallRecord`]: the command
//! it ran, whether it succeeded, and the raw result. The engine hands callers
//! the normalized [`Response`] form instead, where a failure carries only the
//! remote status code.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Command, Error, Result};

/// Raw outcome of one command as returned by the transport.
///
/// When `ok` is false, `result` holds the remote status (usually a string
/// such as `"invalid"` or `"restricted"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// The command this record answers
    pub command: Command,
    /// Whether the remote procedure succeeded
    pub ok: bool,
    /// Result on success, status on failure
    pub result: Value,
}

impl CallRecord {
    /// A successful outcome.
    pub fn ok(command: Command, result: Value) -> Self {
        Self {
            command,
            ok: true,
            result,
        }
    }

    /// A failed outcome with a remote status code.
    pub fn failed(command: Command, status: impl Into<String>) -> Self {
        Self {
            command,
            ok: false,
            result: Value::String(status.into()),
        }
    }

    /// Convert to a raising result, failing with the command and raw result.
    pub fn into_result(self) -> Result<Value> {
        if self.ok {
            Ok(self.result)
        } else {
            Err(Error::Command {
                command: Box::new(self.command),
                result: self.result,
            })
        }
    }
}

/// Outcome of one command within an otherwise successful round trip.
///
/// Serializes as `{"status": "ok", "result": ...}` or `{"status": "<code>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ResponseRepr", try_from = "ResponseRepr")]
pub enum Response {
    /// The command succeeded
    Ok(Value),
    /// The command failed with a remote status code
    Failed(String),
}

impl Response {
    /// Whether the command succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }

    /// The result, if the command succeeded.
    pub fn result(&self) -> Option<&Value> {
        match self {
            Response::Ok(v) => Some(v),
            Response::Failed(_) => None,
        }
    }

    /// The status code: `"ok"` or the failure code.
    pub fn status(&self) -> &str {
        match self {
            Response::Ok(_) => "ok",
            Response::Failed(status) => status,
        }
    }
}

impl From<CallRecord> for Response {
    fn from(record: CallRecord) -> Self {
        if record.ok {
            Response::Ok(record.result)
        } else {
            match record.result {
                Value::String(s) => Response::Failed(s),
                other => Response::Failed(other.to_string()),
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ResponseRepr {
    status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
}

impl From<Response> for ResponseRepr {
    fn from(r: Response) -> Self {
        match r {
            Response::Ok(v) => ResponseRepr {
                status: "ok".to_string(),
                result: Some(v),
            },
            Response::Failed(status) => ResponseRepr {
                status,
                result: None,
            },
        }
    }
}

impl TryFrom<ResponseRepr> for Response {
    type Error = String;

    fn try_from(r: ResponseRepr) -> std::result::Result<Self, String> {
        match (r.status.as_str(), r.result) {
            ("ok", Some(v)) => Ok(Response::Ok(v)),
            ("ok", None) => Ok(Response::Ok(Value::Null)),
            (_, Some(_)) => Err(format!("failed response '{}' carries a result", r.status)),
            (_, None) => Ok(Response::Failed(r.status)),
        }
    }
}
