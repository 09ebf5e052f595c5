//! Error types for command execution.
//!
//! All engine errors are represented by the [`Error`] enum. These errors are:
//! - **Structured**: Each variant has typed fields for error details
//! - **Classified**: Transport failures, per-command failures and contract
//!   violations are distinct variants, never folded into one string

use serde_json::Value;

use crate::Command;

/// Engine errors.
///
/// # Categories
///
/// | Category | Variants | Description |
/// |----------|----------|-------------|
/// | Transport | `Transport` | The round trip itself failed; fatal for reads and tree builds |
/// | Command | `Command` | One command failed inside a successful round trip (raising mode) |
/// | Contract | `BatchInFlight` | A batch was started on a context with undispatched commands |
/// | Protocol | `MalformedResponse` | A successful result had an unexpected shape |
/// | Input | `InvalidInput`, `Config` | Bad caller input or configuration |
///
/// # Example
///
/// ```ignore
/// match executor.execute(&auth, commands) {
///     Ok(results) => { /* one value per command */ }
///     Err(Error::Command { command, result }) => {
///         eprintln!("{} failed: {}", command.procedure(), result);
///     }
///     Err(e) => return Err(e),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The round trip could not be completed
    #[error("transport failure: {reason}")]
    Transport {
        /// What went wrong
        reason: String,
    },

    /// A command failed in raising mode
    #[error(
        "{} ({})\n\tFor more information, visit: {}",
        status_text(.result),
        .command,
        help_url(.result)
    )]
    Command {
        /// The failed command
        command: Box<Command>,
        /// Status the remote returned in place of a result
        result: Value,
    },

    /// A multi-call was started while commands were still queued for the context
    #[error("commands already pending for {auth}; dispatch them before starting another batch")]
    BatchInFlight {
        /// The context, key redacted
        auth: String,
    },

    /// A successful result did not have the expected shape
    #[error("malformed {procedure} response: {reason}")]
    MalformedResponse {
        /// Remote procedure that answered
        procedure: String,
        /// What was wrong with the result
        reason: String,
    },

    /// Invalid input
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong with the input
        reason: String,
    },

    /// Invalid or unreadable configuration
    #[error("config error: {reason}")]
    Config {
        /// What was wrong with the configuration
        reason: String,
    },
}

/// Broad class of a remote status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad arguments
    Invalid,
    /// Authentication or permission failure
    Auth,
    /// Anything else
    General,
}

impl Error {
    /// Build a malformed-response error.
    pub fn malformed(procedure: &str, reason: impl Into<String>) -> Self {
        Error::MalformedResponse {
            procedure: procedure.to_string(),
            reason: reason.into(),
        }
    }

    /// Build an invalid-input error.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Build a transport error.
    pub fn transport(reason: impl Into<String>) -> Self {
        Error::Transport {
            reason: reason.into(),
        }
    }

    /// Classify a per-command failure by the first word of its status.
    ///
    /// Returns `None` for errors that are not command failures.
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Error::Command { result, .. } => Some(category_of(&status_text(result))),
            _ => None,
        }
    }

    /// Whether the error aborts a read or tree build outright.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}

impl From<exo_core::Error> for Error {
    fn from(e: exo_core::Error) -> Self {
        Error::InvalidInput {
            reason: e.to_string(),
        }
    }
}

fn status_text(result: &Value) -> String {
    match result {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn category_of(status: &str) -> ErrorCategory {
    match status.split_whitespace().next() {
        Some("invalid") => ErrorCategory::Invalid,
        Some("auth") => ErrorCategory::Auth,
        _ => ErrorCategory::General,
    }
}

fn help_url(result: &Value) -> &'static str {
    match category_of(&status_text(result)) {
        ErrorCategory::Invalid => "https://pyonep.readthedocs.org/en/latest/errors/invalid.html",
        ErrorCategory::Auth => "https://pyonep.readthedocs.org/en/latest/errors/auth.html",
        ErrorCategory::General => "https://pyonep.readthedocs.org/en/latest/errors/general.html",
    }
}
