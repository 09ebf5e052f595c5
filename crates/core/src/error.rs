//! Error types for exo core types
//!
//! Only validation can fail at this layer. Transport and command errors
//! live in the executor crate.

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Validation errors for core types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// String is not a 40-character hexadecimal resource id
    #[error("Invalid resource id: {0:?}")]
    InvalidResourceId(String),

    /// Input rejected by a constructor or parser
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_resource_id() {
        let err = Error::InvalidResourceId("xyz".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Invalid resource id"));
        assert!(msg.contains("xyz"));
    }

    #[test]
    fn test_error_display_input() {
        let err = Error::InvalidInput("limit must be positive".to_string());
        assert!(err.to_string().contains("limit must be positive"));
    }
}
