//! Error types for rifftree

use thiserror::Error;

/// Result type alias for rifftree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rifftree
#[derive(Error, Debug)]
pub enum Error {
    /// IO error from a byte source or sink, passed through untouched
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed or inconsistent bytes
    #[error("Decode error: {0}")]
    Decode(String),

    /// A field or child value does not match its declared type
    #[error("Validation error: field `{field}` expects {expected}, got {actual}")]
    Validation {
        field: String,
        expected: String,
        actual: String,
    },

    /// A child that cannot be framed inside a group
    #[error("Capability error: {0}")]
    Capability(String),

    /// Unresolvable tag or invalid schema declaration
    #[error("Schema error: {0}")]
    Schema(String),

    /// Unknown slot or field name
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

impl Error {
    /// Create a decode error
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Error::Decode(msg.into())
    }

    /// Create a validation error
    pub fn validation<F, E, A>(field: F, expected: E, actual: A) -> Self
    where
        F: Into<String>,
        E: Into<String>,
        A: Into<String>,
    {
        Error::Validation {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a capability error
    pub fn capability<S: Into<String>>(msg: S) -> Self {
        Error::Capability(msg.into())
    }

    /// Create a schema error
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        Error::Schema(msg.into())
    }

    /// Create a not-found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field_and_types() {
        let err = Error::validation("frob", "u32", "str");
        assert_eq!(
            err.to_string(),
            "Validation error: field `frob` expects u32, got str"
        );
    }

    #[test]
    fn test_io_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: Error = io.into();
        assert_eq!(err.to_string(), "no such file");
        assert!(matches!(err, Error::Io(_)));
    }
}
