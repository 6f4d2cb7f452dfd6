// Typed errors with thiserror. Surface meaningful messages to JS.
// The evaluate path has no error conditions: malformed observations fail the
// match predicates instead of faulting. Errors exist only at construction.

use thiserror::Error;

/// Engine error types.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid rule at index {index}: {message}")]
    InvalidRule { index: usize, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}
