//! Error types for the HTTP server.

use thiserror::Error;

use crate::parser::Error as ParserError;

/// Errors that can occur during HTTP server operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Error parsing a request line or header line.
    #[error("Parse error: {0}")]
    ParseError(#[from] ParserError),

    /// I/O error on a connection or file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The listening socket failed to accept.
    #[error("Accept failed: {0}")]
    AcceptError(#[source] std::io::Error),

    /// A line read did not complete within the read deadline.
    #[error("Read timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A pool task panicked.
    #[error("Task panicked in pool {0}")]
    TaskPanicked(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The server was used in a state that does not allow the operation.
    #[error("Internal server error: {0}")]
    InternalError(String),
}
