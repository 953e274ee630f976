//! Error types for the HTTP parser.

use thiserror::Error;

/// Errors that can occur while parsing a request line or header line.
#[derive(Debug, Error)]
pub enum Error {
    /// The request line does not split into exactly three tokens.
    #[error("Malformed request line: {0}")]
    MalformedRequestLine(String),

    /// The HTTP version in the request is not supported.
    #[error("Invalid HTTP version: {0}")]
    InvalidVersion(String),

    /// The request target contains a `%` escape that is not followed by two hex digits.
    #[error("Invalid percent-encoding in target: {0}")]
    InvalidPercentEncoding(String),

    /// A line exceeded the configured maximum length.
    #[error("Line exceeds {0} bytes")]
    LineTooLong(usize),

    /// The request is empty.
    #[error("Empty request")]
    EmptyRequest,
}
