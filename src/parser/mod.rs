//! HTTP parser module.
//!
//! This module turns the text lines read off a connection into a
//! [`RequestLine`] and a [`HeaderTable`]. It performs no I/O; the pipeline
//! stages in [`crate::server`] feed it one line at a time.

mod decode;
mod error;
mod headers;
mod method;
mod request_line;
mod version;
mod tests;

// Re-export public items
pub use decode::{latin1_to_string, percent_decode_latin1};
pub use error::Error;
pub use headers::{parse_header_line, HeaderTable};
pub use method::Method;
pub use request_line::{parse_request_line, RequestLine};
pub use version::HttpVersion;
