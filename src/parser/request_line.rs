//! Request-line parsing and representation.

use std::fmt;
use std::str::FromStr;

use crate::parser::decode::percent_decode_latin1;
use crate::parser::error::Error;
use crate::parser::method::Method;
use crate::parser::version::HttpVersion;

/// The first line of an HTTP request.
///
/// Tokens are kept as received so the handler decides what it supports;
/// only the target is percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: String,
    target: String,
    version: String,
}

impl RequestLine {
    /// Create a request line from already-decoded parts.
    pub fn new(method: impl Into<String>, target: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            version: version.into(),
        }
    }

    /// The raw method token.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The percent-decoded request target.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The raw protocol version token.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The method token classified for serving.
    pub fn parsed_method(&self) -> Method {
        Method::from(self.method.as_str())
    }

    /// The protocol version, if it is HTTP/1.0 or HTTP/1.1.
    pub fn parsed_version(&self) -> Result<HttpVersion, Error> {
        HttpVersion::from_str(&self.version)
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.target, self.version)
    }
}

/// Parse a request line.
///
/// The line is split on single spaces and must yield exactly three tokens,
/// so doubled or trailing spaces are rejected rather than collapsed.
pub fn parse_request_line(line: &str) -> Result<RequestLine, Error> {
    if line.is_empty() {
        return Err(Error::EmptyRequest);
    }

    let parts: Vec<&str> = line.split(' ').collect();
    let [method, target, version] = parts.as_slice() else {
        return Err(Error::MalformedRequestLine(line.to_string()));
    };

    let target = percent_decode_latin1(target)?;
    Ok(RequestLine::new(*method, target, *version))
}
