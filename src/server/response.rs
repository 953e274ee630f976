//! HTTP response heads.

use crate::parser::HttpVersion;

/// HTTP status codes with their standard reason phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok = 200,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    InternalServerError = 500,
}

impl StatusCode {
    /// Get the reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

/// The status line and headers of a response.
///
/// Bodies are streamed separately, so the head only carries the framing.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    /// The protocol version echoed on the status line
    pub version: HttpVersion,
    /// The HTTP status code
    pub status: StatusCode,
    /// The HTTP headers, written in insertion order
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    /// Create a new response head with the given version and status code.
    pub fn new(version: HttpVersion, status: StatusCode) -> Self {
        Self {
            version,
            status,
            headers: Vec::new(),
        }
    }

    /// A bodiless response: only `Content-Length: 0`.
    pub fn empty(version: HttpVersion, status: StatusCode) -> Self {
        Self::new(version, status).with_content_length(0)
    }

    /// Add or replace a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    pub fn with_content_length(self, length: u64) -> Self {
        self.with_header("Content-Length", length.to_string())
    }

    /// Set the content type.
    pub fn with_content_type(self, content_type: impl Into<String>) -> Self {
        self.with_header("Content-Type", content_type)
    }

    /// Convert the head to its wire form, including the blank separator line.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();

        // Add the status line
        let status_line = format!(
            "{version} {code} {reason}\r\n",
            version = self.version,
            code = self.status.as_u16(),
            reason = self.status.reason_phrase()
        );
        bytes.extend_from_slice(status_line.as_bytes());

        // Add the headers
        for (name, value) in &self.headers {
            let header_line = format!("{name}: {value}\r\n");
            bytes.extend_from_slice(header_line.as_bytes());
        }

        // Add the empty line that separates headers from body
        bytes.extend_from_slice(b"\r\n");

        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_head_is_byte_exact() {
        let head = ResponseHead::new(HttpVersion::Http11, StatusCode::Ok)
            .with_content_length(5)
            .with_content_type("text/plain");
        assert_eq!(
            head.to_bytes(),
            b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nContent-Type: text/plain\r\n\r\n"
        );
    }

    #[test]
    fn test_empty_head_echoes_version() {
        let head = ResponseHead::empty(HttpVersion::Http10, StatusCode::NotFound);
        assert_eq!(head.to_bytes(), b"HTTP/1.0 404 Not Found\r\nContent-Length: 0\r\n\r\n");
    }

    #[test]
    fn test_with_header_replaces_case_insensitively() {
        let head = ResponseHead::new(HttpVersion::Http11, StatusCode::Ok)
            .with_content_length(1)
            .with_header("content-length", "2");
        assert_eq!(head.headers, vec![("Content-Length".to_string(), "2".to_string())]);
    }

    #[test]
    fn test_reason_phrases() {
        assert_eq!(StatusCode::Forbidden.reason_phrase(), "Forbidden");
        assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
        assert_eq!(StatusCode::InternalServerError.reason_phrase(), "Internal Server Error");
    }
}
