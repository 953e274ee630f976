//! HTTP request methods.

use std::fmt;

/// A request method as the file server sees it.
///
/// `GET` is recognized in any letter case; every other token is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Other(String),
}

impl Method {
    /// Whether the file server answers this method with content.
    pub fn is_served(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl From<&str> for Method {
    fn from(token: &str) -> Self {
        if token.eq_ignore_ascii_case("GET") {
            Method::Get
        } else {
            Method::Other(token.to_string())
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Other(token) => f.write_str(token),
        }
    }
}
