//! A minimal concurrent HTTP/1.x static file server.
//!
//! Every TCP connection runs through a short pipeline of stages, each one a
//! separate task on a shared worker pool:
//!
//! - the request-line stage reads and frames `METHOD target VERSION`,
//! - the header stage collects header lines into a [`HeaderTable`],
//! - the application stage serves a file or a diagnostic payload and then
//!   either closes the connection or, for HTTP/1.1 keep-alive, hands it back
//!   to the request-line stage.
//!
//! A connection is owned by exactly one stage task at a time. Ownership moves
//! with the connection when a stage submits the next task.
//!
//! # Features
//!
//! - `GET` of files under a fixed root with exact `Content-Length` and a
//!   `Content-Type` from the extension
//! - `403` for relative or traversing targets, `405` for other methods,
//!   `404` for missing files, `500` on I/O failure
//! - HTTP/1.1 keep-alive, one request in flight per connection
//! - `/metrics` and `/monitoring` JSON endpoints
//! - Errors escaping a task are routed to an injected [`FailureHandler`]
//!
//! # Examples
//!
//! ## Parsing request lines and headers
//!
//! ```
//! use stagehttp::{parse_header_line, parse_request_line, HeaderTable};
//!
//! let line = parse_request_line("GET /docs/read%20me.txt HTTP/1.1").unwrap();
//! assert_eq!(line.target(), "/docs/read me.txt");
//!
//! let mut headers = HeaderTable::new();
//! parse_header_line("Accept: text/html, text/plain", &mut headers);
//! parse_header_line("accept: */*", &mut headers);
//! assert_eq!(headers.get("Accept").unwrap(), ["text/html", "text/plain", "*/*"]);
//! ```
//!
//! ## Running a server
//!
//! ```no_run
//! use stagehttp::{HttpServer, ServerConfig};
//!
//! # async fn serve() -> Result<(), stagehttp::ServerError> {
//! let config = ServerConfig {
//!     root: "public".into(),
//!     ..ServerConfig::default()
//! };
//!
//! let mut server = HttpServer::new(config);
//! server.add_diagnostic("/version", "txt", || Ok(b"1.0".to_vec()));
//! server.run().await
//! # }
//! ```

// Export the parser module
pub mod parser;

// Export the server module
pub mod server;

// Re-export commonly used items for convenience
pub use parser::{
    parse_header_line, parse_request_line, Error as ParserError, HeaderTable, HttpVersion, Method, RequestLine,
};
pub use server::{
    Error as ServerError, FailureHandler, HttpServer, ServerConfig, ServerMetrics, StatusCode, WorkerPool,
};
