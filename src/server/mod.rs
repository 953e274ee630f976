//! HTTP server implementation for stagehttp.
//!
//! This module owns sockets, files and tasks: the acceptors, the staged
//! connection pipeline running on a worker pool, and the wiring that ties
//! them to the parser.

mod acceptor;
mod config;
mod connection;
mod diagnostics;
mod error;
mod http_server;
mod metrics;
mod mime;
mod pool;
mod response;
mod stages;

// Re-export public items
pub use acceptor::{Acceptor, Listener};
pub use config::ServerConfig;
pub use connection::{Connection, Transport};
pub use diagnostics::{DiagnosticEndpoint, DiagnosticFn, Diagnostics};
pub use error::Error;
pub use http_server::{HttpServer, ACCEPT_POOL, STAGE_POOL};
pub use metrics::{MetricsSnapshot, ResponseCounts, ServerMetrics};
pub use mime::{MimeTypes, DEFAULT_MIME_TYPE};
pub use pool::{FailureHandler, LoggingFailureHandler, WorkerPool};
pub use response::{ResponseHead, StatusCode};
pub use stages::{schedule_request_line, PipelineContext};
