//! The per-connection pipeline.
//!
//! A connection moves strictly forward through three stages, each one a
//! separate task on the stage pool:
//!
//! ```text
//! accepted -> request line -> headers -> application -+-> closed
//!                  ^                                  |
//!                  +---------- keep-alive ------------+
//! ```
//!
//! A stage either hands the connection to the next stage by submitting a new
//! task that owns it, or closes it. Stages never call each other directly, so
//! a long-lived keep-alive connection does not grow the stack.

mod application;
mod headers;
mod request_line;

use std::sync::Arc;

use log::{info, warn};

use crate::parser::{HeaderTable, RequestLine};
use crate::server::config::ServerConfig;
use crate::server::connection::{Connection, Transport};
use crate::server::diagnostics::Diagnostics;
use crate::server::error::Error;
use crate::server::metrics::ServerMetrics;
use crate::server::mime::MimeTypes;
use crate::server::pool::WorkerPool;

/// Read-only collaborators shared by every stage task.
pub struct PipelineContext {
    pub config: ServerConfig,
    pub stage_pool: WorkerPool,
    pub mime: MimeTypes,
    pub diagnostics: Diagnostics,
    pub metrics: Arc<ServerMetrics>,
}

impl PipelineContext {
    pub fn new(
        config: ServerConfig,
        stage_pool: WorkerPool,
        diagnostics: Diagnostics,
        metrics: Arc<ServerMetrics>,
    ) -> Self {
        let mime = MimeTypes::with_overrides(&config.mime_types);
        Self {
            config,
            stage_pool,
            mime,
            diagnostics,
            metrics,
        }
    }
}

// Stage futures reach the next stage only through these synchronous
// functions. Spawning another stage's future directly inside an async body
// makes the three stage future types cyclic.

/// Hand `conn` to a new request-line stage task.
pub fn schedule_request_line<S: Transport>(ctx: &Arc<PipelineContext>, conn: Connection<S>) {
    ctx.stage_pool.submit(request_line::run(Arc::clone(ctx), conn));
}

fn schedule_headers<S: Transport>(ctx: &Arc<PipelineContext>, conn: Connection<S>, request_line: RequestLine) {
    ctx.stage_pool.submit(headers::run(Arc::clone(ctx), conn, request_line));
}

fn schedule_application<S: Transport>(
    ctx: &Arc<PipelineContext>,
    conn: Connection<S>,
    request_line: RequestLine,
    headers: HeaderTable,
) {
    ctx.stage_pool.submit(application::run(Arc::clone(ctx), conn, request_line, headers));
}

/// Close `conn` after a failed line read, escalating only genuine I/O faults.
///
/// Timeouts and protocol violations are expected client behavior.
async fn abandon<S: Transport>(
    ctx: &PipelineContext,
    conn: Connection<S>,
    stage: &str,
    error: Error,
) -> Result<(), Error> {
    match error {
        Error::Timeout(after) => {
            warn!("Timeout after {after:?} reading {stage} for {conn}");
            ctx.metrics.read_timed_out();
            conn.close().await;
            Ok(())
        }
        Error::ParseError(e) => {
            info!("Dropping {conn} while reading {stage}: {e}");
            ctx.metrics.protocol_error();
            conn.close().await;
            Ok(())
        }
        other => {
            warn!("Unable to read {stage} for {conn}: {other}");
            conn.close().await;
            Err(other)
        }
    }
}
