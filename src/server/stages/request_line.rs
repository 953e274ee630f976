//! First stage: read and frame the request line.

use std::sync::Arc;

use log::{debug, info};

use crate::parser::parse_request_line;
use crate::server::connection::{Connection, Transport};
use crate::server::error::Error;
use crate::server::stages::{abandon, schedule_headers, PipelineContext};

pub(super) async fn run<S: Transport>(ctx: Arc<PipelineContext>, mut conn: Connection<S>) -> Result<(), Error> {
    let config = &ctx.config;

    // Sloppy clients send stray blank lines between requests; skip a few.
    let mut line = String::new();
    for _ in 0..=config.max_empty_lines {
        match conn.read_line(config.read_timeout(), config.max_line_length).await {
            Ok(Some(read)) => {
                line = read;
                if !line.is_empty() {
                    break;
                }
            }
            Ok(None) => {
                debug!("{conn} ended before a request line");
                conn.close().await;
                return Ok(());
            }
            Err(e) => return abandon(&ctx, conn, "request line", e).await,
        }
    }

    if line.is_empty() {
        info!("Only blank lines from {conn}, closing");
        ctx.metrics.protocol_error();
        conn.close().await;
        return Ok(());
    }

    let request_line = match parse_request_line(&line) {
        Ok(request_line) => request_line,
        Err(e) => {
            info!("Dropping {conn}: {e}");
            ctx.metrics.protocol_error();
            conn.close().await;
            return Ok(());
        }
    };

    debug!("{conn}: {request_line}");
    schedule_headers(&ctx, conn, request_line);
    Ok(())
}
