//! Second stage: collect header lines up to the blank separator.

use std::sync::Arc;

use log::{debug, info};

use crate::parser::{parse_header_line, HeaderTable, RequestLine};
use crate::server::connection::{Connection, Transport};
use crate::server::error::Error;
use crate::server::stages::{abandon, schedule_application, PipelineContext};

pub(super) async fn run<S: Transport>(
    ctx: Arc<PipelineContext>,
    mut conn: Connection<S>,
    request_line: RequestLine,
) -> Result<(), Error> {
    let config = &ctx.config;
    let mut headers = HeaderTable::new();
    let mut lines = 0;

    loop {
        match conn.read_line(config.read_timeout(), config.max_line_length).await {
            Ok(Some(line)) if line.is_empty() => break,
            Ok(Some(_)) if lines == config.max_headers => {
                info!("Dropping {conn}: more than {max} header lines", max = config.max_headers);
                ctx.metrics.protocol_error();
                conn.close().await;
                return Ok(());
            }
            Ok(Some(line)) => {
                lines += 1;
                parse_header_line(&line, &mut headers);
            }
            Ok(None) => {
                debug!("{conn} ended inside the header block");
                break;
            }
            Err(e) => return abandon(&ctx, conn, "headers", e).await,
        }
    }

    schedule_application(&ctx, conn, request_line, headers);
    Ok(())
}
