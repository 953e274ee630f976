//! Terminal stage: serve the request, then keep the connection or close it.

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};
use tokio::fs::File;

use crate::parser::{HeaderTable, HttpVersion, RequestLine};
use crate::server::connection::{Connection, Transport};
use crate::server::error::Error;
use crate::server::response::{ResponseHead, StatusCode};
use crate::server::stages::{schedule_request_line, PipelineContext};

pub(super) async fn run<S: Transport>(
    ctx: Arc<PipelineContext>,
    mut conn: Connection<S>,
    request_line: RequestLine,
    headers: HeaderTable,
) -> Result<(), Error> {
    ctx.metrics.request_handled();
    let version = response_version(&request_line);
    let written_before = conn.bytes_written();

    match respond(&ctx, &mut conn, &request_line, version).await {
        Ok(status) => {
            ctx.metrics.response_sent(status);
            debug!("{conn}: {request_line} -> {code}", code = status.as_u16());
        }
        Err(e) => {
            // A 500 only makes sense if nothing of the failed response went out
            if conn.is_open() && conn.bytes_written() == written_before {
                match send_empty(&mut conn, version, StatusCode::InternalServerError).await {
                    Ok(status) => ctx.metrics.response_sent(status),
                    Err(send_error) => warn!("Unable to send 500 to {conn} after another error: {send_error}"),
                }
            }
            conn.close().await;
            return Err(e);
        }
    }

    if keeps_alive(&conn, &request_line, &headers) {
        ctx.metrics.keep_alive_reused();
        debug!("Keeping {conn} alive for the next request");
        schedule_request_line(&ctx, conn);
    } else {
        conn.close().await;
    }
    Ok(())
}

/// The version echoed on the status line.
fn response_version(request_line: &RequestLine) -> HttpVersion {
    request_line.parsed_version().unwrap_or(HttpVersion::Http11)
}

/// Persistent only for HTTP/1.1 on a healthy socket without `Connection: close`.
fn keeps_alive<S: Transport>(conn: &Connection<S>, request_line: &RequestLine, headers: &HeaderTable) -> bool {
    let persistent = request_line
        .parsed_version()
        .is_ok_and(|version| version.is_persistent_by_default());
    persistent && conn.is_open() && !headers.has_token("Connection", "close")
}

fn is_forbidden(target: &str) -> bool {
    !target.starts_with('/') || target.contains("/..") || target.contains('\0')
}

async fn respond<S: Transport>(
    ctx: &PipelineContext,
    conn: &mut Connection<S>,
    request_line: &RequestLine,
    version: HttpVersion,
) -> Result<StatusCode, Error> {
    let target = request_line.target();

    if is_forbidden(target) {
        return send_empty(conn, version, StatusCode::Forbidden).await;
    }

    if !request_line.parsed_method().is_served() {
        return send_empty(conn, version, StatusCode::MethodNotAllowed).await;
    }

    if let Some(endpoint) = ctx.diagnostics.get(target) {
        let body = endpoint.render()?;
        let head = ResponseHead::new(version, StatusCode::Ok)
            .with_content_length(body.len() as u64)
            .with_content_type(ctx.mime.lookup(&endpoint.extension));
        conn.write_all(&head.to_bytes()).await?;
        conn.write_all(&body).await?;
        conn.flush().await?;
        return Ok(StatusCode::Ok);
    }

    let Some((path, length)) = resolve_file(ctx, target).await else {
        return send_empty(conn, version, StatusCode::NotFound).await;
    };

    let file = File::open(&path).await?;
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    let head = ResponseHead::new(version, StatusCode::Ok)
        .with_content_length(length)
        .with_content_type(ctx.mime.lookup(extension));
    conn.write_all(&head.to_bytes()).await?;
    conn.copy_from(file, length).await?;
    conn.flush().await?;
    Ok(StatusCode::Ok)
}

/// Map `target` to a regular file under the root, with its length.
async fn resolve_file(ctx: &PipelineContext, target: &str) -> Option<(PathBuf, u64)> {
    let mut relative = target_path(target.trim_start_matches('/'))?;
    if target.ends_with('/') {
        relative.push(ctx.config.index_file.as_deref()?);
    }

    let path = ctx.config.root.join(relative);
    match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => Some((path, metadata.len())),
        Ok(_) => None,
        Err(e) => {
            debug!("No file for {target}: {e}");
            None
        }
    }
}

/// Rebuild the on-disk name from a decoded target.
///
/// Every char of the target stands for one raw byte (ISO-8859-1), so the
/// bytes are restored before touching the filesystem.
#[cfg(unix)]
fn target_path(target: &str) -> Option<PathBuf> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let bytes = latin1_bytes(target)?;
    Some(PathBuf::from(OsStr::from_bytes(&bytes)))
}

#[cfg(not(unix))]
fn target_path(target: &str) -> Option<PathBuf> {
    let bytes = latin1_bytes(target)?;
    String::from_utf8(bytes).ok().map(PathBuf::from)
}

fn latin1_bytes(target: &str) -> Option<Vec<u8>> {
    target.chars().map(|c| u8::try_from(c).ok()).collect()
}

async fn send_empty<S: Transport>(
    conn: &mut Connection<S>,
    version: HttpVersion,
    status: StatusCode,
) -> Result<StatusCode, Error> {
    conn.write_all(&ResponseHead::empty(version, status).to_bytes()).await?;
    conn.flush().await?;
    Ok(status)
}
