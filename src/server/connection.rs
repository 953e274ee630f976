//! A client connection handed from stage to stage.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::parser::{latin1_to_string, Error as ParserError};
use crate::server::error::Error;
use crate::server::metrics::ServerMetrics;

/// Anything a connection can run over: a TCP stream, or an in-memory pipe in tests.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A duplex stream plus the buffered reader that every request cycle on it shares.
///
/// A connection is owned by exactly one pipeline task at a time and moves
/// into the next stage's task on hand-off. Dropping it closes the stream.
pub struct Connection<S> {
    id: u64,
    peer: String,
    reader: BufReader<S>,
    open: bool,
    bytes_written: u64,
    metrics: Option<Arc<ServerMetrics>>,
}

impl<S: Transport> Connection<S> {
    pub fn new(stream: S, peer: impl Into<String>) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            peer: peer.into(),
            reader: BufReader::new(stream),
            open: true,
            bytes_written: 0,
            metrics: None,
        }
    }

    /// Count this connection in the open-connections gauge until it is dropped.
    pub fn tracked(mut self, metrics: Arc<ServerMetrics>) -> Self {
        metrics.connection_opened();
        self.metrics = Some(metrics);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// False once a write has failed or the connection was closed.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Total bytes written over the connection's lifetime.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Read one line, decoded as ISO-8859-1, without its line terminator.
    ///
    /// Returns `Ok(None)` at end of stream. A final line without a terminator
    /// is still returned.
    pub async fn read_line(&mut self, timeout: Duration, max_len: usize) -> Result<Option<String>, Error> {
        let mut buf = Vec::new();
        // Room for the CRLF on top of the payload
        let limit = (max_len as u64).saturating_add(2);
        let read = tokio::time::timeout(timeout, (&mut self.reader).take(limit).read_until(b'\n', &mut buf)).await;

        let n = match read {
            Err(_) => return Err(Error::Timeout(timeout)),
            Ok(result) => self.track(result)?,
        };
        if n == 0 {
            return Ok(None);
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        } else if n as u64 >= limit {
            return Err(ParserError::LineTooLong(max_len).into());
        }

        if buf.len() > max_len {
            return Err(ParserError::LineTooLong(max_len).into());
        }

        Ok(Some(latin1_to_string(&buf)))
    }

    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let result = self.reader.get_mut().write_all(bytes).await;
        self.track(result)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), Error> {
        let result = self.reader.get_mut().flush().await;
        self.track(result)
    }

    /// Stream exactly `len` bytes from `source` to the client.
    pub async fn copy_from<R>(&mut self, source: R, len: u64) -> Result<(), Error>
    where
        R: AsyncRead + Unpin,
    {
        let mut limited = source.take(len);
        let result = tokio::io::copy(&mut limited, self.reader.get_mut()).await;
        let copied = self.track(result)?;
        self.bytes_written += copied;

        if copied != len {
            self.open = false;
            return Err(Error::IoError(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("resource ended after {copied} of {len} bytes"),
            )));
        }
        Ok(())
    }

    /// Shut the stream down and release it.
    pub async fn close(mut self) {
        if self.open {
            self.open = false;
            if let Err(e) = self.reader.get_mut().shutdown().await {
                debug!("Unable to shut down {self}: {e}");
            }
        }
        debug!("Closed {self}");
    }

    fn track<T>(&mut self, result: io::Result<T>) -> Result<T, Error> {
        if result.is_err() {
            self.open = false;
        }
        Ok(result?)
    }
}

impl<S> fmt::Display for Connection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection #{} ({})", self.id, self.peer)
    }
}

impl<S> Drop for Connection<S> {
    fn drop(&mut self) {
        if let Some(metrics) = &self.metrics {
            metrics.connection_closed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    const TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_reads_crlf_and_lf_lines() {
        let (mut client, server) = duplex(1024);
        let mut conn = Connection::new(server, "test");
        client.write_all(b"first\r\nsecond\nthird").await.unwrap();
        drop(client);

        assert_eq!(conn.read_line(TIMEOUT, 64).await.unwrap().as_deref(), Some("first"));
        assert_eq!(conn.read_line(TIMEOUT, 64).await.unwrap().as_deref(), Some("second"));
        assert_eq!(conn.read_line(TIMEOUT, 64).await.unwrap().as_deref(), Some("third"));
        assert_eq!(conn.read_line(TIMEOUT, 64).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overlong_line_is_rejected() {
        let (mut client, server) = duplex(1024);
        let mut conn = Connection::new(server, "test");
        client.write_all(b"0123456789abcdef\r\n").await.unwrap();

        let result = conn.read_line(TIMEOUT, 8).await;
        assert!(matches!(result, Err(Error::ParseError(ParserError::LineTooLong(8)))));
    }

    #[tokio::test]
    async fn test_line_at_the_limit_is_accepted() {
        let (mut client, server) = duplex(1024);
        let mut conn = Connection::new(server, "test");
        client.write_all(b"12345678\r\n").await.unwrap();

        assert_eq!(conn.read_line(TIMEOUT, 8).await.unwrap().as_deref(), Some("12345678"));
    }

    #[tokio::test]
    async fn test_unbounded_limit_does_not_overflow() {
        let (mut client, server) = duplex(1024);
        let mut conn = Connection::new(server, "test");
        client.write_all(b"no limit here\r\n").await.unwrap();

        assert_eq!(conn.read_line(TIMEOUT, usize::MAX).await.unwrap().as_deref(), Some("no limit here"));
    }

    #[tokio::test]
    async fn test_read_times_out() {
        let (_client, server) = duplex(1024);
        let mut conn = Connection::new(server, "test");

        let result = conn.read_line(Duration::from_millis(50), 64).await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn test_copy_counts_bytes() {
        let (mut client, server) = duplex(1024);
        let mut conn = Connection::new(server, "test");
        conn.write_all(b"head:").await.unwrap();
        conn.copy_from(&b"payload"[..], 7).await.unwrap();
        conn.flush().await.unwrap();
        assert_eq!(conn.bytes_written(), 12);
        conn.close().await;

        let mut received = Vec::new();
        client.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"head:payload");
    }

    #[tokio::test]
    async fn test_short_source_fails_the_copy() {
        let (_client, server) = duplex(1024);
        let mut conn = Connection::new(server, "test");

        let result = conn.copy_from(&b"abc"[..], 10).await;
        assert!(matches!(result, Err(Error::IoError(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof));
        assert!(!conn.is_open());
    }

    #[tokio::test]
    async fn test_tracked_connection_updates_gauge() {
        let metrics = Arc::new(ServerMetrics::new());
        let (_client, server) = duplex(64);
        let conn = Connection::new(server, "test").tracked(Arc::clone(&metrics));
        assert_eq!(metrics.snapshot().connections_open, 1);
        conn.close().await;
        assert_eq!(metrics.snapshot().connections_open, 0);
    }
}
