//! Accept loops over a shared listening socket.

use std::future::Future;
use std::io;
use std::sync::Arc;

use log::{debug, info};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::server::connection::{Connection, Transport};
use crate::server::error::Error;
use crate::server::metrics::ServerMetrics;
use crate::server::pool::WorkerPool;
use crate::server::stages::{schedule_request_line, PipelineContext};

/// A source of new connections.
///
/// Concurrent `accept` calls on one listener must each return a distinct
/// connection, as the OS guarantees for a listening socket.
pub trait Listener: Send + Sync + 'static {
    type Stream: Transport;

    /// Wait for the next connection and a label for its peer.
    fn accept(&self) -> impl Future<Output = io::Result<(Self::Stream, String)>> + Send;
}

impl Listener for TcpListener {
    type Stream = TcpStream;

    fn accept(&self) -> impl Future<Output = io::Result<(TcpStream, String)>> + Send {
        async move {
            let (stream, peer) = TcpListener::accept(self).await?;
            Ok((stream, peer.to_string()))
        }
    }
}

/// One accept loop, run as a long-lived task on the accept pool.
///
/// If `accept` fails while the loop is active, the loop resubmits itself
/// before reporting the error, so a transient OS failure does not leave the
/// socket unserved. There is no backoff or retry ceiling: a persistently
/// failing socket spins through resubmissions, each one escalated.
pub struct Acceptor<L> {
    inner: Arc<AcceptorInner<L>>,
}

struct AcceptorInner<L> {
    id: usize,
    listener: Arc<L>,
    accept_pool: WorkerPool,
    pipeline: Arc<PipelineContext>,
    stop: watch::Sender<bool>,
}

impl<L> Clone for Acceptor<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Keeps the running-acceptors gauge in step with live loops.
struct Running<'a>(&'a ServerMetrics);

impl<'a> Running<'a> {
    fn enter(metrics: &'a ServerMetrics) -> Self {
        metrics.acceptor_started();
        Self(metrics)
    }
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.acceptor_stopped();
    }
}

impl<L: Listener> Acceptor<L> {
    pub fn new(id: usize, listener: Arc<L>, accept_pool: WorkerPool, pipeline: Arc<PipelineContext>) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            inner: Arc::new(AcceptorInner {
                id,
                listener,
                accept_pool,
                pipeline,
                stop,
            }),
        }
    }

    pub fn id(&self) -> usize {
        self.inner.id
    }

    /// Begin accepting on a slot of the accept pool.
    pub fn start(&self) {
        self.launch();
    }

    /// Signal the loop to finish and wake it if it is blocked in `accept`.
    pub fn stop(&self) {
        self.inner.stop.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.inner.stop.borrow()
    }

    fn is_active(&self) -> bool {
        !self.is_stopped() && !self.inner.accept_pool.is_shutdown()
    }

    fn launch(&self) {
        let acceptor = self.clone();
        self.inner.accept_pool.submit(acceptor.accept_loop());
    }

    async fn accept_loop(self) -> Result<(), Error> {
        let id = self.inner.id;
        let mut stop = self.inner.stop.subscribe();
        let _running = Running::enter(&self.inner.pipeline.metrics);
        debug!("Acceptor {id} waiting for connections");

        while self.is_active() {
            let accepted = tokio::select! {
                _ = stop.changed() => continue,
                accepted = self.inner.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => self.dispatch(stream, peer),
                Err(e) if !self.is_active() => {
                    debug!("Acceptor {id} interrupted by shutdown: {e}");
                    break;
                }
                Err(e) => {
                    self.launch();
                    return Err(Error::AcceptError(e));
                }
            }
        }

        info!("Acceptor {id} stopped");
        Ok(())
    }

    fn dispatch(&self, stream: L::Stream, peer: String) {
        let metrics = &self.inner.pipeline.metrics;
        metrics.connection_accepted();
        let conn = Connection::new(stream, peer).tracked(Arc::clone(metrics));
        debug!("Acceptor {id} accepted {conn}", id = self.inner.id);
        schedule_request_line(&self.inner.pipeline, conn);
    }
}
