//! HTTP server wiring and lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info};
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::signal;

use crate::server::acceptor::Acceptor;
use crate::server::config::ServerConfig;
use crate::server::diagnostics::Diagnostics;
use crate::server::error::Error;
use crate::server::metrics::ServerMetrics;
use crate::server::pool::{FailureHandler, LoggingFailureHandler, WorkerPool};
use crate::server::stages::PipelineContext;

/// Name of the pool running accept loops.
pub const ACCEPT_POOL: &str = "accept-pool";
/// Name of the pool running pipeline stages.
pub const STAGE_POOL: &str = "stage-pool";

/// A static file server.
///
/// Built explicitly from its collaborators: two worker pools, a failure
/// handler, the MIME table and the diagnostic endpoints. Nothing is looked up
/// from global state.
pub struct HttpServer {
    /// The server configuration.
    pub config: ServerConfig,
    metrics: Arc<ServerMetrics>,
    diagnostics: Diagnostics,
    failure_handler: Arc<dyn FailureHandler>,
    running: Option<Running>,
}

struct Running {
    addr: SocketAddr,
    acceptors: Vec<Acceptor<TcpListener>>,
    accept_pool: WorkerPool,
    stage_pool: WorkerPool,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        let metrics = Arc::new(ServerMetrics::new());
        let diagnostics = Diagnostics::with_builtins(&metrics);
        let failure_handler = Arc::new(LoggingFailureHandler::new(Arc::clone(&metrics)));
        Self {
            config,
            metrics,
            diagnostics,
            failure_handler,
            running: None,
        }
    }

    /// Replace the handler that receives failures escaping pool tasks.
    pub fn with_failure_handler(mut self, failure_handler: Arc<dyn FailureHandler>) -> Self {
        self.failure_handler = failure_handler;
        self
    }

    /// Serve the output of `provider` at `path`. Must be called before `start`.
    pub fn add_diagnostic<F>(&mut self, path: impl Into<String>, extension: impl Into<String>, provider: F)
    where
        F: Fn() -> Result<Vec<u8>, Error> + Send + Sync + 'static,
    {
        self.diagnostics.register(path, extension, provider);
    }

    pub fn metrics(&self) -> &Arc<ServerMetrics> {
        &self.metrics
    }

    /// The bound address while the server is running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.addr)
    }

    /// Display the server banner and diagnostic endpoints.
    fn display_server_info(&self) {
        let banner = include_str!("../banner.txt");
        info!("\n{banner}");

        info!("Serving files from {root}", root = self.config.root.display());
        info!("Diagnostic endpoints:");
        for path in self.diagnostics.paths() {
            info!("  GET {path}");
        }
    }

    /// Set up the TCP listener.
    async fn setup_listener(&self) -> Result<TcpListener, Error> {
        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Server listening on http://{addr}", addr = listener.local_addr()?);
        Ok(listener)
    }

    /// Bind the listener and launch the accept loops.
    ///
    /// Both pools are built on the current tokio runtime. Returns the bound
    /// address, which differs from the configured one when port 0 was asked for.
    pub async fn start(&mut self) -> Result<SocketAddr, Error> {
        if self.running.is_some() {
            return Err(Error::InternalError("server already started".to_string()));
        }

        self.display_server_info();
        let listener = Arc::new(self.setup_listener().await?);
        let addr = listener.local_addr()?;

        let handle = Handle::current();
        let accept_pool = WorkerPool::new(ACCEPT_POOL, handle.clone(), Arc::clone(&self.failure_handler));
        let stage_pool = WorkerPool::new(STAGE_POOL, handle, Arc::clone(&self.failure_handler));
        let pipeline = Arc::new(PipelineContext::new(
            self.config.clone(),
            stage_pool.clone(),
            self.diagnostics.clone(),
            Arc::clone(&self.metrics),
        ));

        let acceptors: Vec<Acceptor<TcpListener>> = (0..self.config.acceptors.max(1))
            .map(|id| Acceptor::new(id, Arc::clone(&listener), accept_pool.clone(), Arc::clone(&pipeline)))
            .collect();
        for acceptor in &acceptors {
            acceptor.start();
        }
        info!("Started {count} acceptors", count = acceptors.len());

        self.running = Some(Running {
            addr,
            acceptors,
            accept_pool,
            stage_pool,
        });
        Ok(addr)
    }

    /// Stop accepting, then give in-flight connections the grace period.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        info!("Shutting down server...");
        for acceptor in &running.acceptors {
            acceptor.stop();
        }

        let grace = self.config.shutdown_grace();
        info!(
            "Waiting for {count} active pipeline tasks to complete...",
            count = running.stage_pool.active_tasks()
        );
        let aborted = running.accept_pool.shutdown(grace).await + running.stage_pool.shutdown(grace).await;
        if aborted > 0 {
            error!("Aborted {aborted} tasks still running after {grace:?}");
        }

        info!("Server shutdown complete");
    }

    /// Start the server and run until Ctrl+C.
    pub async fn run(mut self) -> Result<(), Error> {
        self.start().await?;

        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
            Err(e) => error!("Error setting up Ctrl+C handler: {e}"),
        }

        self.stop().await;
        Ok(())
    }
}
