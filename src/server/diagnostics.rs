//! Built-in diagnostic endpoints.
//!
//! A diagnostic is a path mapped to a function that renders a payload on
//! demand. The handler stage checks these before it looks for a file.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::server::error::Error;
use crate::server::metrics::ServerMetrics;

/// Type alias for a function that renders a diagnostic payload.
pub type DiagnosticFn = Arc<dyn Fn() -> Result<Vec<u8>, Error> + Send + Sync>;

/// A registered diagnostic path.
#[derive(Clone)]
pub struct DiagnosticEndpoint {
    /// Extension used to pick the response's MIME type.
    pub extension: String,
    /// The payload renderer.
    pub provider: DiagnosticFn,
}

impl DiagnosticEndpoint {
    pub fn render(&self) -> Result<Vec<u8>, Error> {
        (self.provider)()
    }
}

/// Path to diagnostic lookup, read-only once the server starts.
#[derive(Clone, Default)]
pub struct Diagnostics {
    endpoints: HashMap<String, DiagnosticEndpoint>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// The `/metrics` and `/monitoring` endpoints over `metrics`.
    pub fn with_builtins(metrics: &Arc<ServerMetrics>) -> Self {
        let mut diagnostics = Self::new();

        let snapshot_source = Arc::clone(metrics);
        diagnostics.register("/metrics", "json", move || metrics_payload(&snapshot_source));

        let health_source = Arc::clone(metrics);
        diagnostics.register("/monitoring", "json", move || monitoring_payload(&health_source));

        diagnostics
    }

    /// Add or replace the endpoint at `path`.
    pub fn register<F>(&mut self, path: impl Into<String>, extension: impl Into<String>, provider: F)
    where
        F: Fn() -> Result<Vec<u8>, Error> + Send + Sync + 'static,
    {
        let endpoint = DiagnosticEndpoint {
            extension: extension.into(),
            provider: Arc::new(provider),
        };
        self.endpoints.insert(path.into(), endpoint);
    }

    pub fn get(&self, path: &str) -> Option<&DiagnosticEndpoint> {
        self.endpoints.get(path)
    }

    /// Registered paths, sorted.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self.endpoints.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

/// Pretty JSON of the current counters.
pub fn metrics_payload(metrics: &ServerMetrics) -> Result<Vec<u8>, Error> {
    Ok(serde_json::to_vec_pretty(&metrics.snapshot())?)
}

#[derive(Debug, Serialize)]
struct Health {
    healthy: bool,
    checks: HealthChecks,
}

#[derive(Debug, Serialize)]
struct HealthChecks {
    acceptors_running: u64,
    connections_open: u64,
    uncaught_failures: u64,
}

/// Pretty JSON health report; healthy while at least one acceptor runs.
pub fn monitoring_payload(metrics: &ServerMetrics) -> Result<Vec<u8>, Error> {
    let snapshot = metrics.snapshot();
    let health = Health {
        healthy: snapshot.acceptors_running > 0,
        checks: HealthChecks {
            acceptors_running: snapshot.acceptors_running,
            connections_open: snapshot.connections_open,
            uncaught_failures: snapshot.uncaught_failures,
        },
    };
    Ok(serde_json::to_vec_pretty(&health)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_registered() {
        let metrics = Arc::new(ServerMetrics::new());
        let diagnostics = Diagnostics::with_builtins(&metrics);
        assert_eq!(diagnostics.paths(), ["/metrics", "/monitoring"]);
        assert!(diagnostics.get("/nope").is_none());
    }

    #[test]
    fn test_metrics_payload_reflects_counters() {
        let metrics = Arc::new(ServerMetrics::new());
        metrics.connection_accepted();
        metrics.connection_accepted();
        let diagnostics = Diagnostics::with_builtins(&metrics);

        let body = diagnostics.get("/metrics").unwrap().render().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["connections_accepted"], 2);
        assert_eq!(json["responses"]["404"], 0);
    }

    #[test]
    fn test_monitoring_needs_a_running_acceptor() {
        let metrics = Arc::new(ServerMetrics::new());
        let diagnostics = Diagnostics::with_builtins(&metrics);
        let endpoint = diagnostics.get("/monitoring").unwrap();

        let json: serde_json::Value = serde_json::from_slice(&endpoint.render().unwrap()).unwrap();
        assert_eq!(json["healthy"], false);

        metrics.acceptor_started();
        let json: serde_json::Value = serde_json::from_slice(&endpoint.render().unwrap()).unwrap();
        assert_eq!(json["healthy"], true);
        assert_eq!(json["checks"]["acceptors_running"], 1);
    }

    #[test]
    fn test_custom_provider_replaces_builtin() {
        let metrics = Arc::new(ServerMetrics::new());
        let mut diagnostics = Diagnostics::with_builtins(&metrics);
        diagnostics.register("/metrics", "txt", || Ok(b"custom".to_vec()));

        let endpoint = diagnostics.get("/metrics").unwrap();
        assert_eq!(endpoint.extension, "txt");
        assert_eq!(endpoint.render().unwrap(), b"custom");
    }
}
