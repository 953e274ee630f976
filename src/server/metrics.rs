//! Process-wide counters for the connection pipeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

use crate::server::response::StatusCode;

/// Atomic counters shared by the acceptors, stages and failure handler.
#[derive(Debug)]
pub struct ServerMetrics {
    started: Instant,
    connections_accepted: AtomicU64,
    connections_open: AtomicU64,
    acceptors_running: AtomicU64,
    requests_handled: AtomicU64,
    keep_alive_reuses: AtomicU64,
    read_timeouts: AtomicU64,
    protocol_errors: AtomicU64,
    uncaught_failures: AtomicU64,
    responses_ok: AtomicU64,
    responses_forbidden: AtomicU64,
    responses_not_found: AtomicU64,
    responses_method_not_allowed: AtomicU64,
    responses_internal_error: AtomicU64,
}

/// A point-in-time copy of [`ServerMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub connections_accepted: u64,
    pub connections_open: u64,
    pub acceptors_running: u64,
    pub requests_handled: u64,
    pub keep_alive_reuses: u64,
    pub read_timeouts: u64,
    pub protocol_errors: u64,
    pub uncaught_failures: u64,
    pub responses: ResponseCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseCounts {
    #[serde(rename = "200")]
    pub ok: u64,
    #[serde(rename = "403")]
    pub forbidden: u64,
    #[serde(rename = "404")]
    pub not_found: u64,
    #[serde(rename = "405")]
    pub method_not_allowed: u64,
    #[serde(rename = "500")]
    pub internal_error: u64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

fn read(counter: &AtomicU64) -> u64 {
    counter.load(Ordering::Relaxed)
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            connections_accepted: AtomicU64::new(0),
            connections_open: AtomicU64::new(0),
            acceptors_running: AtomicU64::new(0),
            requests_handled: AtomicU64::new(0),
            keep_alive_reuses: AtomicU64::new(0),
            read_timeouts: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            uncaught_failures: AtomicU64::new(0),
            responses_ok: AtomicU64::new(0),
            responses_forbidden: AtomicU64::new(0),
            responses_not_found: AtomicU64::new(0),
            responses_method_not_allowed: AtomicU64::new(0),
            responses_internal_error: AtomicU64::new(0),
        }
    }

    pub fn connection_accepted(&self) {
        bump(&self.connections_accepted);
    }

    pub fn connection_opened(&self) {
        bump(&self.connections_open);
    }

    pub fn connection_closed(&self) {
        self.connections_open.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn acceptor_started(&self) {
        bump(&self.acceptors_running);
    }

    pub fn acceptor_stopped(&self) {
        self.acceptors_running.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn request_handled(&self) {
        bump(&self.requests_handled);
    }

    pub fn keep_alive_reused(&self) {
        bump(&self.keep_alive_reuses);
    }

    pub fn read_timed_out(&self) {
        bump(&self.read_timeouts);
    }

    pub fn protocol_error(&self) {
        bump(&self.protocol_errors);
    }

    pub fn uncaught_failure(&self) {
        bump(&self.uncaught_failures);
    }

    pub fn response_sent(&self, status: StatusCode) {
        let counter = match status {
            StatusCode::Ok => &self.responses_ok,
            StatusCode::Forbidden => &self.responses_forbidden,
            StatusCode::NotFound => &self.responses_not_found,
            StatusCode::MethodNotAllowed => &self.responses_method_not_allowed,
            StatusCode::InternalServerError => &self.responses_internal_error,
        };
        bump(counter);
    }

    /// Total connections handed out by the acceptors.
    pub fn connections_accepted(&self) -> u64 {
        read(&self.connections_accepted)
    }

    pub fn acceptors_running(&self) -> u64 {
        read(&self.acceptors_running)
    }

    pub fn uncaught_failures(&self) -> u64 {
        read(&self.uncaught_failures)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.started.elapsed().as_secs(),
            connections_accepted: read(&self.connections_accepted),
            connections_open: read(&self.connections_open),
            acceptors_running: read(&self.acceptors_running),
            requests_handled: read(&self.requests_handled),
            keep_alive_reuses: read(&self.keep_alive_reuses),
            read_timeouts: read(&self.read_timeouts),
            protocol_errors: read(&self.protocol_errors),
            uncaught_failures: read(&self.uncaught_failures),
            responses: ResponseCounts {
                ok: read(&self.responses_ok),
                forbidden: read(&self.responses_forbidden),
                not_found: read(&self.responses_not_found),
                method_not_allowed: read(&self.responses_method_not_allowed),
                internal_error: read(&self.responses_internal_error),
            },
        }
    }
}
