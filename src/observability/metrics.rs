//! Metrics collection and exposition.
//!
//! # Metrics
//! - `module_heartbeats_total` (counter): heartbeat sends by `result` ("ok", "error")
//! - `module_starts_total` (counter): successful module startups by `component`
//!
//! # Design Decisions
//! - Counters go through the `metrics` facade; without an installed
//!   recorder they are no-ops
//! - The Prometheus recorder is process-wide and installed once; each
//!   module owns its own scrape listener, bound during graph construction
//!   and closed when the graph releases it

use std::net::{SocketAddr, TcpListener};
use std::sync::{Mutex, OnceLock};

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::task::JoinHandle;

static RECORDER: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder once and return its render handle.
fn recorder() -> PrometheusHandle {
    RECORDER
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            if metrics::set_global_recorder(recorder).is_err() {
                tracing::warn!("A metrics recorder is already installed; scrapes will be empty");
            }
            handle
        })
        .clone()
}

/// Scrape endpoint owned by one module. Disabled when no address is
/// configured.
pub struct MetricsExporter {
    address: Option<SocketAddr>,
    listener: Mutex<Option<TcpListener>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MetricsExporter {
    pub fn disabled() -> Self {
        Self {
            address: None,
            listener: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    /// Bind the scrape port. Nothing is served until [`MetricsExporter::start`].
    pub fn bind(address: SocketAddr) -> std::io::Result<Self> {
        let listener = TcpListener::bind(address)?;
        let address = listener.local_addr()?;
        tracing::info!(address = %address, "Metrics listener bound");

        Ok(Self {
            address: Some(address),
            listener: Mutex::new(Some(listener)),
            task: Mutex::new(None),
        })
    }

    /// Bound scrape address, with the real port if 0 was asked for.
    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }

    /// Serve `GET /metrics` on the bound port. A second call does nothing.
    pub fn start(&self) -> std::io::Result<()> {
        let listener = match self.listener.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => return Err(std::io::Error::other("metrics listener lock poisoned")),
        };
        let Some(listener) = listener else {
            return Ok(());
        };

        listener.set_nonblocking(true)?;
        let listener = tokio::net::TcpListener::from_std(listener)?;
        let handle = recorder();
        let app = Router::new().route(
            "/metrics",
            get(move || {
                let handle = handle.clone();
                async move { handle.render() }
            }),
        );

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::warn!(error = %e, "Metrics endpoint stopped");
            }
        });

        if let Ok(mut slot) = self.task.lock() {
            *slot = Some(task);
        }
        tracing::info!(address = ?self.address, "Metrics exporter listening");
        Ok(())
    }
}

impl Drop for MetricsExporter {
    fn drop(&mut self) {
        if let Ok(task) = self.task.get_mut() {
            if let Some(task) = task.take() {
                task.abort();
            }
        }
    }
}

impl std::fmt::Debug for MetricsExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsExporter")
            .field("address", &self.address)
            .finish()
    }
}

pub fn record_heartbeat(ok: bool) {
    let result = if ok { "ok" } else { "error" };
    metrics::counter!("module_heartbeats_total", "result" => result).increment(1);
}

pub fn record_start(component: &str) {
    metrics::counter!("module_starts_total", "component" => component.to_string()).increment(1);
}
