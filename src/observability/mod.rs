//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events inside the module span)
//!     → metrics.rs (heartbeat and startup counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape), when configured
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Module name, component and instance ID flow through every span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use logging::ModuleLogger;
pub use metrics::MetricsExporter;
