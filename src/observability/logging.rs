//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Provide the per-module span every module task runs in
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level from `RUST_LOG` when set, otherwise from config
//! - Installing the subscriber twice is a no-op, not an error

use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Install the global subscriber. Returns false if one was already set.
pub fn init(config: &ObservabilityConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("module_host={0},{0}", config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    installed.is_ok()
}

/// Logger handed to providers: a span carrying the module's identity.
#[derive(Debug, Clone)]
pub struct ModuleLogger {
    span: Span,
}

impl ModuleLogger {
    pub fn new(name: &str, component: &str, instance: Uuid) -> Self {
        Self {
            span: tracing::info_span!("module", name = %name, component = %component, instance = %instance),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Child span for one subsystem of the module.
    pub fn scope(&self, subsystem: &'static str) -> Span {
        tracing::info_span!(parent: &self.span, "subsystem", name = subsystem)
    }
}
