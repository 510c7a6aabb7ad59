//! Error taxonomy for module bootstrap.
//!
//! Everything in [`BootstrapError`] is fatal: it aborts startup and is
//! surfaced to the process entry point. Heartbeat failures are transient and
//! live in [`crate::heartbeat::HeartbeatSendError`] instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while turning arguments into a serving module.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Bad command-line input (unknown flag, missing value, bad number).
    #[error("argument error: {0}")]
    Argument(String),

    /// An explicitly given config file could not be read.
    #[error("failed to load config file {}: {source}", path.display())]
    ConfigLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config content (file or environment) could not be parsed.
    #[error("failed to parse configuration from {origin}: {message}")]
    ConfigParse { origin: String, message: String },

    /// A provider input is neither produced by another provider nor seeded.
    #[error("provider `{provider}` depends on `{dependency}`, which nothing provides")]
    MissingDependency {
        provider: String,
        dependency: &'static str,
    },

    /// Provider inputs form a cycle. Names are listed in cycle order.
    #[error("cyclic dependency: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// Two registrations produce the same type.
    #[error("`{type_name}` is provided by both `{first}` and `{second}`")]
    DuplicateProvider {
        type_name: &'static str,
        first: String,
        second: String,
    },

    /// Two services were bound under one protocol identifier.
    #[error("service `{protocol}` is already registered")]
    DuplicateService { protocol: String },

    /// The resolved configuration is semantically invalid.
    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfiguration(Vec<String>),

    /// A provider returned an error; the original error is kept as source.
    #[error("provider `{provider}` failed: {source}")]
    Provider {
        provider: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A singleton that must be exclusively owned is still shared.
    #[error("`{type_name}` is still shared and cannot be taken out of the graph")]
    SharedSingleton { type_name: &'static str },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BootstrapError {
    /// Wrap an arbitrary provider failure, keeping the original error.
    pub fn provider<E>(provider: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        BootstrapError::Provider {
            provider: provider.into(),
            source: source.into(),
        }
    }
}

pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;
