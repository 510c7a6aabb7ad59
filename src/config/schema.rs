//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for a module.
//! All types derive Serde traits so the layered resolver can merge sources
//! as value trees and deserialize once at the end.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default heartbeat period in seconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: i64 = 15;

/// Root configuration for a running module.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ModuleConfig {
    /// Module identifier reported to the registry.
    pub name: String,

    /// Network bind address (e.g., "127.0.0.1:13401").
    pub listen: String,

    /// Config file this configuration was read from, if any.
    pub config: Option<PathBuf>,

    /// Liveness reporting.
    pub heartbeat: HeartbeatConfig,

    /// Optional transport security.
    pub tls: TlsConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,

    /// Shutdown behaviour.
    pub shutdown: ShutdownConfig,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            listen: String::new(),
            config: None,
            heartbeat: HeartbeatConfig::default(),
            tls: TlsConfig::default(),
            observability: ObservabilityConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

impl ModuleConfig {
    /// Defaults for a component: its declared module name and listen address.
    pub fn for_component(defaults: &ComponentDefaults) -> Self {
        Self {
            name: defaults.name.clone(),
            listen: defaults.listen.clone(),
            ..Self::default()
        }
    }
}

/// Per-component defaults that seed the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDefaults {
    pub name: String,
    pub listen: String,
}

/// Heartbeat configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HeartbeatConfig {
    /// Tick period in seconds. Must be positive.
    pub interval: i64,

    /// Registry endpoint receiving announcements. Logged only when unset.
    pub registry_url: Option<String>,

    /// Upper bound for a single send, in milliseconds.
    pub send_timeout_ms: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            registry_url: None,
            send_timeout_ms: 5_000,
        }
    }
}

impl HeartbeatConfig {
    /// Interval as a duration. Validation guarantees it is positive.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval.max(0) as u64)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: Option<PathBuf>,

    /// Path to private key file (PEM).
    pub key_path: Option<PathBuf>,
}

impl TlsConfig {
    pub fn is_enabled(&self) -> bool {
        self.cert_path.is_some() && self.key_path.is_some()
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Prometheus exporter bind address. No exporter when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_address: None,
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long the server may drain in-flight requests, in milliseconds.
    pub grace_period_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 5_000,
        }
    }
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}
