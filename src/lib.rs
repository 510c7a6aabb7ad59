//! Module host library
//!
//! Generic machinery for running a component as a network module: layered
//! configuration, a typed dependency graph, service registration, a
//! periodic registry heartbeat and an ordered start/stop lifecycle.

pub mod bootstrap;
pub mod component;
pub mod config;
pub mod echo;
pub mod error;
pub mod graph;
pub mod heartbeat;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod service;

pub use component::{Component, ComponentInfo};
pub use config::ModuleConfig;
pub use error::{BootstrapError, Result};
pub use lifecycle::{Module, ModuleState, RunningModule};
