//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! component defaults (schema.rs)
//!     → config file, if -c/--config given (loader.rs)
//!     → COMPONENT_* environment, only with a config file (env.rs)
//!     → explicit flags (cli.rs)
//!     → validation.rs (semantic checks)
//!     → ModuleConfig (validated, immutable)
//!     → seeded into the dependency graph as Arc<ModuleConfig>
//! ```
//!
//! # Design Decisions
//! - Config is immutable once resolved; there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Unknown flags abort resolution; nothing runs on partial options

pub mod cli;
pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::ModuleArgs;
pub use env::{EnvSource, ENV_PREFIX};
pub use loader::OptionResolver;
pub use schema::{
    ComponentDefaults, HeartbeatConfig, ModuleConfig, ObservabilityConfig, ShutdownConfig,
    TlsConfig,
};
