//! Dependency graph subsystem.
//!
//! # Data Flow
//! ```text
//! seeds (ModuleConfig, ComponentInfo, ...)  ─┐
//! providers (name, inputs, output, fn)      ─┼→ builder.rs (validate, sort)
//!                                            │      → provider.rs (run once)
//!                                            │      → container.rs (memoize by type)
//!                                            └→ Graph (read-only singletons)
//! ```
//!
//! # Design Decisions
//! - Type identity replaces reflection: a provider's argument tuple is its
//!   dependency list
//! - One value per type; a second producer of a type is a wiring bug
//! - Providers run sequentially on the calling task
//! - Values are written once and read through `Arc` afterwards

pub mod builder;
pub mod container;
pub mod key;
pub mod provider;

pub use builder::{Graph, GraphBuilder};
pub use container::Container;
pub use key::TypeKey;
pub use provider::{Dependencies, Provider};
