//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Build graph → Register services → Heartbeat → Accept
//!
//! Shutdown (module.rs, shutdown.rs):
//!     Stop heartbeat → Stop accepting → Drain (grace period) → Release graph
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then graph, then the server starts last
//! - Ordered shutdown: nothing is announced after the heartbeat is stopped
//! - Shutdown has timeout: the server is aborted after the grace period

pub mod module;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use module::{Module, ModuleHandle, ModuleState, RunningModule};
pub use shutdown::Shutdown;
pub use signals::wait_for_shutdown_signal;
