//! Heartbeat subsystem.
//!
//! # Data Flow
//! ```text
//! scheduler.rs (tick every interval)
//!     → announcement.rs (module, component, timestamp)
//!     → sender.rs (HTTP registry, or log only)
//!     → failure: logged + counted, retried on the next tick
//! ```
//!
//! # Design Decisions
//! - The heartbeat task shares nothing mutable with request handling
//! - Stop is explicit and awaited, so shutdown ordering can be verified
//! - A struggling registry is never contacted more than once per interval

pub mod announcement;
pub mod scheduler;
pub mod sender;

pub use announcement::Announcement;
pub use scheduler::{HeartbeatHandle, HeartbeatScheduler, HeartbeatState};
pub use sender::{HeartbeatSendError, HeartbeatSender, HeartbeatSink, HttpRegistrySender, LogSender};
