//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Graph construction:
//!     → listener.rs (bind, resolve port 0)
//!     → tls.rs (read and check PEM material, if configured)
//!     → server.rs (collect service routes)
//!
//! Startup:
//!     ModuleServer::prepare → PreparedServer::serve (plaintext or TLS)
//!
//! Outbound:
//!     client.rs (HTTP clients for the registry and peers)
//! ```
//!
//! # Design Decisions
//! - The port is bound while the graph is built, before any service exists
//! - TLS is optional and handled transparently

pub mod client;
pub mod listener;
pub mod server;
pub mod tls;

pub use client::ClientFactory;
pub use listener::{BoundListener, ListenerError};
pub use server::{ModuleServer, PreparedServer};
pub use tls::{TlsError, TransportCredentials};
