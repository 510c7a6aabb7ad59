//! TCP listener provider.
//!
//! # Responsibilities
//! - Bind to the configured address during graph construction
//! - Report the real address when port 0 was requested
//! - Hand duplicates of the socket to the server
//!
//! The socket is bound synchronously so that a failure surfaces as a
//! provider error and nothing after it in the graph runs.

use std::net::{SocketAddr, TcpListener};

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// The configured address is not a socket address.
    Address(String),
    /// Failed to bind to address.
    Bind(std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Address(addr) => write!(f, "Invalid listen address: {}", addr),
            ListenerError::Bind(e) => write!(f, "Failed to bind: {}", e),
        }
    }
}

impl std::error::Error for ListenerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListenerError::Address(_) => None,
            ListenerError::Bind(e) => Some(e),
        }
    }
}

/// A bound, not yet accepting, TCP listener owned by the module.
#[derive(Debug)]
pub struct BoundListener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl BoundListener {
    /// Bind to `address` (e.g. "127.0.0.1:0").
    pub fn bind(address: &str) -> Result<Self, ListenerError> {
        let addr: SocketAddr = address
            .parse()
            .map_err(|_| ListenerError::Address(address.to_string()))?;

        let inner = TcpListener::bind(addr).map_err(ListenerError::Bind)?;
        let local_addr = inner.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner, local_addr })
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A second handle to the same socket for the serving task. The port
    /// stays bound until every handle is dropped.
    pub fn try_clone_std(&self) -> std::io::Result<TcpListener> {
        self.inner.try_clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_ephemeral_port() {
        let listener = BoundListener::bind("127.0.0.1:0").unwrap();
        assert_ne!(listener.local_addr().port(), 0);
    }

    #[test]
    fn rejects_unparseable_address() {
        assert!(matches!(
            BoundListener::bind("localhost"),
            Err(ListenerError::Address(_))
        ));
    }

    #[test]
    fn port_in_use_is_bind_error() {
        let first = BoundListener::bind("127.0.0.1:0").unwrap();
        let taken = first.local_addr().to_string();
        assert!(matches!(BoundListener::bind(&taken), Err(ListenerError::Bind(_))));
    }

    #[test]
    fn dropping_releases_the_port() {
        let first = BoundListener::bind("127.0.0.1:0").unwrap();
        let addr = first.local_addr().to_string();
        drop(first);
        assert!(BoundListener::bind(&addr).is_ok());
    }
}
