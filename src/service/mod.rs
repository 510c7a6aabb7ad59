//! Service registration subsystem.
//!
//! # Data Flow
//! ```text
//! Component::services(&graph)
//!     → Vec<ServiceBinding>   (protocol id + handler)
//!     → registrar.rs          (duplicate check, then bind all)
//!     → ModuleServer routes   (nested under /<protocol>)
//! ```
//!
//! Every module also exposes `module.ModuleService` (module_service.rs).

pub mod module_service;
pub mod registrar;

use std::fmt;
use std::sync::Arc;

use axum::Router;

use crate::error::{BootstrapError, Result};

pub use module_service::ModuleService;
pub use registrar::register_services;

/// Wire identifier of a service, e.g. `echo.EchoService`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolId(String);

impl ProtocolId {
    /// Accepts non-empty ASCII letters, digits, `.`, `_` and `-`.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(BootstrapError::InvalidConfiguration(vec![format!(
                "service protocol `{id}`: must be non-empty and use only letters, digits, '.', '_' or '-'"
            )]));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path prefix the service is mounted under.
    pub fn path(&self) -> String {
        format!("/{}", self.0)
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request handling for one service.
pub trait ServiceHandler: Send + Sync + 'static {
    /// Routes relative to the service prefix, with state already applied.
    fn router(self: Arc<Self>) -> Router;
}

/// A handler paired with the protocol it answers on.
#[derive(Clone)]
pub struct ServiceBinding {
    protocol: ProtocolId,
    handler: Arc<dyn ServiceHandler>,
}

impl ServiceBinding {
    pub fn new(protocol: &str, handler: Arc<dyn ServiceHandler>) -> Result<Self> {
        Ok(Self {
            protocol: ProtocolId::new(protocol)?,
            handler,
        })
    }

    pub fn protocol(&self) -> &ProtocolId {
        &self.protocol
    }

    pub(crate) fn into_parts(self) -> (ProtocolId, Arc<dyn ServiceHandler>) {
        (self.protocol, self.handler)
    }
}

impl fmt::Debug for ServiceBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceBinding")
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_id_accepts_dotted_names() {
        let id = ProtocolId::new("echo.EchoService").unwrap();
        assert_eq!(id.as_str(), "echo.EchoService");
        assert_eq!(id.path(), "/echo.EchoService");
    }

    #[test]
    fn protocol_id_rejects_empty_and_slashes() {
        assert!(ProtocolId::new("").is_err());
        assert!(ProtocolId::new("echo/Echo").is_err());
        assert!(ProtocolId::new("echo service").is_err());
    }
}
