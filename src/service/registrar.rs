//! Binds component services to the module server.

use std::collections::HashSet;

use crate::error::{BootstrapError, Result};
use crate::net::ModuleServer;
use crate::service::ServiceBinding;

/// Register every binding, or none of them.
///
/// Duplicates, whether against services already on the server or within
/// `bindings`, are detected before the first route is mounted.
pub fn register_services(server: &mut ModuleServer, bindings: Vec<ServiceBinding>) -> Result<usize> {
    let mut seen = HashSet::with_capacity(bindings.len());
    for binding in &bindings {
        let protocol = binding.protocol();
        if server.is_registered(protocol) || !seen.insert(protocol.clone()) {
            return Err(BootstrapError::DuplicateService {
                protocol: protocol.to_string(),
            });
        }
    }

    let count = bindings.len();
    for binding in bindings {
        let (protocol, handler) = binding.into_parts();
        server.register(protocol, handler.router())?;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::Router;
    use uuid::Uuid;

    use crate::net::{BoundListener, TransportCredentials};
    use crate::observability::ModuleLogger;
    use crate::service::{ProtocolId, ServiceHandler};

    struct Empty;

    impl ServiceHandler for Empty {
        fn router(self: Arc<Self>) -> Router {
            Router::new()
        }
    }

    fn binding(protocol: &str) -> ServiceBinding {
        ServiceBinding::new(protocol, Arc::new(Empty)).unwrap()
    }

    fn server() -> (BoundListener, ModuleServer) {
        let listener = BoundListener::bind("127.0.0.1:0").unwrap();
        let logger = ModuleLogger::new("test", "test", Uuid::new_v4());
        let server = ModuleServer::new(&listener, TransportCredentials::Plaintext, &logger).unwrap();
        (listener, server)
    }

    #[test]
    fn registers_all_bindings() {
        let (_l, mut server) = server();
        let count = register_services(&mut server, vec![binding("a.A"), binding("b.B")]).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            server.services(),
            vec![ProtocolId::new("a.A").unwrap(), ProtocolId::new("b.B").unwrap()]
        );
    }

    #[test]
    fn duplicate_within_set_binds_nothing() {
        let (_l, mut server) = server();
        let err = register_services(&mut server, vec![binding("a.A"), binding("b.B"), binding("a.A")])
            .unwrap_err();
        assert!(matches!(err, BootstrapError::DuplicateService { protocol } if protocol == "a.A"));
        assert!(server.services().is_empty());
    }

    #[test]
    fn duplicate_of_existing_service_is_rejected() {
        let (_l, mut server) = server();
        register_services(&mut server, vec![binding("a.A")]).unwrap();
        let err = register_services(&mut server, vec![binding("c.C"), binding("a.A")]).unwrap_err();
        assert!(matches!(err, BootstrapError::DuplicateService { .. }));
        assert_eq!(server.services().len(), 1);
    }
}
