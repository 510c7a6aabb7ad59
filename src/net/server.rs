//! Module server.
//!
//! # Responsibilities
//! - Own the bound socket and the transport credentials
//! - Collect service routers keyed by protocol id
//! - Serve plaintext through `axum::serve` or TLS through `axum_server`
//! - Stop accepting on shutdown and let in-flight requests drain
//!
//! # Design Decisions
//! - Registration happens before serving; a prepared server is immutable
//! - TLS material is turned into a rustls config in `prepare`, so a bad
//!   certificate fails before anything starts running

use std::collections::BTreeMap;
use std::future::Future;
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, Span};

use crate::error::{BootstrapError, Result};
use crate::net::listener::BoundListener;
use crate::net::tls::TransportCredentials;
use crate::observability::ModuleLogger;
use crate::service::ProtocolId;

/// Server under construction: bound but not accepting.
pub struct ModuleServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    credentials: TransportCredentials,
    routes: BTreeMap<ProtocolId, Router>,
    span: Span,
}

impl ModuleServer {
    pub fn new(
        listener: &BoundListener,
        credentials: TransportCredentials,
        logger: &ModuleLogger,
    ) -> std::io::Result<Self> {
        Ok(Self {
            listener: listener.try_clone_std()?,
            local_addr: listener.local_addr(),
            credentials,
            routes: BTreeMap::new(),
            span: logger.scope("server"),
        })
    }

    /// Mount a service router under `/<protocol>`.
    pub fn register(&mut self, protocol: ProtocolId, router: Router) -> Result<()> {
        if self.routes.contains_key(&protocol) {
            return Err(BootstrapError::DuplicateService {
                protocol: protocol.to_string(),
            });
        }

        tracing::debug!(parent: &self.span, protocol = %protocol, "Service registered");
        self.routes.insert(protocol, router);
        Ok(())
    }

    pub fn is_registered(&self, protocol: &ProtocolId) -> bool {
        self.routes.contains_key(protocol)
    }

    /// Registered protocol ids, sorted.
    pub fn services(&self) -> Vec<ProtocolId> {
        self.routes.keys().cloned().collect()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Assemble the router and load TLS. Nothing accepts yet.
    pub async fn prepare(self) -> std::io::Result<PreparedServer> {
        let mut app = Router::new();
        for (protocol, router) in self.routes {
            app = app.nest(&protocol.path(), router);
        }
        let app = app.layer(TraceLayer::new_for_http());

        let tls = self.credentials.rustls_config().await?;
        self.listener.set_nonblocking(true)?;

        Ok(PreparedServer {
            listener: self.listener,
            local_addr: self.local_addr,
            app,
            tls,
            span: self.span,
        })
    }
}

impl std::fmt::Debug for ModuleServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleServer")
            .field("local_addr", &self.local_addr)
            .field("credentials", &self.credentials)
            .field("services", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Server ready to accept.
pub struct PreparedServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    app: Router,
    tls: Option<RustlsConfig>,
    span: Span,
}

impl PreparedServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept until `shutdown` resolves, then drain. TLS connections get at
    /// most `grace` to finish; plaintext draining is bounded by the caller.
    pub async fn serve<F>(self, shutdown: F, grace: Duration) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let span = self.span.clone();
        self.serve_inner(shutdown, grace).instrument(span).await
    }

    async fn serve_inner<F>(self, shutdown: F, grace: Duration) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match self.tls {
            None => {
                let listener = tokio::net::TcpListener::from_std(self.listener)?;
                tracing::info!(address = %self.local_addr, "Server accepting (plaintext)");

                axum::serve(listener, self.app)
                    .with_graceful_shutdown(shutdown)
                    .await?;
            }
            Some(config) => {
                let handle = axum_server::Handle::new();
                let trigger = handle.clone();
                tokio::spawn(async move {
                    shutdown.await;
                    trigger.graceful_shutdown(Some(grace));
                });

                tracing::info!(address = %self.local_addr, "Server accepting (tls)");

                axum_server::from_tcp_rustls(self.listener, config)
                    .handle(handle)
                    .serve(self.app.into_make_service())
                    .await?;
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }
}
