//! Providers every module gets.
//!
//! # Graph
//! ```text
//! ModuleConfig, ModuleHandle (seeded)
//!     → logger                 ModuleLogger
//!     → metrics                MetricsExporter
//!     → transport-credentials  TransportCredentials
//!     → listener               BoundListener
//!     → server                 ModuleServer   (listener, credentials, logger)
//!     → client-factory         ClientFactory
//!     → heartbeat-sender       HeartbeatSink  (config, client factory)
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use url::Url;

use crate::config::ModuleConfig;
use crate::graph::GraphBuilder;
use crate::heartbeat::{HeartbeatSink, HttpRegistrySender, LogSender};
use crate::lifecycle::ModuleHandle;
use crate::net::{BoundListener, ClientFactory, ModuleServer, TransportCredentials};
use crate::observability::metrics::MetricsExporter;
use crate::observability::{logging, ModuleLogger};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Register the standard providers. With `heartbeat_sender` false the
/// caller seeds its own [`HeartbeatSink`].
pub fn register_standard_providers(graph: &mut GraphBuilder, heartbeat_sender: bool) {
    graph
        .provide("logger", |(config, module): (Arc<ModuleConfig>, Arc<ModuleHandle>)| {
            logging::init(&config.observability);
            ModuleLogger::new(module.name(), module.component(), module.instance_id())
        })
        .try_provide("metrics", |(config,): (Arc<ModuleConfig>,)| {
            let Some(address) = &config.observability.metrics_address else {
                return Ok::<_, BoxError>(MetricsExporter::disabled());
            };
            let address: SocketAddr = address.parse()?;
            Ok(MetricsExporter::bind(address)?)
        })
        .try_provide("transport-credentials", |(config,): (Arc<ModuleConfig>,)| {
            TransportCredentials::load(&config.tls)
        })
        .try_provide("listener", |(config,): (Arc<ModuleConfig>,)| {
            BoundListener::bind(&config.listen)
        })
        .try_provide(
            "server",
            |(listener, credentials, logger): (
                Arc<BoundListener>,
                Arc<TransportCredentials>,
                Arc<ModuleLogger>,
            )| { ModuleServer::new(&listener, (*credentials).clone(), &logger) },
        )
        .provide("client-factory", |(config,): (Arc<ModuleConfig>,)| {
            ClientFactory::new(&config)
        });

    if heartbeat_sender {
        graph.try_provide(
            "heartbeat-sender",
            |(config, clients): (Arc<ModuleConfig>, Arc<ClientFactory>)| {
                let Some(registry) = &config.heartbeat.registry_url else {
                    tracing::info!("No registry configured, heartbeats are logged only");
                    return Ok::<_, BoxError>(HeartbeatSink::new(Arc::new(LogSender)));
                };
                let url = Url::parse(registry)?;
                let sender = HttpRegistrySender::new(clients.http_client()?, url);
                Ok(HeartbeatSink::new(Arc::new(sender)))
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::watch;
    use uuid::Uuid;

    use crate::error::BootstrapError;
    use crate::lifecycle::ModuleState;

    fn seeded(config: ModuleConfig) -> GraphBuilder {
        let (_tx, rx) = watch::channel(ModuleState::Constructed);
        let mut graph = GraphBuilder::new();
        graph
            .seed(config)
            .seed(ModuleHandle::new("test", "test", Uuid::new_v4(), rx));
        graph
    }

    fn config() -> ModuleConfig {
        let mut config = ModuleConfig::default();
        config.name = "test".into();
        config.listen = "127.0.0.1:0".into();
        config
    }

    #[test]
    fn standard_graph_builds_in_dependency_order() {
        let mut builder = seeded(config());
        register_standard_providers(&mut builder, true);
        let graph = builder.build().unwrap();

        let order = graph.construction_order();
        let position = |name: &str| order.iter().position(|n| n == name).unwrap();
        assert!(position("logger") < position("server"));
        assert!(position("listener") < position("server"));
        assert!(position("client-factory") < position("heartbeat-sender"));
        assert!(graph.get::<HeartbeatSink>().is_some());
    }

    #[test]
    fn listener_failure_stops_before_server() {
        let mut config = config();
        config.listen = "not-an-address".into();
        let mut builder = seeded(config);
        register_standard_providers(&mut builder, true);

        let err = builder.build().unwrap_err();
        assert!(matches!(err, BootstrapError::Provider { ref provider, .. } if provider == "listener"));
    }

    #[test]
    fn seeded_sink_is_not_duplicated() {
        let mut builder = seeded(config());
        builder.seed(HeartbeatSink::new(Arc::new(LogSender)));
        register_standard_providers(&mut builder, false);
        assert!(builder.build().is_ok());
    }
}
