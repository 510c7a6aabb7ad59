//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve configuration from arguments, file, environment and defaults
//! - Build the provider graph (logger, listener, server, component values)
//! - Register the module service and the component's services
//! - Start the heartbeat, then begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and leaves the module Stopped
//! - Everything that can fail runs before the heartbeat task is spawned
//! - Values built before a failure are released in reverse order

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Span;
use uuid::Uuid;

use crate::bootstrap::register_standard_providers;
use crate::component::{Component, ComponentInfo};
use crate::config::{EnvSource, ModuleConfig, OptionResolver};
use crate::error::Result;
use crate::graph::{Graph, GraphBuilder};
use crate::heartbeat::{HeartbeatHandle, HeartbeatScheduler, HeartbeatSender, HeartbeatSink};
use crate::lifecycle::module::{Module, ModuleHandle, ModuleState, RunningModule};
use crate::lifecycle::Shutdown;
use crate::net::ModuleServer;
use crate::observability::{metrics, MetricsExporter, ModuleLogger};
use crate::service::module_service::MODULE_SERVICE_PROTOCOL;
use crate::service::{register_services, ModuleService, ProtocolId, ServiceBinding};

impl Module {
    /// Bring the module to [`ModuleState::Serving`].
    ///
    /// On error nothing keeps running: the port is closed, no heartbeat
    /// was started and the state is [`ModuleState::Stopped`].
    pub async fn start(self) -> Result<RunningModule> {
        let Module {
            component,
            args,
            env,
            heartbeat_sender,
            instance_id,
            state,
        } = self;

        let started = launch(
            component.as_ref(),
            &args,
            env,
            heartbeat_sender,
            instance_id,
            &state,
        )
        .await;

        match started {
            Ok(parts) => {
                state.send_replace(ModuleState::Serving);
                metrics::record_start(component.name());
                tracing::info!(
                    parent: &parts.span,
                    address = %parts.local_addr,
                    services = parts.services.len(),
                    "Module serving"
                );

                Ok(RunningModule {
                    config: parts.config,
                    local_addr: parts.local_addr,
                    services: parts.services,
                    heartbeat: parts.heartbeat,
                    shutdown: parts.shutdown,
                    server: Some(parts.server),
                    graph: Some(parts.graph),
                    state,
                    span: parts.span,
                })
            }
            Err(e) => {
                tracing::error!(component = component.name(), error = %e, "Module failed to start");
                state.send_replace(ModuleState::Stopped);
                Err(e)
            }
        }
    }
}

struct Launched {
    config: Arc<ModuleConfig>,
    local_addr: SocketAddr,
    services: Vec<ProtocolId>,
    heartbeat: HeartbeatHandle,
    shutdown: Shutdown,
    server: JoinHandle<std::io::Result<()>>,
    graph: Graph,
    span: Span,
}

async fn launch(
    component: &dyn Component,
    args: &[String],
    env: Option<EnvSource>,
    heartbeat_sender: Option<Arc<dyn HeartbeatSender>>,
    instance_id: Uuid,
    state: &watch::Sender<ModuleState>,
) -> Result<Launched> {
    let resolver = OptionResolver::new(component.defaults());
    let resolver = match env {
        Some(env) => resolver.with_env(env),
        None => resolver,
    };
    let config = Arc::new(resolver.resolve(args)?);

    let handle = ModuleHandle::new(&config.name, component.name(), instance_id, state.subscribe());

    let mut builder = GraphBuilder::new();
    builder
        .seed_arc(config.clone())
        .seed(ComponentInfo::new(component.name()))
        .seed(handle);

    let use_registry = heartbeat_sender.is_none();
    if let Some(sender) = heartbeat_sender {
        builder.seed(HeartbeatSink::new(sender));
    }
    register_standard_providers(&mut builder, use_registry);
    component.providers(&mut builder);

    let mut graph = builder.build()?;
    tracing::debug!(order = ?graph.construction_order(), "Graph built");

    let mut server: ModuleServer = graph.take()?;

    let mut bindings = vec![ServiceBinding::new(
        MODULE_SERVICE_PROTOCOL,
        Arc::new(ModuleService::new(graph.require::<ModuleHandle>("module-service")?)),
    )?];
    bindings.extend(component.services(&graph)?);
    register_services(&mut server, bindings)?;

    let sink = graph.require::<HeartbeatSink>("heartbeat")?;
    let scheduler = HeartbeatScheduler::new(
        config.heartbeat.interval(),
        sink.sender(),
        config.name.clone(),
        component.name(),
    )?
    .with_send_timeout(config.heartbeat.send_timeout());

    let services = server.services();
    let prepared = server.prepare().await?;
    let local_addr = prepared.local_addr();

    let span = graph.require::<ModuleLogger>("module")?.span().clone();

    graph.require::<MetricsExporter>("metrics")?.start()?;

    let heartbeat = scheduler.start();

    let shutdown = Shutdown::new();
    let server = tokio::spawn(prepared.serve(shutdown.signalled(), config.shutdown.grace_period()));

    Ok(Launched {
        config,
        local_addr,
        services,
        heartbeat,
        shutdown,
        server,
        graph,
        span,
    })
}
