//! A module: one component instance with its own configuration, graph,
//! server and heartbeat.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::Span;
use uuid::Uuid;

use crate::component::Component;
use crate::config::{EnvSource, ModuleConfig};
use crate::error::{BootstrapError, Result};
use crate::graph::Graph;
use crate::heartbeat::{HeartbeatHandle, HeartbeatSender, HeartbeatState};
use crate::lifecycle::Shutdown;
use crate::service::ProtocolId;

/// Observable lifecycle of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    Constructed,
    Serving,
    Stopping,
    Stopped,
}

/// Read-only view of a module, available to providers and services.
#[derive(Debug, Clone)]
pub struct ModuleHandle {
    name: String,
    component: String,
    instance_id: Uuid,
    state: watch::Receiver<ModuleState>,
}

impl ModuleHandle {
    pub fn new(
        name: impl Into<String>,
        component: impl Into<String>,
        instance_id: Uuid,
        state: watch::Receiver<ModuleState>,
    ) -> Self {
        Self {
            name: name.into(),
            component: component.into(),
            instance_id,
            state,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn state(&self) -> ModuleState {
        *self.state.borrow()
    }
}

/// A component plus the arguments it will be started with.
pub struct Module {
    pub(crate) component: Arc<dyn Component>,
    pub(crate) args: Vec<String>,
    pub(crate) env: Option<EnvSource>,
    pub(crate) heartbeat_sender: Option<Arc<dyn HeartbeatSender>>,
    pub(crate) instance_id: Uuid,
    pub(crate) state: watch::Sender<ModuleState>,
}

impl Module {
    pub fn new<C, I, S>(component: C, args: I) -> Self
    where
        C: Component,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (state, _) = watch::channel(ModuleState::Constructed);
        Self {
            component: Arc::new(component),
            args: args.into_iter().map(Into::into).collect(),
            env: None,
            heartbeat_sender: None,
            instance_id: Uuid::new_v4(),
            state,
        }
    }

    /// Resolve configuration against `env` instead of the process environment.
    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.env = Some(env);
        self
    }

    /// Deliver heartbeats through `sender` instead of the configured registry.
    pub fn with_heartbeat_sender(mut self, sender: Arc<dyn HeartbeatSender>) -> Self {
        self.heartbeat_sender = Some(sender);
        self
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn component_name(&self) -> &str {
        self.component.name()
    }

    pub fn state(&self) -> ModuleState {
        *self.state.borrow()
    }

    /// Follow state transitions, including those after `start`.
    pub fn subscribe(&self) -> watch::Receiver<ModuleState> {
        self.state.subscribe()
    }

    /// Start, serve until `shutdown` resolves or the server dies, then stop.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let mut running = self.start().await?;

        let outcome = tokio::select! {
            _ = shutdown => Ok(()),
            result = running.server_exited() => result,
        };

        running.stop().await;
        outcome
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("component", &self.component.name())
            .field("args", &self.args)
            .field("instance_id", &self.instance_id)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

/// A module that is accepting requests and sending heartbeats.
pub struct RunningModule {
    pub(crate) config: Arc<ModuleConfig>,
    pub(crate) local_addr: SocketAddr,
    pub(crate) services: Vec<ProtocolId>,
    pub(crate) heartbeat: HeartbeatHandle,
    pub(crate) shutdown: Shutdown,
    pub(crate) server: Option<JoinHandle<std::io::Result<()>>>,
    pub(crate) graph: Option<Graph>,
    pub(crate) state: watch::Sender<ModuleState>,
    pub(crate) span: Span,
}

impl RunningModule {
    /// Address the server accepts on, with the real port if 0 was asked for.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn services(&self) -> &[ProtocolId] {
        &self.services
    }

    pub fn state(&self) -> ModuleState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ModuleState> {
        self.state.subscribe()
    }

    pub fn heartbeat_state(&self) -> HeartbeatState {
        self.heartbeat.state()
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    /// Resolves if the server task ends on its own. Pending forever once
    /// the server has been stopped.
    pub async fn server_exited(&mut self) -> Result<()> {
        let Some(task) = self.server.as_mut() else {
            return std::future::pending().await;
        };

        let result = task.await;
        self.server = None;

        match result {
            Ok(Ok(())) => {
                tracing::warn!(parent: &self.span, "Server exited without a stop request");
                Ok(())
            }
            Ok(Err(e)) => Err(BootstrapError::Io(e)),
            Err(e) => Err(BootstrapError::Io(std::io::Error::other(e))),
        }
    }

    /// Stop in order: heartbeat, then the server (bounded by the grace
    /// period), then the graph. Calling it again has no effect.
    pub async fn stop(&mut self) {
        if self.state() == ModuleState::Stopped {
            return;
        }

        tracing::info!(parent: &self.span, "Module stopping");
        self.state.send_replace(ModuleState::Stopping);

        self.heartbeat.stop().await;

        self.shutdown.trigger();
        if let Some(mut task) = self.server.take() {
            let grace = self.config.shutdown.grace_period();
            match time::timeout(grace + DRAIN_SLACK, &mut task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => tracing::warn!(parent: &self.span, error = %e, "Server ended with error"),
                Ok(Err(e)) => tracing::warn!(parent: &self.span, error = %e, "Server task failed"),
                Err(_) => {
                    tracing::warn!(
                        parent: &self.span,
                        grace_ms = grace.as_millis() as u64,
                        "Server did not drain in time, aborting"
                    );
                    task.abort();
                    let _ = task.await;
                }
            }
        }

        if let Some(graph) = self.graph.take() {
            graph.release();
        }

        self.state.send_replace(ModuleState::Stopped);
        tracing::info!(parent: &self.span, "Module stopped");
    }
}

/// Extra time past the grace period before the server task is aborted.
const DRAIN_SLACK: Duration = Duration::from_millis(100);

impl Drop for RunningModule {
    fn drop(&mut self) {
        if let Some(task) = self.server.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for RunningModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningModule")
            .field("name", &self.config.name)
            .field("local_addr", &self.local_addr)
            .field("services", &self.services)
            .field("state", &self.state())
            .finish()
    }
}
