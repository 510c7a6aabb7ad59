//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use tempfile::NamedTempFile;

use module_host::component::Component;
use module_host::config::{ComponentDefaults, EnvSource};
use module_host::error::{BootstrapError, Result};
use module_host::graph::{Graph, GraphBuilder};
use module_host::heartbeat::{Announcement, HeartbeatSendError, HeartbeatSender};
use module_host::observability::ModuleLogger;
use module_host::service::{ServiceBinding, ServiceHandler};

/// Heartbeat sender that keeps every announcement it is given.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<Announcement>>,
}

impl RecordingSender {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn announcements(&self) -> Vec<Announcement> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl HeartbeatSender for RecordingSender {
    async fn send(&self, announcement: &Announcement) -> std::result::Result<(), HeartbeatSendError> {
        self.sent.lock().unwrap().push(announcement.clone());
        Ok(())
    }
}

/// An environment with no variables set.
pub fn no_env() -> EnvSource {
    EnvSource::from_vars("COMPONENT", Vec::<(String, String)>::new())
}

/// Write `contents` to a temporary file with the given extension.
pub fn write_config(contents: &str, extension: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(&format!(".{extension}"))
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}

/// Start a mock registry that records announcements and answers `status`.
pub async fn start_mock_registry(status: StatusCode) -> (SocketAddr, Arc<Mutex<Vec<Announcement>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route(
            "/heartbeat",
            post(
                |State((received, status)): State<(Arc<Mutex<Vec<Announcement>>>, StatusCode)>,
                 Json(announcement): Json<Announcement>| async move {
                    received.lock().unwrap().push(announcement);
                    status
                },
            ),
        )
        .with_state((received.clone(), status));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, received)
}

/// Component with one `test.Greeter` service, built from a provider chain.
#[derive(Default, Clone)]
pub struct GreeterComponent {
    /// Bind the greeter twice.
    pub duplicate_service: bool,
    /// Bind a second `module.ModuleService`.
    pub shadow_module_service: bool,
    /// Make the greeting provider fail.
    pub failing_provider: bool,
}

pub struct Greeting(pub String);

pub struct Greeter {
    greeting: Arc<Greeting>,
}

impl ServiceHandler for Greeter {
    fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/Hello", get(|State(greeter): State<Arc<Greeter>>| async move { greeter.greeting.0.clone() }))
            .with_state(self)
    }
}

impl Component for GreeterComponent {
    fn name(&self) -> &str {
        "greeter"
    }

    fn defaults(&self) -> ComponentDefaults {
        ComponentDefaults {
            name: "greeter".to_string(),
            listen: "127.0.0.1:0".to_string(),
        }
    }

    fn providers(&self, graph: &mut GraphBuilder) {
        let failing = self.failing_provider;
        graph
            .try_provide("greeting", move |(_logger,): (Arc<ModuleLogger>,)| {
                if failing {
                    return Err(std::io::Error::other("greeting unavailable"));
                }
                Ok(Greeting("hello".to_string()))
            })
            .provide("greeter", |(greeting,): (Arc<Greeting>,)| Greeter { greeting });
    }

    fn services(&self, graph: &Graph) -> Result<Vec<ServiceBinding>> {
        let greeter = graph.get::<Greeter>().ok_or_else(|| BootstrapError::MissingDependency {
            provider: "greeter-service".to_string(),
            dependency: "Greeter",
        })?;

        let mut bindings = vec![ServiceBinding::new("test.Greeter", greeter.clone())?];
        if self.duplicate_service {
            bindings.push(ServiceBinding::new("test.Greeter", greeter.clone())?);
        }
        if self.shadow_module_service {
            bindings.push(ServiceBinding::new("module.ModuleService", greeter)?);
        }
        Ok(bindings)
    }
}
