//! Echo component.
//!
//! The smallest useful component: one service that returns what it was
//! sent, plus the module service every module carries.

mod service;

pub use service::{EchoRequest, EchoResponse, EchoService, ECHO_PROTOCOL};

use std::sync::Arc;

use crate::component::{Component, ComponentInfo};
use crate::config::{ComponentDefaults, ModuleConfig};
use crate::error::Result;
use crate::graph::{Graph, GraphBuilder};
use crate::observability::ModuleLogger;
use crate::service::ServiceBinding;

pub const DEFAULT_NAME: &str = "echo";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:13401";

/// Options derived from module configuration and component identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoServiceOptions {
    pub module: String,
    pub component: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EchoComponent;

impl EchoComponent {
    pub fn new() -> Self {
        Self
    }
}

impl Component for EchoComponent {
    fn name(&self) -> &str {
        "echo"
    }

    fn defaults(&self) -> ComponentDefaults {
        ComponentDefaults {
            name: DEFAULT_NAME.to_string(),
            listen: DEFAULT_LISTEN.to_string(),
        }
    }

    fn providers(&self, graph: &mut GraphBuilder) {
        graph
            .provide(
                "echo-options",
                |(config, info): (Arc<ModuleConfig>, Arc<ComponentInfo>)| EchoServiceOptions {
                    module: config.name.clone(),
                    component: info.name().to_string(),
                },
            )
            .provide(
                "echo-service",
                |(options, logger): (Arc<EchoServiceOptions>, Arc<ModuleLogger>)| {
                    EchoService::new(&options, &logger)
                },
            );
    }

    fn services(&self, graph: &Graph) -> Result<Vec<ServiceBinding>> {
        let service = graph.require::<EchoService>("echo")?;
        Ok(vec![ServiceBinding::new(ECHO_PROTOCOL, service)?])
    }
}
