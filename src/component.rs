//! Component contract.
//!
//! A component is the code a module runs: it declares defaults, adds its
//! own providers to the graph and hands back the services to serve.

use crate::config::ComponentDefaults;
use crate::error::Result;
use crate::graph::{Graph, GraphBuilder};
use crate::lifecycle::Module;
use crate::service::ServiceBinding;

pub trait Component: Send + Sync + 'static {
    /// Component type name, e.g. "echo". Reported in heartbeats.
    fn name(&self) -> &str;

    /// Module name and listen address used when nothing overrides them.
    fn defaults(&self) -> ComponentDefaults;

    /// Register component providers. Standard values (configuration,
    /// logger, listener, client factory) are already available as inputs.
    fn providers(&self, _graph: &mut GraphBuilder) {}

    /// Services to bind, built from the constructed graph.
    fn services(&self, graph: &Graph) -> Result<Vec<ServiceBinding>>;

    /// A module running this component with the given arguments.
    fn new_module<I, S>(self, args: I) -> Module
    where
        Self: Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Module::new(self, args)
    }
}

/// Identity of the running component, seeded into every graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    name: String,
}

impl ComponentInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
