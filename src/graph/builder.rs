//! Graph validation and ordered construction.
//!
//! # Algorithm
//! ```text
//! register seeds + providers
//!     → duplicate outputs?        DuplicateProvider
//!     → input nobody produces?    MissingDependency
//!     → DFS over provider edges   CyclicDependency (exact cycle reported)
//!     → Kahn's algorithm, ties broken by registration order
//!     → run providers one by one, memoizing each output by type
//! ```
//!
//! All three checks finish before the first provider runs. A failing
//! provider aborts the build and everything built so far is released in
//! reverse order before the error is returned.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::{BootstrapError, Result};
use crate::graph::container::{AnyValue, Container};
use crate::graph::key::TypeKey;
use crate::graph::provider::{Dependencies, Provider};

const SEED: &str = "seed";

/// Collects seeds and providers, then builds a [`Graph`].
#[derive(Default)]
pub struct GraphBuilder {
    seeds: Vec<(TypeKey, AnyValue)>,
    providers: Vec<Provider>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already-built value.
    pub fn seed<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.seed_arc(Arc::new(value))
    }

    pub fn seed_arc<T: Send + Sync + 'static>(&mut self, value: Arc<T>) -> &mut Self {
        self.seeds.push((TypeKey::of::<T>(), value as AnyValue));
        self
    }

    /// Register a provider that cannot fail.
    pub fn provide<D, T, F>(&mut self, name: &str, f: F) -> &mut Self
    where
        D: Dependencies,
        T: Send + Sync + 'static,
        F: FnOnce(D) -> T + Send + 'static,
    {
        self.register(Provider::infallible(name, f))
    }

    /// Register a provider that may fail.
    pub fn try_provide<D, T, E, F>(&mut self, name: &str, f: F) -> &mut Self
    where
        D: Dependencies,
        T: Send + Sync + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
        F: FnOnce(D) -> std::result::Result<T, E> + Send + 'static,
    {
        self.register(Provider::fallible(name, f))
    }

    pub fn register(&mut self, provider: Provider) -> &mut Self {
        self.providers.push(provider);
        self
    }

    /// Validate the wiring and run every provider exactly once.
    pub fn build(self) -> Result<Graph> {
        let plan = self.plan()?;
        let GraphBuilder { seeds, providers } = self;

        let mut container = Container::new();
        for (key, value) in seeds {
            container.insert(key, SEED, value);
        }

        let mut slots: Vec<Option<Provider>> = providers.into_iter().map(Some).collect();
        let mut constructed = Vec::with_capacity(plan.len());

        for index in plan {
            let Some(provider) = slots[index].take() else {
                continue;
            };
            let name = provider.name().to_string();
            let output = provider.output();

            tracing::debug!(provider = %name, output = output.name(), "Constructing");

            match provider.construct(&container) {
                Ok(value) => {
                    container.insert(output, &name, value);
                    constructed.push(name);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = %name,
                        error = %e,
                        constructed = constructed.len(),
                        "Provider failed, releasing constructed values"
                    );
                    container.release();
                    return Err(e);
                }
            }
        }

        Ok(Graph {
            container,
            order: constructed,
        })
    }

    /// Check the wiring and compute the execution order without running
    /// anything.
    fn plan(&self) -> Result<Vec<usize>> {
        // Producer of every type: None for seeds, Some(index) for providers.
        let mut producers: HashMap<TypeKey, (Option<usize>, String)> = HashMap::new();

        for (key, _) in &self.seeds {
            if let Some((_, first)) = producers.get(key) {
                return Err(duplicate(*key, first, SEED));
            }
            producers.insert(*key, (None, SEED.to_string()));
        }

        for (index, provider) in self.providers.iter().enumerate() {
            let key = provider.output();
            if let Some((_, first)) = producers.get(&key) {
                return Err(duplicate(key, first, provider.name()));
            }
            producers.insert(key, (Some(index), provider.name().to_string()));
        }

        // Provider edges: index → indices of the providers it depends on.
        let mut edges: Vec<Vec<usize>> = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let mut deps = Vec::new();
            for input in provider.inputs() {
                match producers.get(input) {
                    Some((Some(dep), _)) => deps.push(*dep),
                    Some((None, _)) => {}
                    None => {
                        return Err(BootstrapError::MissingDependency {
                            provider: provider.name().to_string(),
                            dependency: input.name(),
                        })
                    }
                }
            }
            edges.push(deps);
        }

        if let Some(cycle) = find_cycle(&edges) {
            return Err(BootstrapError::CyclicDependency {
                cycle: cycle
                    .into_iter()
                    .map(|i| self.providers[i].name().to_string())
                    .collect(),
            });
        }

        Ok(topological_order(&edges))
    }
}

fn duplicate(key: TypeKey, first: &str, second: &str) -> BootstrapError {
    BootstrapError::DuplicateProvider {
        type_name: key.name(),
        first: first.to_string(),
        second: second.to_string(),
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Depth-first search for a cycle. Returns the provider indices along the
/// cycle with the first index repeated at the end.
fn find_cycle(edges: &[Vec<usize>]) -> Option<Vec<usize>> {
    fn visit(node: usize, edges: &[Vec<usize>], marks: &mut [Mark], stack: &mut Vec<usize>) -> Option<Vec<usize>> {
        marks[node] = Mark::InProgress;
        stack.push(node);

        for &dep in &edges[node] {
            match marks[dep] {
                Mark::InProgress => {
                    let start = stack.iter().position(|&n| n == dep).unwrap_or(0);
                    let mut cycle = stack[start..].to_vec();
                    cycle.push(dep);
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    if let Some(cycle) = visit(dep, edges, marks, stack) {
                        return Some(cycle);
                    }
                }
                Mark::Done => {}
            }
        }

        stack.pop();
        marks[node] = Mark::Done;
        None
    }

    let mut marks = vec![Mark::Unvisited; edges.len()];
    let mut stack = Vec::new();
    for node in 0..edges.len() {
        if marks[node] == Mark::Unvisited {
            if let Some(cycle) = visit(node, edges, &mut marks, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}

/// Kahn's algorithm over an acyclic provider graph. Among ready providers
/// the earliest registered runs first.
fn topological_order(edges: &[Vec<usize>]) -> Vec<usize> {
    let mut pending: Vec<usize> = edges.iter().map(Vec::len).collect();
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); edges.len()];
    for (node, deps) in edges.iter().enumerate() {
        for &dep in deps {
            dependents[dep].push(node);
        }
    }

    let mut ready: BTreeSet<usize> = (0..edges.len()).filter(|&n| pending[n] == 0).collect();
    let mut order = Vec::with_capacity(edges.len());

    while let Some(node) = ready.pop_first() {
        order.push(node);
        for &dependent in &dependents[node] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    order
}

/// Fully constructed singletons, one per type.
pub struct Graph {
    container: Container,
    order: Vec<String>,
}

impl Graph {
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.container.get::<T>()
    }

    /// Like [`Graph::get`], but a missing value is an error naming `consumer`.
    pub fn require<T: Send + Sync + 'static>(&self, consumer: &str) -> Result<Arc<T>> {
        self.get::<T>().ok_or_else(|| BootstrapError::MissingDependency {
            provider: consumer.to_string(),
            dependency: TypeKey::of::<T>().name(),
        })
    }

    /// Move an exclusively owned singleton out of the graph.
    pub fn take<T: Send + Sync + 'static>(&mut self) -> Result<T> {
        let type_name = TypeKey::of::<T>().name();
        match self.container.take::<T>() {
            Some(Ok(value)) => Ok(value),
            Some(Err(())) => Err(BootstrapError::SharedSingleton { type_name }),
            None => Err(BootstrapError::MissingDependency {
                provider: "graph".to_string(),
                dependency: type_name,
            }),
        }
    }

    /// Provider names in the order they ran.
    pub fn construction_order(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.container.len()
    }

    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }

    /// Drop every singleton, newest first.
    pub fn release(mut self) {
        self.container.release();
    }
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("values", &self.container.len())
            .field("order", &self.order)
            .finish()
    }
}
