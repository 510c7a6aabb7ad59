//! Typed providers.
//!
//! A provider declares its inputs through the type of its argument: a tuple
//! of `Arc<T>` values. The tuple type doubles as the dependency list the
//! builder validates before anything runs.

use std::sync::Arc;

use crate::error::{BootstrapError, Result};
use crate::graph::container::{AnyValue, Container};
use crate::graph::key::TypeKey;

/// A tuple of `Arc<T>` that can be listed and fetched from a container.
pub trait Dependencies: Sized + Send + 'static {
    fn keys() -> Vec<TypeKey>;
    fn resolve(container: &Container) -> Option<Self>;
}

macro_rules! impl_dependencies {
    ($($ty:ident),*) => {
        impl<$($ty: Send + Sync + 'static),*> Dependencies for ($(Arc<$ty>,)*) {
            fn keys() -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$ty>()),*]
            }

            #[allow(unused_variables)]
            fn resolve(container: &Container) -> Option<Self> {
                Some(($(container.get::<$ty>()?,)*))
            }
        }
    };
}

impl_dependencies!();
impl_dependencies!(A);
impl_dependencies!(A, B);
impl_dependencies!(A, B, C);
impl_dependencies!(A, B, C, D);
impl_dependencies!(A, B, C, D, E);
impl_dependencies!(A, B, C, D, E, F);

type Construct = Box<dyn FnOnce(&Container) -> Result<AnyValue> + Send>;

/// A named construction function for one output type.
pub struct Provider {
    name: String,
    output: TypeKey,
    inputs: Vec<TypeKey>,
    construct: Construct,
}

impl Provider {
    /// Provider that may fail. The error is kept verbatim as the source of
    /// [`BootstrapError::Provider`].
    pub fn fallible<D, T, E, F>(name: impl Into<String>, f: F) -> Self
    where
        D: Dependencies,
        T: Send + Sync + 'static,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
        F: FnOnce(D) -> std::result::Result<T, E> + Send + 'static,
    {
        let name = name.into();
        let owner = name.clone();
        Self {
            name,
            output: TypeKey::of::<T>(),
            inputs: D::keys(),
            construct: Box::new(move |container| {
                let deps = D::resolve(container).ok_or_else(|| BootstrapError::MissingDependency {
                    provider: owner.clone(),
                    dependency: first_missing(container, &D::keys()),
                })?;
                let value = f(deps).map_err(|e| BootstrapError::provider(owner, e))?;
                Ok(Arc::new(value) as AnyValue)
            }),
        }
    }

    /// Provider that cannot fail.
    pub fn infallible<D, T, F>(name: impl Into<String>, f: F) -> Self
    where
        D: Dependencies,
        T: Send + Sync + 'static,
        F: FnOnce(D) -> T + Send + 'static,
    {
        Self::fallible(name, move |deps: D| Ok::<T, std::convert::Infallible>(f(deps)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output(&self) -> TypeKey {
        self.output
    }

    pub fn inputs(&self) -> &[TypeKey] {
        &self.inputs
    }

    pub(crate) fn construct(self, container: &Container) -> Result<AnyValue> {
        (self.construct)(container)
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("name", &self.name)
            .field("output", &self.output)
            .field("inputs", &self.inputs)
            .finish()
    }
}

fn first_missing(container: &Container, keys: &[TypeKey]) -> &'static str {
    keys.iter()
        .find(|key| !container.contains(key))
        .map(TypeKey::name)
        .unwrap_or("<unknown>")
}
