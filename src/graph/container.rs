//! Singleton storage for constructed values.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::key::TypeKey;

pub(crate) type AnyValue = Arc<dyn Any + Send + Sync>;

/// Type-indexed store holding at most one value per type.
///
/// Values are released in reverse insertion order, so anything a provider
/// opened is dropped before the values it was built from.
#[derive(Default)]
pub struct Container {
    values: HashMap<TypeKey, AnyValue>,
    order: Vec<(TypeKey, String)>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: TypeKey, origin: &str, value: AnyValue) {
        self.values.insert(key, value);
        self.order.push((key, origin.to_string()));
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.values
            .get(&TypeKey::of::<T>())
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// Remove a value and return it if nothing else holds a reference.
    /// A shared value is put back and `Err` is returned.
    pub(crate) fn take<T: Send + Sync + 'static>(&mut self) -> Option<Result<T, ()>> {
        let key = TypeKey::of::<T>();
        let value = self.values.remove(&key)?;
        let typed = match value.downcast::<T>() {
            Ok(typed) => typed,
            Err(value) => {
                self.values.insert(key, value);
                return Some(Err(()));
            }
        };
        match Arc::try_unwrap(typed) {
            Ok(owned) => Some(Ok(owned)),
            Err(shared) => {
                self.values.insert(key, shared);
                Some(Err(()))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop every value, newest first.
    pub fn release(&mut self) {
        while let Some((key, origin)) = self.order.pop() {
            if self.values.remove(&key).is_some() {
                tracing::debug!(type_name = key.name(), origin = %origin, "Released");
            }
        }
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        self.release();
    }
}
