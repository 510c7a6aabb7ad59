//! Environment variable overlay.
//!
//! Every leaf of the configuration tree is addressable as
//! `COMPONENT_<PATH>`, where the path segments are joined with `_` and any
//! `-` is mapped to `_`. Names are matched case-insensitively. Values are
//! coerced to the type of the leaf they replace.

use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use crate::error::{BootstrapError, Result};

/// Prefix scoping environment variables to component settings.
pub const ENV_PREFIX: &str = "COMPONENT";

/// Keys that are never read from the environment.
const RESERVED_KEYS: &[&str] = &["config"];

/// Snapshot of the environment, keyed by upper-cased variable name.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    prefix: String,
    vars: HashMap<String, String>,
}

impl EnvSource {
    /// Capture the current process environment.
    pub fn from_process() -> Self {
        Self::from_vars(ENV_PREFIX, std::env::vars())
    }

    /// Build a source from explicit variables.
    pub fn from_vars<I, K, V>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: prefix.to_ascii_uppercase(),
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into().to_ascii_uppercase(), v.into()))
                .collect(),
        }
    }

    /// Variable name for a dotted config path.
    pub fn var_name(&self, path: &str) -> String {
        format!("{}_{}", self.prefix, path.replace(['.', '-'], "_")).to_ascii_uppercase()
    }

    /// Build an overlay tree for every leaf of `base` that has a matching
    /// variable set.
    pub fn overlay(&self, base: &Value) -> Result<Value> {
        let mut overlay = Map::new();
        if let Value::Object(map) = base {
            for (key, value) in map {
                if RESERVED_KEYS.contains(&key.as_str()) {
                    continue;
                }
                if let Some(found) = self.overlay_at(key, value)? {
                    overlay.insert(key.clone(), found);
                }
            }
        }
        Ok(Value::Object(overlay))
    }

    fn overlay_at(&self, path: &str, leaf: &Value) -> Result<Option<Value>> {
        if let Value::Object(map) = leaf {
            let mut nested = Map::new();
            for (key, value) in map {
                let child = format!("{path}.{key}");
                if let Some(found) = self.overlay_at(&child, value)? {
                    nested.insert(key.clone(), found);
                }
            }
            return Ok((!nested.is_empty()).then_some(Value::Object(nested)));
        }

        let name = self.var_name(path);
        match self.vars.get(&name) {
            Some(raw) => coerce(&name, raw, leaf).map(Some),
            None => Ok(None),
        }
    }
}

/// Convert a raw variable into the JSON type of the leaf it replaces.
fn coerce(name: &str, raw: &str, leaf: &Value) -> Result<Value> {
    let bad = |kind: &str| BootstrapError::ConfigParse {
        origin: format!("environment variable {name}"),
        message: format!("expected {kind}, got {raw:?}"),
    };

    match leaf {
        Value::Bool(_) => raw.trim().parse::<bool>().map(Value::Bool).map_err(|_| bad("a boolean")),
        Value::Number(n) if n.is_i64() || n.is_u64() => {
            let raw = raw.trim();
            raw.parse::<i64>()
                .map(Number::from)
                .or_else(|_| raw.parse::<u64>().map(Number::from))
                .map(Value::Number)
                .map_err(|_| bad("an integer"))
        }
        Value::Number(_) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| bad("a number")),
        _ => Ok(Value::String(raw.to_string())),
    }
}
