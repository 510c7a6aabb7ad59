//! Layered option resolution.
//!
//! Effective precedence is defaults < file < environment < explicit flags.
//! Each layer is a JSON value tree deep-merged over the previous one; the
//! result is deserialized once and validated.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::config::cli::ModuleArgs;
use crate::config::env::EnvSource;
use crate::config::schema::{ComponentDefaults, ModuleConfig};
use crate::config::validation::validate_config;
use crate::error::{BootstrapError, Result};

/// Turns raw module arguments into one immutable [`ModuleConfig`].
#[derive(Debug, Clone)]
pub struct OptionResolver {
    defaults: ComponentDefaults,
    env: EnvSource,
}

impl OptionResolver {
    /// Resolver reading the process environment.
    pub fn new(defaults: ComponentDefaults) -> Self {
        Self {
            defaults,
            env: EnvSource::from_process(),
        }
    }

    /// Replace the environment snapshot (tests, embedding hosts).
    pub fn with_env(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    pub fn resolve<I, S>(&self, args: I) -> Result<ModuleConfig>
    where
        I: IntoIterator<Item = S>,
        S: Into<std::ffi::OsString> + Clone,
    {
        let args = ModuleArgs::parse_args(args)?;

        let defaults = ModuleConfig::for_component(&self.defaults);
        let mut tree = serde_json::to_value(&defaults).map_err(|e| BootstrapError::ConfigParse {
            origin: "defaults".to_string(),
            message: e.to_string(),
        })?;

        // The environment is only consulted when a config file is given.
        if let Some(path) = &args.config {
            let file = load_file(path)?;
            merge(&mut tree, file);

            let env = self.env.overlay(&tree)?;
            merge(&mut tree, env);
        }

        merge(&mut tree, args.overlay());

        let config: ModuleConfig = serde_json::from_value(tree).map_err(|e| BootstrapError::ConfigParse {
            origin: args
                .config
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "merged configuration".to_string()),
            message: e.to_string(),
        })?;

        validate_config(&config).map_err(|errors| {
            BootstrapError::InvalidConfiguration(errors.iter().map(ToString::to_string).collect())
        })?;

        tracing::info!(
            name = %config.name,
            listen = %config.listen,
            heartbeat_interval_secs = config.heartbeat.interval,
            config_file = ?config.config,
            "Configuration resolved"
        );

        Ok(config)
    }
}

/// Read a structured config file. JSON by extension, TOML otherwise.
pub fn load_file(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|source| BootstrapError::ConfigLoad {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_error = |message: String| BootstrapError::ConfigParse {
        origin: path.display().to_string(),
        message,
    };

    let value: Value = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
        _ => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
    };

    if !value.is_object() {
        return Err(parse_error("top level must be a table".to_string()));
    }

    tracing::debug!(path = %path.display(), "Config file loaded");
    Ok(value)
}

/// Deep-merge `overlay` into `base`. Tables merge key by key, anything
/// else is replaced.
pub fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
