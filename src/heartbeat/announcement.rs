use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Liveness record sent to the registry on every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Module name (`--name`).
    pub module: String,
    /// Component the module was created from.
    pub component: String,
    /// Unix time in milliseconds.
    pub timestamp: u64,
}

impl Announcement {
    pub fn now(module: &str, component: &str) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            module: module.to_string(),
            component: component.to_string(),
            timestamp,
        }
    }
}
