//! Outbound client factory.

use std::time::Duration;

use crate::config::ModuleConfig;

/// Builds HTTP clients for talking to other services (the registry among
/// them) with module-wide defaults.
#[derive(Debug, Clone)]
pub struct ClientFactory {
    timeout: Duration,
    user_agent: String,
}

impl ClientFactory {
    pub fn new(config: &ModuleConfig) -> Self {
        Self {
            timeout: config.heartbeat.send_timeout(),
            user_agent: format!("{}/{}", config.name, env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_defaults_from_config() {
        let mut config = ModuleConfig::default();
        config.name = "echo-7".into();
        config.heartbeat.send_timeout_ms = 250;

        let factory = ClientFactory::new(&config);
        assert_eq!(factory.timeout(), Duration::from_millis(250));
        assert!(factory.user_agent().starts_with("echo-7/"));
        assert!(factory.http_client().is_ok());
    }
}
