//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval > 0, timeouts > 0)
//! - Validate addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ModuleConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is handed to any provider

use std::fmt;
use std::net::SocketAddr;

use url::Url;

use crate::config::schema::ModuleConfig;

/// A single semantic problem with a resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ModuleConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "must not be empty"));
    }

    if config.listen.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listen",
            format!("{:?} is not a socket address", config.listen),
        ));
    }

    if config.heartbeat.interval <= 0 {
        errors.push(ValidationError::new(
            "heartbeat.interval",
            format!("must be a positive number of seconds, got {}", config.heartbeat.interval),
        ));
    }

    if config.heartbeat.send_timeout_ms == 0 {
        errors.push(ValidationError::new("heartbeat.send_timeout_ms", "must be positive"));
    }

    if let Some(raw) = &config.heartbeat.registry_url {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::new(
                "heartbeat.registry_url",
                format!("unsupported scheme {:?}", url.scheme()),
            )),
            Err(e) => errors.push(ValidationError::new("heartbeat.registry_url", e.to_string())),
        }
    }

    if config.tls.cert_path.is_some() != config.tls.key_path.is_some() {
        errors.push(ValidationError::new(
            "tls",
            "cert_path and key_path must be set together",
        ));
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("expected \"pretty\" or \"json\", got {:?}", config.observability.log_format),
        ));
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "observability.metrics_address",
                format!("{addr:?} is not a socket address"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ComponentDefaults;

    fn valid() -> ModuleConfig {
        ModuleConfig::for_component(&ComponentDefaults {
            name: "echo".into(),
            listen: "127.0.0.1:0".into(),
        })
    }

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        for interval in [0, -1] {
            let mut config = valid();
            config.heartbeat.interval = interval;
            let errors = validate_config(&config).unwrap_err();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field, "heartbeat.interval");
        }
    }

    #[test]
    fn collects_every_problem() {
        let mut config = valid();
        config.name = " ".into();
        config.listen = "localhost".into();
        config.heartbeat.registry_url = Some("ftp://registry".into());
        config.tls.cert_path = Some("cert.pem".into());

        let fields: Vec<_> = validate_config(&config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, ["name", "listen", "heartbeat.registry_url", "tls"]);
    }
}
