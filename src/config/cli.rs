//! Command-line flags accepted by every module.
//!
//! Flags carry no defaults of their own: an absent flag leaves the value to
//! the lower layers (file, environment, component defaults).

use std::path::PathBuf;

use clap::Parser;
use serde_json::{json, Map, Value};

use crate::error::{BootstrapError, Result};

#[derive(Debug, Clone, Default, PartialEq, Parser)]
#[command(no_binary_name = true, disable_help_flag = true, disable_version_flag = true)]
pub struct ModuleArgs {
    /// Config file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Module name
    #[arg(long = "name")]
    pub name: Option<String>,

    /// Listening address
    #[arg(short = 'l', long = "listen")]
    pub listen: Option<String>,

    /// Heartbeat interval (seconds)
    #[arg(long = "heartbeat-interval", allow_negative_numbers = true)]
    pub heartbeat_interval: Option<i64>,
}

impl ModuleArgs {
    /// Parse module arguments. Anything clap rejects is an argument error;
    /// the process is never exited from here.
    pub fn parse_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|e| BootstrapError::Argument(first_line(&e.to_string())))
    }

    /// Explicitly given flags as a value tree for the final merge layer.
    pub fn overlay(&self) -> Value {
        let mut root = Map::new();
        if let Some(name) = &self.name {
            root.insert("name".into(), json!(name));
        }
        if let Some(listen) = &self.listen {
            root.insert("listen".into(), json!(listen));
        }
        if let Some(interval) = self.heartbeat_interval {
            root.insert("heartbeat".into(), json!({ "interval": interval }));
        }
        if let Some(config) = &self.config {
            root.insert("config".into(), json!(config));
        }
        Value::Object(root)
    }
}

fn first_line(message: &str) -> String {
    message.lines().next().unwrap_or_default().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_flags() {
        let args = ModuleArgs::parse_args([
            "-c",
            "module.toml",
            "--name",
            "echo-2",
            "-l",
            "0.0.0.0:9000",
            "--heartbeat-interval",
            "3",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("module.toml")));
        assert_eq!(args.name.as_deref(), Some("echo-2"));
        assert_eq!(args.listen.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(args.heartbeat_interval, Some(3));
    }

    #[test]
    fn no_flags_means_empty_overlay() {
        let args = ModuleArgs::parse_args(Vec::<String>::new()).unwrap();
        assert_eq!(args.overlay(), json!({}));
    }

    #[test]
    fn unknown_flag_is_argument_error() {
        let err = ModuleArgs::parse_args(["--bogus", "1"]).unwrap_err();
        assert!(matches!(err, BootstrapError::Argument(_)), "{err}");
    }

    #[test]
    fn non_numeric_interval_is_argument_error() {
        let err = ModuleArgs::parse_args(["--heartbeat-interval", "soon"]).unwrap_err();
        assert!(matches!(err, BootstrapError::Argument(_)));
    }

    #[test]
    fn negative_interval_parses_and_is_left_to_validation() {
        let args = ModuleArgs::parse_args(["--heartbeat-interval", "-5"]).unwrap();
        assert_eq!(args.heartbeat_interval, Some(-5));
    }
}
