use serde::Deserialize;

use crate::{envy_load, FromEnv};

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogConfig {
    /// Format of the logs: `plain` or `json`.
    #[serde(default = "LogConfig::default_format")]
    pub format: String,
    /// Comma-separated `tracing` directives, e.g. `rollsim=debug,info`.
    /// If not set, `RUST_LOG` is used.
    pub directives: Option<String>,
}

impl LogConfig {
    fn default_format() -> String {
        "plain".to_owned()
    }
}

impl FromEnv for LogConfig {
    fn from_env() -> anyhow::Result<Self> {
        envy_load("log", "LOG_")
    }
}
