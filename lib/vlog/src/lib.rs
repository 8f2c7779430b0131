//! This crate contains the logging setup of the cost simulation.
//! It provides a single place to configure the log format and the filtering directives.

use anyhow::Context as _;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

pub use crate::logs::{LogFormat, LogFormatError, Logs};

mod logs;

/// Builder for the logging subsystem.
#[derive(Debug, Default)]
pub struct ObservabilityBuilder {
    logs: Option<Logs>,
}

impl ObservabilityBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logs(mut self, logs: Option<Logs>) -> Self {
        self.logs = logs;
        self
    }

    /// Initializes the logging subsystem. Returns an error if it's already initialized.
    pub fn try_build(self) -> anyhow::Result<()> {
        let logs = self.logs.unwrap_or_default();
        let filter = logs.build_filter()?;
        let layer = logs
            .into_layer::<tracing_subscriber::Registry>()
            .with_filter(filter)
            .boxed();

        tracing_subscriber::registry()
            .with(layer)
            .try_init()
            .context("failed installing global logger")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_initialization_fails() {
        // The first call may fail as well if another test has installed the logger already.
        ObservabilityBuilder::new().try_build().ok();
        let err = ObservabilityBuilder::new().try_build().unwrap_err();
        assert!(err.to_string().contains("failed installing"), "{err}");
    }
}
