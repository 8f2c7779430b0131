use std::str::FromStr;

use anyhow::Context as _;
use tracing::Subscriber;
use tracing_subscriber::{fmt, registry::LookupSpan, EnvFilter, Layer};

/// Default directive used if neither explicit directives nor `RUST_LOG` are provided.
const DEFAULT_DIRECTIVE: &str = "info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Plain,
    Json,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid log format {0:?}, expected `plain` or `json`")]
pub struct LogFormatError(String);

impl FromStr for LogFormat {
    type Err = LogFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(LogFormatError(other.to_owned())),
        }
    }
}

/// Configuration of the log output.
#[derive(Debug, Default)]
pub struct Logs {
    format: LogFormat,
    log_directives: Option<String>,
}

impl From<LogFormat> for Logs {
    fn from(format: LogFormat) -> Self {
        Self {
            format,
            log_directives: None,
        }
    }
}

impl Logs {
    pub fn new(format: &str) -> Result<Self, LogFormatError> {
        Ok(Self::from(format.parse::<LogFormat>()?))
    }

    pub fn with_log_directives(mut self, log_directives: Option<String>) -> Self {
        self.log_directives = log_directives;
        self
    }

    pub(crate) fn build_filter(&self) -> anyhow::Result<EnvFilter> {
        Ok(match &self.log_directives {
            Some(directives) => EnvFilter::try_new(directives)
                .with_context(|| format!("invalid log directives: {directives}"))?,
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE)),
        })
    }

    pub(crate) fn into_layer<S>(self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
    {
        match self.format {
            LogFormat::Plain => fmt::layer().with_target(true).boxed(),
            LogFormat::Json => fmt::layer().json().with_current_span(true).boxed(),
        }
    }
}
