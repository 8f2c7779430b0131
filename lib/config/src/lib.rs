//! Configuration of the cost simulation.
//!
//! Every config can be loaded from the environment; fields that are not provided fall back
//! to the defaults, and every applied default is logged.

use anyhow::Context as _;
use serde::de::DeserializeOwned;

pub use crate::{
    cost_model::CostModelConfig, experiment::ExperimentConfig, observability::LogConfig,
};

mod cost_model;
mod experiment;
mod observability;
#[cfg(test)]
mod test_utils;

pub trait FromEnv: Sized {
    fn from_env() -> anyhow::Result<Self>;
}

/// Convenience function that loads the structure from the environment variables with the given prefix.
pub fn envy_load<T: DeserializeOwned>(name: &str, prefix: &str) -> anyhow::Result<T> {
    envy::prefixed(prefix)
        .from_env()
        .with_context(|| format!("Cannot load config <{name}>"))
}
