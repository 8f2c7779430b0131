//! Comparison of operation costs on the base layer and on a simulated batched scaled layer.
//!
//! Every scenario is executed against a live base-layer node to measure its gas consumption. The
//! measurements are then averaged and projected onto the scaled layer for several batch sizes
//! using the analytical model from `rollsim_cost_model`.

pub use crate::{
    aggregator::TrialAggregator,
    driver::{ExperimentDriver, ExperimentReport, SkipReason, SkippedScenario},
    executor::{RunStats, ScenarioExecutor, ScenarioRun},
    scenario::{ActionFactory, Scenario},
};

mod aggregator;
pub mod catalog;
mod driver;
mod executor;
pub mod report;
mod scenario;
