//! Execution of a single scenario against the base layer.

use std::{fmt, sync::Arc, time::Duration};

use bigdecimal::BigDecimal;
use rollsim_eth_client::ExecutionClient;
use rollsim_types::{ExecutionOutcome, RunOutcome};

use crate::scenario::Scenario;

/// Result of executing a scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioRun {
    /// A setup step failed; no repetitions were attempted.
    SetupFailed { step: usize, reason: String },
    Completed {
        /// Outcomes of the executed repetitions, in execution order.
        outcomes: Vec<RunOutcome>,
        /// Whether the action factory ran out of invocations before all repetitions were executed.
        exhausted: bool,
    },
}

/// Counts of run outcomes of a scenario.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub successes: usize,
    pub failures: usize,
}

impl RunStats {
    pub fn new(outcomes: &[RunOutcome]) -> Self {
        let successes = outcomes.iter().filter(|outcome| outcome.is_success()).count();
        Self {
            successes,
            failures: outcomes.len() - successes,
        }
    }

    pub fn total(&self) -> usize {
        self.successes + self.failures
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} successful, {} failures. {} total.",
            self.successes,
            self.failures,
            self.total()
        )
    }
}

/// Runs the setup and the repetitions of scenarios, strictly sequentially.
#[derive(Debug)]
pub struct ScenarioExecutor {
    client: Arc<dyn ExecutionClient>,
    fiat_price_per_eth: BigDecimal,
    run_delay: Duration,
}

impl ScenarioExecutor {
    pub fn new(
        client: Arc<dyn ExecutionClient>,
        fiat_price_per_eth: BigDecimal,
        run_delay: Duration,
    ) -> Self {
        Self {
            client,
            fiat_price_per_eth,
            run_delay,
        }
    }

    /// Executes setup steps in order and stops at the first failure.
    async fn run_setup(&self, scenario: &Scenario) -> Result<(), (usize, String)> {
        for (step, call) in scenario.setup.iter().enumerate() {
            tracing::debug!(
                "Setup step #{step} of `{}`: {}",
                scenario.name,
                call.invocation.function
            );
            if let ExecutionOutcome::Failed { reason } = self.client.execute(call).await {
                return Err((step, reason));
            }
        }
        Ok(())
    }

    pub async fn run(&self, scenario: &Scenario) -> ScenarioRun {
        if !scenario.setup.is_empty() {
            tracing::info!(
                "Running setup for `{}` ({} steps)",
                scenario.name,
                scenario.setup.len()
            );
            if let Err((step, reason)) = self.run_setup(scenario).await {
                tracing::warn!(
                    "Setup step #{step} of `{}` failed: {reason}; skipping scenario",
                    scenario.name
                );
                return ScenarioRun::SetupFailed { step, reason };
            }
        }

        let mut outcomes = Vec::with_capacity(scenario.repetitions);
        let mut exhausted = false;
        for repetition in 0..scenario.repetitions {
            if repetition > 0 && !self.run_delay.is_zero() {
                tokio::time::sleep(self.run_delay).await;
            }
            let Some(call) = scenario.action_call(repetition) else {
                tracing::warn!(
                    "`{}` has no invocation for run #{repetition}; stopping repetitions",
                    scenario.name
                );
                exhausted = true;
                break;
            };

            let outcome = self.client.execute(&call).await;
            let outcome = RunOutcome::from_execution(outcome, &self.fiat_price_per_eth);
            match &outcome {
                RunOutcome::Succeeded(receipt) => tracing::info!(
                    "`{}` run #{repetition}: gas used {}, fee {} ETH",
                    scenario.name,
                    receipt.resource_units,
                    receipt.fee
                ),
                RunOutcome::Failed { reason } => {
                    tracing::warn!("`{}` run #{repetition} failed: {reason}", scenario.name);
                }
            }
            outcomes.push(outcome);
        }

        tracing::info!("`{}` stats: {}", scenario.name, RunStats::new(&outcomes));
        ScenarioRun::Completed {
            outcomes,
            exhausted,
        }
    }
}
