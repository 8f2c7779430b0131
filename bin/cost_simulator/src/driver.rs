use std::{fmt, sync::Arc, time::Duration};

use anyhow::Context as _;
use rollsim_cost_model::{validate_batch_size, CostModelParams};
use rollsim_eth_client::ExecutionClient;
use rollsim_types::{ResourcePrice, ResultRow};

use crate::{
    aggregator::TrialAggregator,
    executor::{RunStats, ScenarioExecutor, ScenarioRun},
    scenario::Scenario,
};

/// Reason a scenario contributed no rows to the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    SetupFailed { step: usize, reason: String },
    AllRunsFailed { failures: usize },
    NoRunsExecuted,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetupFailed { step, reason } => {
                write!(formatter, "setup step #{step} failed: {reason}")
            }
            Self::AllRunsFailed { failures } => write!(formatter, "all {failures} runs failed"),
            Self::NoRunsExecuted => formatter.write_str("no runs executed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedScenario {
    pub name: String,
    pub reason: SkipReason,
}

/// Output of an experiment pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentReport {
    /// Unit price the pass was performed with.
    pub unit_price: ResourcePrice,
    /// Rows in scenario order; within a scenario, the base-layer row goes first.
    pub rows: Vec<ResultRow>,
    pub skipped: Vec<SkippedScenario>,
}

/// Drives scenarios through execution and aggregation.
#[derive(Debug)]
pub struct ExperimentDriver {
    client: Arc<dyn ExecutionClient>,
    params: CostModelParams,
    batch_sizes: Vec<i64>,
    run_delay: Duration,
}

impl ExperimentDriver {
    pub fn new(
        client: Arc<dyn ExecutionClient>,
        params: CostModelParams,
        batch_sizes: Vec<i64>,
    ) -> Self {
        Self {
            client,
            params,
            batch_sizes,
            run_delay: Duration::ZERO,
        }
    }

    pub fn with_run_delay(mut self, run_delay: Duration) -> Self {
        self.run_delay = run_delay;
        self
    }

    /// Checks that every configured batch size is accepted by the cost model.
    pub fn validate_batch_sizes(&self) -> anyhow::Result<()> {
        for &batch_size in &self.batch_sizes {
            validate_batch_size(batch_size).context("invalid batch sizes")?;
        }
        Ok(())
    }

    /// Runs all scenarios in order. Fails if a batch size is invalid, the unit price cannot be
    /// obtained or the cost model rejects a measurement; failures of individual scenarios only cause
    /// them to be skipped. Batch sizes are checked before any transaction is sent.
    pub async fn run(&self, scenarios: &[Scenario]) -> anyhow::Result<ExperimentReport> {
        self.validate_batch_sizes()?;
        let unit_price = self
            .client
            .unit_price()
            .await
            .context("failed fetching base-layer unit price")?;
        tracing::info!("Base-layer unit price for this pass: {unit_price}");

        let executor = ScenarioExecutor::new(
            self.client.clone(),
            self.params.fiat_price_per_eth.clone(),
            self.run_delay,
        );
        let aggregator =
            TrialAggregator::new(self.params.clone(), unit_price, self.batch_sizes.clone());

        let mut report = ExperimentReport {
            unit_price,
            rows: Vec::new(),
            skipped: Vec::new(),
        };
        for scenario in scenarios {
            tracing::info!("Running scenario `{}`", scenario.name);
            let outcomes = match executor.run(scenario).await {
                ScenarioRun::SetupFailed { step, reason } => {
                    report.skip(&scenario.name, SkipReason::SetupFailed { step, reason });
                    continue;
                }
                ScenarioRun::Completed { outcomes, .. } => outcomes,
            };

            let aggregated = aggregator
                .aggregate(
                    &scenario.name,
                    &outcomes,
                    scenario.external_fee_fiat.as_ref(),
                )
                .with_context(|| format!("failed projecting costs for `{}`", scenario.name))?;
            let Some(aggregated) = aggregated else {
                let reason = if outcomes.is_empty() {
                    SkipReason::NoRunsExecuted
                } else {
                    SkipReason::AllRunsFailed {
                        failures: RunStats::new(&outcomes).failures,
                    }
                };
                report.skip(&scenario.name, reason);
                continue;
            };

            report
                .rows
                .push(ResultRow::base_layer(&aggregated.result, unit_price));
            report.rows.extend(
                aggregated
                    .projections
                    .iter()
                    .map(|projected| ResultRow::scaled_layer(&scenario.name, projected)),
            );
        }
        Ok(report)
    }
}

impl ExperimentReport {
    fn skip(&mut self, name: &str, reason: SkipReason) {
        tracing::warn!("Skipping `{name}` in the report: {reason}");
        self.skipped.push(SkippedScenario {
            name: name.to_owned(),
            reason,
        });
    }
}
