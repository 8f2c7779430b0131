//! Measures the cost of RWA operations on a base-layer node and projects it onto a batched
//! scaled layer.
//!
//! Configuration is read from the environment; every parameter has a default suitable for a local
//! Ganache instance with the contracts compiled by Truffle.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use rollsim_config::{CostModelConfig, ExperimentConfig, FromEnv, LogConfig};
use rollsim_cost_model::CostModelParams;
use rollsim_cost_simulator::{
    catalog::{oracle_service_fee, rwa_scenarios, Accounts, RwaContracts},
    report, ExperimentDriver,
};
use rollsim_eth_client::{clients::HttpExecutionClient, ExecutionClient};
use rollsim_vlog::{Logs, ObservabilityBuilder};

#[derive(Debug, Parser)]
#[command(author = "The Rollsim Team", version, about = "L1 vs simulated L2 cost comparison", long_about = None)]
struct Cli {
    /// Path of the exported CSV file. Overrides `OUTPUT_CSV`.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Number of repetitions of every scenario. Overrides `RUNS_PER_SCENARIO`.
    #[arg(long)]
    runs: Option<usize>,
    /// Do not export results to CSV.
    #[arg(long, default_value = "false")]
    no_csv: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Cli::parse();

    let log_config = LogConfig::from_env()?;
    let logs = Logs::new(&log_config.format)?.with_log_directives(log_config.directives);
    ObservabilityBuilder::new().with_logs(Some(logs)).try_build()?;

    if let Err(err) = run(opt).await {
        tracing::error!("Experiment failed: {err:#}");
        return Err(err);
    }
    tracing::info!("Experiment finished");
    Ok(())
}

async fn run(opt: Cli) -> anyhow::Result<()> {
    let mut config = ExperimentConfig::from_env()?;
    if let Some(runs) = opt.runs {
        config.runs_per_scenario = runs;
    }
    if let Some(output) = opt.output {
        config.output_csv = output;
    }
    let cost_model_config = CostModelConfig::from_env()?;
    let params = CostModelParams::try_from(&cost_model_config)
        .context("invalid cost model configuration")?;
    tracing::info!("Experiment config: {config:?}");
    tracing::info!("Cost model params: {params:?}");
    let oracle_fee = oracle_service_fee(config.oracle_service_fee_usd)?;

    let client = Arc::new(HttpExecutionClient::from_config(&config)?);
    client.check_connection().await?;
    let driver = ExperimentDriver::new(client.clone(), params, config.batch_sizes.clone())
        .with_run_delay(config.run_delay());
    driver.validate_batch_sizes()?;

    let accounts = Accounts::select(&client.accounts().await?)?;
    tracing::info!("Deployer account: {:?}", accounts.deployer);

    let contracts = RwaContracts::deploy(client.as_ref(), &config.artifacts_dir, accounts.deployer)
        .await
        .context("failed initializing the experiment")?;
    let scenarios = rwa_scenarios(&contracts, &accounts, config.runs_per_scenario, oracle_fee)?;

    let experiment_report = driver.run(&scenarios).await?;

    let csv_path = (!opt.no_csv).then_some(config.output_csv.as_path());
    report::publish(&experiment_report, csv_path);
    Ok(())
}
