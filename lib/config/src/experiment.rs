use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::{envy_load, FromEnv};

/// Configuration of an experiment pass.
///
/// Describes where the base layer lives, which contracts to deploy and how many times every
/// scenario is repeated. The cost model itself is configured separately.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExperimentConfig {
    /// Address of the base-layer JSON-RPC API. The node is expected to manage unlocked accounts
    /// (e.g. Ganache or an Anvil/Hardhat dev node).
    #[serde(default = "default_l1_rpc_address")]
    pub l1_rpc_address: String,

    /// Directory with the compiled contract artifacts (Truffle `build/contracts` layout).
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Number of repetitions of every scenario action.
    #[serde(default = "default_runs_per_scenario")]
    pub runs_per_scenario: usize,

    /// Batch sizes to project the scaled-layer cost for, in reporting order.
    /// Values are signed on purpose: non-positive sizes are a configuration bug that must be
    /// reported by the cost model rather than rejected silently while parsing.
    #[serde(default = "default_batch_sizes")]
    pub batch_sizes: Vec<i64>,

    /// Flat fee charged by the oracle service per update, in USD.
    #[serde(default = "default_oracle_service_fee_usd")]
    pub oracle_service_fee_usd: f64,

    /// Time to wait for a transaction receipt before the run is considered failed.
    #[serde(default = "default_confirmation_timeout_sec")]
    pub confirmation_timeout_sec: u64,

    /// Time to wait for a contract deployment receipt.
    #[serde(default = "default_deploy_timeout_sec")]
    pub deploy_timeout_sec: u64,

    /// Interval between receipt polls.
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,

    /// Pause between repetitions of a scenario action.
    #[serde(default = "default_run_delay_ms")]
    pub run_delay_ms: u64,

    /// Gas price used to compute the fee of a run if the node reports none.
    #[serde(default = "default_fallback_gas_price_gwei")]
    pub fallback_gas_price_gwei: u64,

    /// File the comparison table is exported to.
    #[serde(default = "default_output_csv")]
    pub output_csv: PathBuf,
}

fn default_l1_rpc_address() -> String {
    let result = "http://127.0.0.1:8545".to_string();
    tracing::info!("Using default L1_RPC_ADDRESS: {result}");
    result
}

fn default_artifacts_dir() -> PathBuf {
    let result = PathBuf::from("./build/contracts");
    tracing::info!("Using default ARTIFACTS_DIR: {result:?}");
    result
}

fn default_runs_per_scenario() -> usize {
    let result = 3;
    tracing::info!("Using default RUNS_PER_SCENARIO: {result}");
    result
}

fn default_batch_sizes() -> Vec<i64> {
    let result = vec![10, 50];
    tracing::info!("Using default BATCH_SIZES: {result:?}");
    result
}

fn default_oracle_service_fee_usd() -> f64 {
    let result = 0.1;
    tracing::info!("Using default ORACLE_SERVICE_FEE_USD: {result}");
    result
}

fn default_confirmation_timeout_sec() -> u64 {
    let result = 120;
    tracing::info!("Using default CONFIRMATION_TIMEOUT_SEC: {result}");
    result
}

fn default_deploy_timeout_sec() -> u64 {
    let result = 180;
    tracing::info!("Using default DEPLOY_TIMEOUT_SEC: {result}");
    result
}

fn default_polling_interval_ms() -> u64 {
    let result = 200;
    tracing::info!("Using default POLLING_INTERVAL_MS: {result}");
    result
}

fn default_run_delay_ms() -> u64 {
    let result = 50;
    tracing::info!("Using default RUN_DELAY_MS: {result}");
    result
}

fn default_fallback_gas_price_gwei() -> u64 {
    let result = 20;
    tracing::info!("Using default FALLBACK_GAS_PRICE_GWEI: {result}");
    result
}

fn default_output_csv() -> PathBuf {
    let result = PathBuf::from("rwa_cost_comparison_simulated.csv");
    tracing::info!("Using default OUTPUT_CSV: {result:?}");
    result
}

impl ExperimentConfig {
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_sec)
    }

    pub fn deploy_timeout(&self) -> Duration {
        Duration::from_secs(self.deploy_timeout_sec)
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.polling_interval_ms)
    }

    pub fn run_delay(&self) -> Duration {
        Duration::from_millis(self.run_delay_ms)
    }
}

impl FromEnv for ExperimentConfig {
    fn from_env() -> anyhow::Result<Self> {
        let config: Self = envy_load("experiment", "")?;
        anyhow::ensure!(
            !config.batch_sizes.is_empty(),
            "BATCH_SIZES must contain at least one batch size"
        );
        Ok(config)
    }
}
