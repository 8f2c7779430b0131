use serde::Deserialize;

use crate::{envy_load, FromEnv};

/// Parameters of the scaled-layer cost model.
///
/// The values are modeling choices rather than physical constants; they only describe the shape
/// of the analytical projection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CostModelConfig {
    /// Fraction of the base-layer gas an operation consumes when executed on the scaled layer.
    #[serde(default = "CostModelConfig::default_efficiency_factor")]
    pub efficiency_factor: f64,
    /// Scaled-layer gas price as a fraction of the base-layer gas price.
    #[serde(default = "CostModelConfig::default_scaled_price_ratio")]
    pub scaled_price_ratio: f64,
    /// Minimum platform charge added to every scaled-layer transaction, in ether.
    #[serde(default = "CostModelConfig::default_fixed_tx_fee_eth")]
    pub fixed_tx_fee_eth: f64,
    /// Gas of a batch submission on the base layer regardless of its size:
    /// the base transaction cost plus the simulated data storage.
    #[serde(default = "CostModelConfig::default_base_submission_units")]
    pub base_submission_units: u64,
    /// Base-layer data gas for every transaction included into a batch.
    #[serde(default = "CostModelConfig::default_per_tx_data_units")]
    pub per_tx_data_units: u64,
    /// Fiat (USD) price of one ether.
    #[serde(default = "CostModelConfig::default_fiat_price_per_eth")]
    pub fiat_price_per_eth: f64,
}

impl CostModelConfig {
    fn default_efficiency_factor() -> f64 {
        let result = 0.1;
        tracing::info!("Using default COST_MODEL_EFFICIENCY_FACTOR: {result}");
        result
    }

    fn default_scaled_price_ratio() -> f64 {
        let result = 0.1;
        tracing::info!("Using default COST_MODEL_SCALED_PRICE_RATIO: {result}");
        result
    }

    fn default_fixed_tx_fee_eth() -> f64 {
        let result = 0.00001;
        tracing::info!("Using default COST_MODEL_FIXED_TX_FEE_ETH: {result}");
        result
    }

    fn default_base_submission_units() -> u64 {
        let result = 21_000 + 20_000;
        tracing::info!("Using default COST_MODEL_BASE_SUBMISSION_UNITS: {result}");
        result
    }

    fn default_per_tx_data_units() -> u64 {
        let result = 200;
        tracing::info!("Using default COST_MODEL_PER_TX_DATA_UNITS: {result}");
        result
    }

    fn default_fiat_price_per_eth() -> f64 {
        let result = 2_000.0;
        tracing::info!("Using default COST_MODEL_FIAT_PRICE_PER_ETH: {result}");
        result
    }
}

impl Default for CostModelConfig {
    fn default() -> Self {
        Self {
            efficiency_factor: 0.1,
            scaled_price_ratio: 0.1,
            fixed_tx_fee_eth: 0.00001,
            base_submission_units: 41_000,
            per_tx_data_units: 200,
            fiat_price_per_eth: 2_000.0,
        }
    }
}

impl FromEnv for CostModelConfig {
    fn from_env() -> anyhow::Result<Self> {
        let config: Self = envy_load("cost_model", "COST_MODEL_")?;
        anyhow::ensure!(
            config.efficiency_factor.is_finite() && config.efficiency_factor >= 0.0,
            "COST_MODEL_EFFICIENCY_FACTOR must be a non-negative number, got {}",
            config.efficiency_factor
        );
        anyhow::ensure!(
            config.fiat_price_per_eth.is_finite() && config.fiat_price_per_eth >= 0.0,
            "COST_MODEL_FIAT_PRICE_PER_ETH must be a non-negative number, got {}",
            config.fiat_price_per_eth
        );
        Ok(config)
    }
}
