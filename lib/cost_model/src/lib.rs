//! Analytical cost model of a batched scaled layer.
//!
//! Converts the gas an operation consumed on the base layer into the fee the same operation would
//! cost on a scaled layer that executes transactions off-chain and submits them to the base layer
//! in batches. All intermediate values are exact decimals; conversion to floating point only
//! happens when results are rendered.

use std::str::FromStr;

use anyhow::Context as _;
use bigdecimal::{num_bigint::BigInt, BigDecimal, RoundingMode};
use rollsim_config::CostModelConfig;
use rollsim_types::{units::wei_to_ether, ResourcePrice};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CostModelError {
    #[error("batch size must be at least 1, got {0}")]
    InvalidBatchSize(i64),
    #[error("base-layer gas must be positive, got {0}")]
    NonPositiveGas(BigDecimal),
}

/// Exact-decimal view of [`CostModelConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostModelParams {
    pub efficiency_factor: BigDecimal,
    pub scaled_price_ratio: BigDecimal,
    /// Fixed fee of every scaled-layer transaction, in ether.
    pub fixed_tx_fee: BigDecimal,
    pub base_submission_units: BigDecimal,
    pub per_tx_data_units: BigDecimal,
    pub fiat_price_per_eth: BigDecimal,
}

impl Default for CostModelParams {
    fn default() -> Self {
        Self {
            efficiency_factor: BigDecimal::new(BigInt::from(1), 1),
            scaled_price_ratio: BigDecimal::new(BigInt::from(1), 1),
            fixed_tx_fee: BigDecimal::new(BigInt::from(1), 5),
            base_submission_units: BigDecimal::from(41_000),
            per_tx_data_units: BigDecimal::from(200),
            fiat_price_per_eth: BigDecimal::from(2_000),
        }
    }
}

impl TryFrom<&CostModelConfig> for CostModelParams {
    type Error = anyhow::Error;

    fn try_from(config: &CostModelConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            efficiency_factor: exact_decimal(config.efficiency_factor)
                .context("efficiency_factor")?,
            scaled_price_ratio: exact_decimal(config.scaled_price_ratio)
                .context("scaled_price_ratio")?,
            fixed_tx_fee: exact_decimal(config.fixed_tx_fee_eth).context("fixed_tx_fee_eth")?,
            base_submission_units: BigDecimal::from(config.base_submission_units),
            per_tx_data_units: BigDecimal::from(config.per_tx_data_units),
            fiat_price_per_eth: exact_decimal(config.fiat_price_per_eth)
                .context("fiat_price_per_eth")?,
        })
    }
}

/// Converts a float through its shortest decimal representation, so that `0.1` becomes exactly `0.1`
/// rather than the closest binary fraction.
pub fn exact_decimal(value: f64) -> anyhow::Result<BigDecimal> {
    anyhow::ensure!(value.is_finite(), "value is not finite: {value}");
    Ok(BigDecimal::from_str(&value.to_string())?)
}

/// Checks that a batch contains at least one transaction and returns its size.
pub fn validate_batch_size(batch_size: i64) -> Result<u64, CostModelError> {
    u64::try_from(batch_size)
        .ok()
        .filter(|&size| size >= 1)
        .ok_or(CostModelError::InvalidBatchSize(batch_size))
}

/// Output of the cost model for a single operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    /// Gas the operation consumes inside the scaled layer.
    pub simulated_resource_units: BigDecimal,
    /// Total projected fee in ether.
    pub fee: BigDecimal,
    pub fee_fiat: BigDecimal,
}

/// Projects the scaled-layer cost of an operation that consumed `base_layer_gas` on the base layer,
/// provided it is submitted in a batch of `batch_size` transactions.
///
/// The fee consists of:
///
/// - the fixed per-transaction fee;
/// - the fee for the operation's own execution: the scaled-layer gas (a fraction of the base-layer gas)
///   priced at a fraction of the base-layer gas price, rounded to whole wei;
/// - the share of the batch submission: the submission gas of the whole batch divided by its size,
///   floored to whole gas units and priced at the base-layer gas price.
pub fn project(
    params: &CostModelParams,
    base_layer_gas: &BigDecimal,
    batch_size: i64,
    base_unit_price: ResourcePrice,
) -> Result<Projection, CostModelError> {
    let batch_size_units = validate_batch_size(batch_size)?;
    if *base_layer_gas <= BigDecimal::from(0) {
        return Err(CostModelError::NonPositiveGas(base_layer_gas.clone()));
    }
    let unit_price_wei = base_unit_price.to_decimal_wei();

    let simulated_resource_units = base_layer_gas * &params.efficiency_factor;
    let scaled_unit_price_wei = &unit_price_wei * &params.scaled_price_ratio;
    let internal_op_fee_wei = (&simulated_resource_units * &scaled_unit_price_wei)
        .with_scale_round(0, RoundingMode::HalfEven);
    let internal_op_fee = wei_to_ether(internal_op_fee_wei.into_bigint_and_exponent().0);
    let tx_fee = &params.fixed_tx_fee + internal_op_fee;

    let batch_size = BigDecimal::from(batch_size_units);
    let batch_submission_units =
        &params.base_submission_units + &params.per_tx_data_units * &batch_size;
    let amortized_units =
        (batch_submission_units / &batch_size).with_scale_round(0, RoundingMode::Floor);
    let amortized_fee_wei = (amortized_units * &unit_price_wei).with_scale_round(0, RoundingMode::Floor);
    let amortized_fee = wei_to_ether(amortized_fee_wei.into_bigint_and_exponent().0);

    let fee = tx_fee + amortized_fee;
    let fee_fiat = &fee * &params.fiat_price_per_eth;
    tracing::trace!(
        %base_layer_gas,
        batch_size = batch_size_units,
        %simulated_resource_units,
        %fee,
        "Projected scaled-layer cost"
    );

    Ok(Projection {
        simulated_resource_units,
        fee,
        fee_fiat,
    })
}
