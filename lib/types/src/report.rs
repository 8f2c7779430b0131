//! Rows of the final comparison table.

use std::fmt;

use crate::{
    scenario::{ProjectedCost, ScenarioResult},
    units::to_display_f64,
    ResourcePrice,
};

/// Platform a result row is reported for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    BaseLayer,
    ScaledLayer { batch_size: u64 },
}

impl fmt::Display for Platform {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BaseLayer => formatter.write_str("base-layer"),
            Self::ScaledLayer { batch_size } => write!(formatter, "scaled-layer, batch={batch_size}"),
        }
    }
}

/// One line of the comparison table.
///
/// Decimal quantities are converted to `f64` here; this is the output boundary, so precision loss
/// is acceptable.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub scenario: String,
    pub platform: Platform,
    pub resource_units: f64,
    /// Fee in ether.
    pub fee: f64,
    pub fee_fiat: f64,
    pub external_fee_fiat: Option<f64>,
    pub notes: String,
}

impl ResultRow {
    pub fn base_layer(result: &ScenarioResult, unit_price: ResourcePrice) -> Self {
        Self {
            scenario: result.name.clone(),
            platform: Platform::BaseLayer,
            resource_units: to_display_f64(&result.avg_resource_units),
            fee: to_display_f64(&result.avg_fee),
            fee_fiat: to_display_f64(&result.avg_fee_fiat),
            external_fee_fiat: result.external_fee_fiat.as_ref().map(to_display_f64),
            notes: format!("L1 GasPrice: {unit_price}"),
        }
    }

    pub fn scaled_layer(scenario: &str, projection: &ProjectedCost) -> Self {
        Self {
            scenario: scenario.to_owned(),
            platform: Platform::ScaledLayer {
                batch_size: projection.batch_size,
            },
            resource_units: to_display_f64(&projection.simulated_resource_units),
            fee: to_display_f64(&projection.fee),
            fee_fiat: to_display_f64(&projection.fee_fiat),
            external_fee_fiat: projection.external_fee_fiat.as_ref().map(to_display_f64),
            notes: format!("BS={}", projection.batch_size),
        }
    }
}
