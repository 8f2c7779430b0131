use bigdecimal::BigDecimal;

/// Base-layer summary over the successful runs of one scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioResult {
    pub name: String,
    /// Always positive: scenarios without successful runs produce no result.
    pub successful_runs: usize,
    pub avg_resource_units: BigDecimal,
    /// Average fee in ether.
    pub avg_fee: BigDecimal,
    pub avg_fee_fiat: BigDecimal,
    /// Flat fee of an external service (e.g. an oracle) in fiat. Reported as-is, never averaged
    /// and not included into `avg_fee_fiat`.
    pub external_fee_fiat: Option<BigDecimal>,
}

/// Cost projected for the scaled layer for a single batch size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedCost {
    pub batch_size: u64,
    pub simulated_resource_units: BigDecimal,
    /// Projected fee in ether.
    pub fee: BigDecimal,
    pub fee_fiat: BigDecimal,
    pub external_fee_fiat: Option<BigDecimal>,
}

/// Scenario result together with its projections, in the configured batch size order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedScenario {
    pub result: ScenarioResult,
    pub projections: Vec<ProjectedCost>,
}
