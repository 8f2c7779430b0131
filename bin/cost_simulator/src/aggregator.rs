use bigdecimal::BigDecimal;
use rollsim_cost_model::{project, CostModelError, CostModelParams};
use rollsim_types::{
    AggregatedScenario, ProjectedCost, ResourcePrice, RunOutcome, ScenarioResult,
};

/// Reduces run outcomes of a scenario to averages and projects them onto the scaled layer.
#[derive(Debug, Clone)]
pub struct TrialAggregator {
    params: CostModelParams,
    unit_price: ResourcePrice,
    batch_sizes: Vec<i64>,
}

impl TrialAggregator {
    pub fn new(params: CostModelParams, unit_price: ResourcePrice, batch_sizes: Vec<i64>) -> Self {
        Self {
            params,
            unit_price,
            batch_sizes,
        }
    }

    /// Returns `Ok(None)` if there are no successful outcomes. Errors are only returned
    /// for invalid batch sizes.
    pub fn aggregate(
        &self,
        name: &str,
        outcomes: &[RunOutcome],
        external_fee_fiat: Option<&BigDecimal>,
    ) -> Result<Option<AggregatedScenario>, CostModelError> {
        let receipts: Vec<_> = outcomes.iter().filter_map(RunOutcome::receipt).collect();
        if receipts.is_empty() {
            return Ok(None);
        }

        let count = BigDecimal::from(receipts.len() as u64);
        let mut total_units = BigDecimal::from(0);
        let mut total_fee = BigDecimal::from(0);
        let mut total_fee_fiat = BigDecimal::from(0);
        for receipt in &receipts {
            total_units += BigDecimal::from(receipt.resource_units);
            total_fee += &receipt.fee;
            total_fee_fiat += &receipt.fee_fiat;
        }
        let result = ScenarioResult {
            name: name.to_owned(),
            successful_runs: receipts.len(),
            avg_resource_units: total_units / &count,
            avg_fee: total_fee / &count,
            avg_fee_fiat: total_fee_fiat / &count,
            external_fee_fiat: external_fee_fiat.cloned(),
        };

        let projections = self
            .batch_sizes
            .iter()
            .map(|&batch_size| {
                let projection = project(
                    &self.params,
                    &result.avg_resource_units,
                    batch_size,
                    self.unit_price,
                )?;
                Ok(ProjectedCost {
                    // `project()` has validated the batch size
                    batch_size: batch_size as u64,
                    simulated_resource_units: projection.simulated_resource_units,
                    fee: projection.fee,
                    fee_fiat: projection.fee_fiat,
                    external_fee_fiat: result.external_fee_fiat.clone(),
                })
            })
            .collect::<Result<_, CostModelError>>()?;

        Ok(Some(AggregatedScenario {
            result,
            projections,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use assert_matches::assert_matches;
    use rollsim_types::RunReceipt;

    use super::*;

    fn decimal(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn ok(resource_units: u64, fee: &str) -> RunOutcome {
        let fee = decimal(fee);
        RunOutcome::Succeeded(RunReceipt {
            resource_units,
            fee_fiat: &fee * BigDecimal::from(2_000),
            fee,
        })
    }

    fn fail() -> RunOutcome {
        RunOutcome::Failed {
            reason: "reverted".into(),
        }
    }

    fn aggregator(batch_sizes: Vec<i64>) -> TrialAggregator {
        TrialAggregator::new(
            CostModelParams::default(),
            ResourcePrice::from_gwei(20),
            batch_sizes,
        )
    }

    #[test]
    fn averages_over_successful_runs() {
        let outcomes = [ok(100, "0.01"), fail(), ok(200, "0.02")];
        let aggregated = aggregator(vec![10, 50])
            .aggregate("Transfer", &outcomes, None)
            .unwrap()
            .unwrap();

        let result = &aggregated.result;
        assert_eq!(result.successful_runs, 2);
        assert_eq!(result.avg_resource_units, BigDecimal::from(150));
        assert_eq!(result.avg_fee, decimal("0.015"));
        assert_eq!(result.avg_fee_fiat, decimal("30"));

        let batch_sizes: Vec<_> = aggregated.projections.iter().map(|p| p.batch_size).collect();
        assert_eq!(batch_sizes, [10, 50]);
        for projected in &aggregated.projections {
            let expected = project(
                &CostModelParams::default(),
                &BigDecimal::from(150),
                projected.batch_size as i64,
                ResourcePrice::from_gwei(20),
            )
            .unwrap();
            assert_eq!(projected.simulated_resource_units, decimal("15"));
            assert_eq!(projected.fee, expected.fee);
        }
    }

    #[test]
    fn all_failures_produce_nothing() {
        let aggregator = aggregator(vec![10]);
        assert_eq!(aggregator.aggregate("Vote", &[fail(), fail()], None), Ok(None));
        assert_eq!(aggregator.aggregate("Vote", &[], None), Ok(None));
    }

    #[test]
    fn external_fee_is_carried_through() {
        let fee = decimal("0.1");
        let aggregated = aggregator(vec![10, 50])
            .aggregate("Oracle", &[ok(40_000, "0.0008"), ok(42_000, "0.00084")], Some(&fee))
            .unwrap()
            .unwrap();

        assert_eq!(aggregated.result.external_fee_fiat, Some(fee.clone()));
        assert_eq!(aggregated.result.avg_fee_fiat, decimal("1.64"));
        assert!(aggregated
            .projections
            .iter()
            .all(|projected| projected.external_fee_fiat.as_ref() == Some(&fee)));
    }

    #[test]
    fn invalid_batch_size_is_reported() {
        let err = aggregator(vec![10, 0])
            .aggregate("Transfer", &[ok(21_000, "0.00042")], None)
            .unwrap_err();
        assert_matches!(err, CostModelError::InvalidBatchSize(0));
    }
}
