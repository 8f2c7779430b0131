//! Outcomes of the calls submitted to the base layer.

use bigdecimal::BigDecimal;

use crate::{units::u256_wei_to_ether, U256};

/// Result of a single call as reported by the execution collaborator.
///
/// Reverts, RPC failures and confirmation timeouts are all reported as `Failed`; the collaborator
/// never raises them as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Succeeded { resource_units: u64, fee_wei: U256 },
    Failed { reason: String },
}

impl ExecutionOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Measurements of a successful run. Fees are denominated in ether and in fiat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReceipt {
    pub resource_units: u64,
    pub fee: BigDecimal,
    pub fee_fiat: BigDecimal,
}

/// Result of one repetition of a scenario action.
///
/// Resource units and fees only exist for successful runs, so they live in [`RunReceipt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded(RunReceipt),
    Failed { reason: String },
}

impl RunOutcome {
    /// Converts the collaborator outcome, deriving the fiat fee from the ether fee.
    pub fn from_execution(outcome: ExecutionOutcome, fiat_price_per_eth: &BigDecimal) -> Self {
        match outcome {
            ExecutionOutcome::Succeeded {
                resource_units,
                fee_wei,
            } => {
                let fee = u256_wei_to_ether(fee_wei);
                let fee_fiat = &fee * fiat_price_per_eth;
                Self::Succeeded(RunReceipt {
                    resource_units,
                    fee,
                    fee_fiat,
                })
            }
            ExecutionOutcome::Failed { reason } => Self::Failed { reason },
        }
    }

    pub fn receipt(&self) -> Option<&RunReceipt> {
        match self {
            Self::Succeeded(receipt) => Some(receipt),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.receipt().is_some()
    }
}
