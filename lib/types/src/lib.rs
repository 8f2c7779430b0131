//! The declaration of the types shared across the cost simulation.
//!
//! Primitive chain types are re-exported from the `web3` crate, so that every crate in the workspace
//! talks about the same `Address` and `U256`.

pub use web3;
pub use web3::ethabi;
pub use web3::types::{Address, Bytes, H256, U256, U64};

pub use crate::{
    outcome::{ExecutionOutcome, RunOutcome, RunReceipt},
    price::ResourcePrice,
    report::{Platform, ResultRow},
    scenario::{AggregatedScenario, ProjectedCost, ScenarioResult},
};

pub mod outcome;
pub mod price;
pub mod report;
pub mod scenario;
pub mod units;
