//! Execution client for the base layer.
//!
//! The cost simulation only needs a handful of operations from the chain: listing the available
//! accounts, sampling the gas price, deploying contracts and submitting calls. They are described by
//! the [`ExecutionClient`] trait; [`clients`] contains a JSON-RPC implementation and a mock
//! for tests.

use std::fmt;

use async_trait::async_trait;
use rollsim_types::{Address, ExecutionOutcome, ResourcePrice, U256};

pub use crate::contracts::{load_compiled_contract, ArtifactError, ContractArtifact, ContractHandle};

pub mod clients;
mod contracts;

/// Encoded call of a contract function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub target: Address,
    /// Name of the called function; used for logging and by the mock client.
    pub function: String,
    pub calldata: Vec<u8>,
}

/// Invocation submitted on behalf of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub invocation: Invocation,
    pub from: Address,
    /// Value in wei attached to the call.
    pub value: U256,
}

impl Call {
    pub fn new(invocation: Invocation, from: Address) -> Self {
        Self {
            invocation,
            from,
            value: U256::zero(),
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// Operations of the base layer required by the simulation.
#[async_trait]
pub trait ExecutionClient: 'static + fmt::Debug + Send + Sync {
    /// Returns accounts that can be used as senders.
    async fn accounts(&self) -> anyhow::Result<Vec<Address>>;

    /// Returns the current gas price of the base layer.
    async fn unit_price(&self) -> anyhow::Result<ResourcePrice>;

    /// Submits the call and waits (with a bounded timeout) for it to be executed.
    ///
    /// Reverts, timeouts and transport errors are reported as [`ExecutionOutcome::Failed`].
    async fn execute(&self, call: &Call) -> ExecutionOutcome;

    /// Deploys the contract and returns its address.
    async fn deploy(
        &self,
        artifact: &ContractArtifact,
        constructor_args: &[rollsim_types::ethabi::Token],
        from: Address,
    ) -> anyhow::Result<Address>;
}
