use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use rollsim_types::{ethabi::Token, Address, ExecutionOutcome, ResourcePrice, U256};

use crate::{Call, ContractArtifact, ExecutionClient};

/// Gas used by calls without a configured gas amount.
const DEFAULT_GAS: u64 = 21_000;

#[derive(Debug, Default)]
struct MockExecutionClientInner {
    executed_calls: Vec<Call>,
    deployed: Vec<String>,
    scripted_outcomes: HashMap<String, VecDeque<ExecutionOutcome>>,
}

/// Builder for [`MockExecutionClient`].
#[derive(Debug)]
pub struct MockExecutionClientBuilder {
    unit_price: Option<ResourcePrice>,
    accounts: Vec<Address>,
    gas: HashMap<String, u64>,
    scripted_outcomes: HashMap<String, VecDeque<ExecutionOutcome>>,
}

impl Default for MockExecutionClientBuilder {
    fn default() -> Self {
        Self {
            unit_price: Some(ResourcePrice::from_gwei(20)),
            accounts: (1..=3).map(Address::from_low_u64_be).collect(),
            gas: HashMap::new(),
            scripted_outcomes: HashMap::new(),
        }
    }
}

impl MockExecutionClientBuilder {
    pub fn with_unit_price(mut self, price: ResourcePrice) -> Self {
        self.unit_price = Some(price);
        self
    }

    /// Makes [`ExecutionClient::unit_price()`] fail.
    pub fn with_unavailable_unit_price(mut self) -> Self {
        self.unit_price = None;
        self
    }

    pub fn with_accounts(mut self, accounts: Vec<Address>) -> Self {
        self.accounts = accounts;
        self
    }

    /// Sets the gas used by successful calls of `function`.
    pub fn with_gas(mut self, function: &str, gas: u64) -> Self {
        self.gas.insert(function.to_owned(), gas);
        self
    }

    /// Scripts outcomes of the consecutive calls of `function`. Once the script is exhausted,
    /// calls succeed using the configured gas.
    pub fn with_outcomes(
        mut self,
        function: &str,
        outcomes: impl IntoIterator<Item = ExecutionOutcome>,
    ) -> Self {
        self.scripted_outcomes
            .entry(function.to_owned())
            .or_default()
            .extend(outcomes);
        self
    }

    pub fn build(self) -> MockExecutionClient {
        MockExecutionClient {
            unit_price: self.unit_price,
            accounts: self.accounts,
            gas: self.gas,
            inner: Arc::new(Mutex::new(MockExecutionClientInner {
                scripted_outcomes: self.scripted_outcomes,
                ..MockExecutionClientInner::default()
            })),
        }
    }
}

/// In-memory [`ExecutionClient`]. Successful calls are billed `gas * unit_price`.
#[derive(Debug, Clone)]
pub struct MockExecutionClient {
    unit_price: Option<ResourcePrice>,
    accounts: Vec<Address>,
    gas: HashMap<String, u64>,
    inner: Arc<Mutex<MockExecutionClientInner>>,
}

impl Default for MockExecutionClient {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl MockExecutionClient {
    pub fn builder() -> MockExecutionClientBuilder {
        MockExecutionClientBuilder::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockExecutionClientInner> {
        self.inner.lock().expect("mock client poisoned")
    }

    /// Returns all calls submitted so far, in submission order.
    pub fn executed_calls(&self) -> Vec<Call> {
        self.lock().executed_calls.clone()
    }

    /// Returns the names of deployed contracts, in deployment order.
    pub fn deployed_contracts(&self) -> Vec<String> {
        self.lock().deployed.clone()
    }

    fn default_outcome(&self, function: &str) -> ExecutionOutcome {
        let gas = self.gas.get(function).copied().unwrap_or(DEFAULT_GAS);
        let unit_price = self.unit_price.unwrap_or(ResourcePrice::from_wei(0));
        ExecutionOutcome::Succeeded {
            resource_units: gas,
            fee_wei: U256::from(gas) * U256::from(unit_price.wei()),
        }
    }
}

#[async_trait]
impl ExecutionClient for MockExecutionClient {
    async fn accounts(&self) -> anyhow::Result<Vec<Address>> {
        Ok(self.accounts.clone())
    }

    async fn unit_price(&self) -> anyhow::Result<ResourcePrice> {
        self.unit_price
            .ok_or_else(|| anyhow::anyhow!("gas price is unavailable"))
    }

    async fn execute(&self, call: &Call) -> ExecutionOutcome {
        let function = &call.invocation.function;
        let mut inner = self.lock();
        inner.executed_calls.push(call.clone());
        let scripted = inner
            .scripted_outcomes
            .get_mut(function)
            .and_then(VecDeque::pop_front);
        drop(inner);
        scripted.unwrap_or_else(|| self.default_outcome(function))
    }

    async fn deploy(
        &self,
        artifact: &ContractArtifact,
        constructor_args: &[Token],
        _from: Address,
    ) -> anyhow::Result<Address> {
        artifact.deployment_data(constructor_args)?;
        let mut inner = self.lock();
        inner.deployed.push(artifact.name.clone());
        let index = inner.deployed.len() as u64;
        Ok(Address::from_low_u64_be(0x1000 + index))
    }
}
