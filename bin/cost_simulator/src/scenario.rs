use std::fmt;

use bigdecimal::BigDecimal;
use rollsim_eth_client::{Call, Invocation};
use rollsim_types::{Address, U256};

/// Produces the invocation for the given repetition index. Returns `None` if the underlying
/// resource is unavailable, which stops the remaining repetitions.
pub type ActionFactory = Box<dyn Fn(usize) -> Option<Invocation> + Send + Sync>;

/// Named operation measured by the experiment.
pub struct Scenario {
    pub name: String,
    /// Calls executed once before the repetitions, in order.
    pub setup: Vec<Call>,
    pub action: ActionFactory,
    /// Account submitting the action.
    pub account: Address,
    /// Value attached to every action call.
    pub value: U256,
    /// Flat fee of an external service charged per action, in fiat.
    pub external_fee_fiat: Option<BigDecimal>,
    pub repetitions: usize,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Scenario")
            .field("name", &self.name)
            .field("setup", &self.setup)
            .field("account", &self.account)
            .field("value", &self.value)
            .field("external_fee_fiat", &self.external_fee_fiat)
            .field("repetitions", &self.repetitions)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        account: Address,
        repetitions: usize,
        action: impl Fn(usize) -> Option<Invocation> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            setup: Vec::new(),
            action: Box::new(action),
            account,
            value: U256::zero(),
            external_fee_fiat: None,
            repetitions,
        }
    }

    pub fn with_setup(mut self, setup: Vec<Call>) -> Self {
        self.setup = setup;
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_external_fee(mut self, fee_fiat: BigDecimal) -> Self {
        self.external_fee_fiat = Some(fee_fiat);
        self
    }

    pub(crate) fn action_call(&self, repetition: usize) -> Option<Call> {
        let invocation = (self.action)(repetition)?;
        Some(Call::new(invocation, self.account).with_value(self.value))
    }
}
