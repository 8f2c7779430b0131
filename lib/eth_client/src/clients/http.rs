use std::{fmt, time::Duration};

use anyhow::Context as _;
use async_trait::async_trait;
use rollsim_config::ExperimentConfig;
use rollsim_types::{
    ethabi::Token,
    web3::{
        self,
        transports::Http,
        types::{TransactionId, TransactionReceipt, TransactionRequest},
        Transport, Web3,
    },
    Address, Bytes, ExecutionOutcome, ResourcePrice, H256, U256, U64,
};
use tokio::time::{sleep, timeout};

use crate::{Call, ContractArtifact, ExecutionClient};

/// [`ExecutionClient`] talking to a base-layer node over JSON-RPC.
///
/// Transactions are sent via `eth_sendTransaction`, so the node must manage unlocked accounts.
#[derive(Clone)]
pub struct HttpExecutionClient<T: Transport = Http> {
    web3: Web3<T>,
    confirmation_timeout: Duration,
    deploy_timeout: Duration,
    polling_interval: Duration,
    fallback_unit_price: ResourcePrice,
}

impl<T: Transport> fmt::Debug for HttpExecutionClient<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpExecutionClient")
            .field("confirmation_timeout", &self.confirmation_timeout)
            .field("deploy_timeout", &self.deploy_timeout)
            .field("polling_interval", &self.polling_interval)
            .field("fallback_unit_price", &self.fallback_unit_price)
            .finish_non_exhaustive()
    }
}

impl HttpExecutionClient {
    pub fn from_config(config: &ExperimentConfig) -> anyhow::Result<Self> {
        let transport = Http::new(&config.l1_rpc_address)
            .with_context(|| format!("invalid L1 RPC address: {}", config.l1_rpc_address))?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> HttpExecutionClient<T> {
    pub fn with_transport(transport: T, config: &ExperimentConfig) -> Self {
        Self {
            web3: Web3::new(transport),
            confirmation_timeout: config.confirmation_timeout(),
            deploy_timeout: config.deploy_timeout(),
            polling_interval: config.polling_interval(),
            fallback_unit_price: ResourcePrice::from_gwei(config.fallback_gas_price_gwei),
        }
    }

    /// Checks that the node is reachable. Returns the chain ID reported by the node.
    pub async fn check_connection(&self) -> anyhow::Result<U256> {
        let chain_id = self
            .web3
            .eth()
            .chain_id()
            .await
            .context("failed connecting to the L1 node")?;
        tracing::info!("Connected to L1 node, chain ID: {chain_id}");
        Ok(chain_id)
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: H256,
        max_wait: Duration,
    ) -> anyhow::Result<TransactionReceipt> {
        let poll = async {
            loop {
                if let Some(receipt) = self.web3.eth().transaction_receipt(tx_hash).await? {
                    return Ok::<_, web3::Error>(receipt);
                }
                sleep(self.polling_interval).await;
            }
        };
        timeout(max_wait, poll)
            .await
            .with_context(|| format!("transaction {tx_hash:?} was not confirmed in {max_wait:?}"))?
            .with_context(|| format!("failed getting receipt for {tx_hash:?}"))
    }

    /// Determines the price paid by the transaction. Nodes that predate EIP-1559 don't report
    /// the effective gas price in receipts, so the transaction itself is queried as a fallback.
    async fn paid_unit_price(&self, receipt: &TransactionReceipt) -> anyhow::Result<U256> {
        if let Some(price) = receipt.effective_gas_price {
            return Ok(price);
        }
        let tx = self
            .web3
            .eth()
            .transaction(TransactionId::Hash(receipt.transaction_hash))
            .await?;
        if let Some(price) = tx.and_then(|tx| tx.gas_price) {
            return Ok(price);
        }
        tracing::warn!(
            "Gas price of {:?} is unknown, using fallback {}",
            receipt.transaction_hash,
            self.fallback_unit_price
        );
        Ok(self.fallback_unit_price.wei().into())
    }

    async fn try_execute(&self, call: &Call) -> anyhow::Result<ExecutionOutcome> {
        let request = TransactionRequest {
            from: call.from,
            to: Some(call.invocation.target),
            value: Some(call.value),
            data: Some(Bytes(call.invocation.calldata.clone())),
            ..TransactionRequest::default()
        };
        let tx_hash = self
            .web3
            .eth()
            .send_transaction(request)
            .await
            .context("failed sending transaction")?;
        tracing::debug!("Sent `{}` as {tx_hash:?}", call.invocation.function);

        let receipt = self
            .wait_for_receipt(tx_hash, self.confirmation_timeout)
            .await?;
        if receipt.status == Some(U64::zero()) {
            tracing::warn!("Call `{}` ({tx_hash:?}) reverted", call.invocation.function);
            return Ok(ExecutionOutcome::failed("transaction reverted"));
        }
        let gas_used = receipt
            .gas_used
            .with_context(|| format!("receipt for {tx_hash:?} has no gas used"))?;
        anyhow::ensure!(
            gas_used <= U256::from(u64::MAX),
            "gas used by {tx_hash:?} is out of range: {gas_used}"
        );
        let unit_price = self.paid_unit_price(&receipt).await?;
        let fee_wei = gas_used
            .checked_mul(unit_price)
            .with_context(|| format!("fee of {tx_hash:?} overflows"))?;

        Ok(ExecutionOutcome::Succeeded {
            resource_units: gas_used.as_u64(),
            fee_wei,
        })
    }
}

#[async_trait]
impl<T> ExecutionClient for HttpExecutionClient<T>
where
    T: Transport + Send + Sync + 'static,
    T::Out: Send,
{
    async fn accounts(&self) -> anyhow::Result<Vec<Address>> {
        self.web3
            .eth()
            .accounts()
            .await
            .context("failed fetching accounts")
    }

    async fn unit_price(&self) -> anyhow::Result<ResourcePrice> {
        let price = self
            .web3
            .eth()
            .gas_price()
            .await
            .context("failed fetching gas price")?;
        anyhow::ensure!(
            price <= U256::from(u64::MAX),
            "gas price is out of range: {price}"
        );
        Ok(ResourcePrice::from_wei(price.as_u64()))
    }

    async fn execute(&self, call: &Call) -> ExecutionOutcome {
        match self.try_execute(call).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!("Call `{}` failed: {err:#}", call.invocation.function);
                ExecutionOutcome::failed(format!("{err:#}"))
            }
        }
    }

    async fn deploy(
        &self,
        artifact: &ContractArtifact,
        constructor_args: &[Token],
        from: Address,
    ) -> anyhow::Result<Address> {
        let request = TransactionRequest {
            from,
            data: Some(Bytes(artifact.deployment_data(constructor_args)?)),
            ..TransactionRequest::default()
        };
        let tx_hash = self
            .web3
            .eth()
            .send_transaction(request)
            .await
            .with_context(|| format!("failed sending deployment of {}", artifact.name))?;
        let receipt = self.wait_for_receipt(tx_hash, self.deploy_timeout).await?;
        anyhow::ensure!(
            receipt.status != Some(U64::zero()),
            "deployment of {} reverted",
            artifact.name
        );
        let address = receipt
            .contract_address
            .with_context(|| format!("deployment receipt of {} has no contract address", artifact.name))?;
        tracing::info!("{} deployed at {address:?}", artifact.name);
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::{HashMap, VecDeque},
        future::{ready, Ready},
        path::PathBuf,
        sync::{Arc, Mutex},
    };

    use assert_matches::assert_matches;
    use jsonrpc_core::{Call as RpcCall, Value};
    use rollsim_types::web3::{
        error::TransportError, helpers::build_request, types::Transaction, RequestId,
    };

    use super::*;
    use crate::{contracts::tests::token_artifact, Invocation};

    fn tx_hash() -> H256 {
        H256::repeat_byte(0x42)
    }

    /// Transport answering every method with scripted responses. The last response of a method
    /// is repeated once the preceding ones are consumed.
    #[derive(Debug, Clone, Default)]
    struct ScriptedTransport {
        responses: Arc<Mutex<HashMap<&'static str, VecDeque<Value>>>>,
        methods: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedTransport {
        fn respond(self, method: &'static str, response: Value) -> Self {
            self.responses
                .lock()
                .unwrap()
                .entry(method)
                .or_default()
                .push_back(response);
            self
        }

        fn requested_methods(&self) -> Vec<String> {
            self.methods.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        type Out = Ready<web3::Result<Value>>;

        fn prepare(&self, method: &str, params: Vec<Value>) -> (RequestId, RpcCall) {
            let mut methods = self.methods.lock().unwrap();
            methods.push(method.to_owned());
            let id = methods.len();
            (id, build_request(id, method, params))
        }

        fn send(&self, _id: RequestId, request: RpcCall) -> Self::Out {
            let RpcCall::MethodCall(call) = request else {
                unreachable!("only method calls are sent");
            };
            let mut responses = self.responses.lock().unwrap();
            let response = responses
                .get_mut(call.method.as_str())
                .and_then(|queue| {
                    if queue.len() > 1 {
                        queue.pop_front()
                    } else {
                        queue.front().cloned()
                    }
                })
                .ok_or_else(|| {
                    web3::Error::Transport(TransportError::Message(format!(
                        "`{}` is not scripted",
                        call.method
                    )))
                });
            ready(response)
        }
    }

    fn test_config() -> ExperimentConfig {
        ExperimentConfig {
            l1_rpc_address: "http://127.0.0.1:8545".into(),
            artifacts_dir: PathBuf::from("build/contracts"),
            runs_per_scenario: 3,
            batch_sizes: vec![10, 50],
            oracle_service_fee_usd: 0.1,
            confirmation_timeout_sec: 120,
            deploy_timeout_sec: 180,
            polling_interval_ms: 200,
            run_delay_ms: 0,
            fallback_gas_price_gwei: 7,
            output_csv: PathBuf::from("out.csv"),
        }
    }

    fn client(transport: &ScriptedTransport) -> HttpExecutionClient<ScriptedTransport> {
        let mut client = HttpExecutionClient::with_transport(transport.clone(), &test_config());
        client.confirmation_timeout = Duration::from_millis(100);
        client.deploy_timeout = Duration::from_millis(100);
        client.polling_interval = Duration::from_millis(5);
        client
    }

    fn json<S: serde::Serialize>(value: S) -> Value {
        serde_json::to_value(value).unwrap()
    }

    fn receipt(status: u64, gas_used: u64, effective_gas_price: Option<u64>) -> Value {
        json(TransactionReceipt {
            transaction_hash: tx_hash(),
            status: Some(U64::from(status)),
            gas_used: Some(U256::from(gas_used)),
            effective_gas_price: effective_gas_price.map(U256::from),
            ..TransactionReceipt::default()
        })
    }

    fn transfer_call() -> Call {
        let invocation = Invocation {
            target: Address::repeat_byte(0xaa),
            function: "transfer".into(),
            calldata: vec![1, 2, 3],
        };
        Call::new(invocation, Address::repeat_byte(1))
    }

    fn sent_transaction(transport: ScriptedTransport) -> ScriptedTransport {
        transport.respond("eth_sendTransaction", json(tx_hash()))
    }

    #[tokio::test]
    async fn fee_uses_effective_gas_price() {
        let transport = sent_transaction(ScriptedTransport::default())
            .respond("eth_getTransactionReceipt", receipt(1, 21_000, Some(1_000_000_000)));

        let outcome = client(&transport).execute(&transfer_call()).await;
        assert_eq!(
            outcome,
            ExecutionOutcome::Succeeded {
                resource_units: 21_000,
                fee_wei: U256::from(21_000_000_000_000_u64),
            }
        );
        assert!(!transport
            .requested_methods()
            .contains(&"eth_getTransactionByHash".to_owned()));
    }

    #[tokio::test]
    async fn receipt_is_polled_until_available() {
        let transport = sent_transaction(ScriptedTransport::default())
            .respond("eth_getTransactionReceipt", Value::Null)
            .respond("eth_getTransactionReceipt", Value::Null)
            .respond("eth_getTransactionReceipt", receipt(1, 50_000, Some(2)));

        let outcome = client(&transport).execute(&transfer_call()).await;
        assert_matches!(outcome, ExecutionOutcome::Succeeded { resource_units: 50_000, .. });
        let polls = transport
            .requested_methods()
            .iter()
            .filter(|method| *method == "eth_getTransactionReceipt")
            .count();
        assert_eq!(polls, 3);
    }

    #[tokio::test]
    async fn fee_falls_back_to_transaction_gas_price() {
        let transaction = Transaction {
            hash: tx_hash(),
            gas_price: Some(U256::from(3_u64)),
            ..Transaction::default()
        };
        let transport = sent_transaction(ScriptedTransport::default())
            .respond("eth_getTransactionReceipt", receipt(1, 100, None))
            .respond("eth_getTransactionByHash", json(transaction));

        let outcome = client(&transport).execute(&transfer_call()).await;
        assert_eq!(
            outcome,
            ExecutionOutcome::Succeeded {
                resource_units: 100,
                fee_wei: U256::from(300_u64),
            }
        );
    }

    #[tokio::test]
    async fn fee_falls_back_to_configured_gas_price() {
        let transport = sent_transaction(ScriptedTransport::default())
            .respond("eth_getTransactionReceipt", receipt(1, 100, None))
            .respond("eth_getTransactionByHash", Value::Null);

        let outcome = client(&transport).execute(&transfer_call()).await;
        assert_eq!(
            outcome,
            ExecutionOutcome::Succeeded {
                resource_units: 100,
                fee_wei: U256::from(700_000_000_000_u64),
            }
        );
    }

    #[tokio::test]
    async fn reverted_transaction_is_failed_run() {
        let transport = sent_transaction(ScriptedTransport::default())
            .respond("eth_getTransactionReceipt", receipt(0, 30_000, Some(1)));

        let outcome = client(&transport).execute(&transfer_call()).await;
        assert_eq!(outcome, ExecutionOutcome::failed("transaction reverted"));
    }

    #[tokio::test]
    async fn unconfirmed_transaction_is_failed_run() {
        let transport = sent_transaction(ScriptedTransport::default())
            .respond("eth_getTransactionReceipt", Value::Null);

        let outcome = client(&transport).execute(&transfer_call()).await;
        assert_matches!(
            outcome,
            ExecutionOutcome::Failed { reason } if reason.contains("was not confirmed")
        );
    }

    #[tokio::test]
    async fn transport_error_is_failed_run() {
        let transport = ScriptedTransport::default();

        let outcome = client(&transport).execute(&transfer_call()).await;
        assert_matches!(
            outcome,
            ExecutionOutcome::Failed { reason } if reason.contains("failed sending transaction")
        );
    }

    #[tokio::test]
    async fn unit_price_and_accounts() {
        let accounts = vec![Address::repeat_byte(1), Address::repeat_byte(2)];
        let transport = ScriptedTransport::default()
            .respond("eth_gasPrice", json(U256::from(20_000_000_000_u64)))
            .respond("eth_accounts", json(&accounts));
        let client = client(&transport);

        assert_eq!(
            client.unit_price().await.unwrap(),
            ResourcePrice::from_gwei(20)
        );
        assert_eq!(client.accounts().await.unwrap(), accounts);
    }

    #[tokio::test]
    async fn unavailable_unit_price_is_error() {
        let transport = ScriptedTransport::default();
        client(&transport).unit_price().await.unwrap_err();
    }

    #[tokio::test]
    async fn deployment_returns_contract_address() {
        let contract_address = Address::repeat_byte(0xcc);
        let deployed = TransactionReceipt {
            transaction_hash: tx_hash(),
            status: Some(U64::from(1_u64)),
            contract_address: Some(contract_address),
            ..TransactionReceipt::default()
        };
        let transport = sent_transaction(ScriptedTransport::default())
            .respond("eth_getTransactionReceipt", json(deployed));

        let address = client(&transport)
            .deploy(&token_artifact(), &[Token::Uint(U256::from(1_000_u64))], Address::zero())
            .await
            .unwrap();
        assert_eq!(address, contract_address);
    }

    #[tokio::test]
    async fn deployment_without_contract_address_is_error() {
        let transport = sent_transaction(ScriptedTransport::default())
            .respond("eth_getTransactionReceipt", receipt(1, 500_000, Some(1)));

        let err = client(&transport)
            .deploy(&token_artifact(), &[Token::Uint(U256::from(1_000_u64))], Address::zero())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("no contract address"), "{err:#}");
    }

    #[tokio::test]
    async fn reverted_deployment_is_error() {
        let transport = sent_transaction(ScriptedTransport::default())
            .respond("eth_getTransactionReceipt", receipt(0, 500_000, Some(1)));

        let err = client(&transport)
            .deploy(&token_artifact(), &[Token::Uint(U256::from(1_000_u64))], Address::zero())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("reverted"), "{err:#}");
    }
}
