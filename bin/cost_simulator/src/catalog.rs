//! RWA contracts and the scenarios measured against them.

use std::{
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context as _;
use bigdecimal::BigDecimal;
use rollsim_cost_model::exact_decimal;
use rollsim_eth_client::{
    load_compiled_contract, Call, ContractHandle, ExecutionClient, Invocation,
};
use rollsim_types::{ethabi::Token, Address, U256};

use crate::scenario::Scenario;

const ERC20_CONTRACT: &str = "MyERC20Token";
const ERC721_CONTRACT: &str = "MyERC721Token";
const ORACLE_CONTRACT: &str = "MockOracle";
const MANAGER_CONTRACT: &str = "RWAManager";
const DAO_CONTRACT: &str = "SimpleDAO";

const MAX_YIELD_HOLDERS: usize = 3;
const ORACLE_ASSET_ID: u64 = 12_345;
const ORACLE_BASE_VALUE: u64 = 50_000;

fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::exp10(18)
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

/// Accounts participating in the scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accounts {
    pub deployer: Address,
    pub user1: Address,
    pub user2: Address,
    /// Recipients of the yield distribution.
    pub holders: Vec<Address>,
}

impl Accounts {
    /// Assigns roles to the accounts managed by the node. Users fall back to the deployer
    /// if the node manages too few accounts.
    pub fn select(accounts: &[Address]) -> anyhow::Result<Self> {
        let (&deployer, rest) = accounts
            .split_first()
            .context("L1 node manages no accounts")?;
        let user1 = rest.first().copied().unwrap_or(deployer);
        let user2 = rest.get(1).copied().unwrap_or(deployer);
        let holders = rest
            .iter()
            .skip(2)
            .take(MAX_YIELD_HOLDERS)
            .copied()
            .collect();
        Ok(Self {
            deployer,
            user1,
            user2,
            holders,
        })
    }
}

/// Handles of the deployed RWA contracts.
#[derive(Debug, Clone)]
pub struct RwaContracts {
    pub erc20: ContractHandle,
    pub erc721: ContractHandle,
    pub oracle: ContractHandle,
    pub manager: ContractHandle,
    pub dao: ContractHandle,
}

impl RwaContracts {
    async fn deploy_contract(
        client: &dyn ExecutionClient,
        artifacts_dir: &Path,
        name: &str,
        args: &[Token],
        deployer: Address,
    ) -> anyhow::Result<ContractHandle> {
        let artifact = load_compiled_contract(artifacts_dir, name)?;
        let address = client
            .deploy(&artifact, args, deployer)
            .await
            .with_context(|| format!("failed deploying {name}"))?;
        Ok(ContractHandle::new(&artifact, address))
    }

    /// Deploys all contracts from the deployer account. Any failure is fatal for the experiment.
    pub async fn deploy(
        client: &dyn ExecutionClient,
        artifacts_dir: &Path,
        deployer: Address,
    ) -> anyhow::Result<Self> {
        let erc20 = Self::deploy_contract(
            client,
            artifacts_dir,
            ERC20_CONTRACT,
            &[
                Token::String("Test ERC20".into()),
                Token::String("T20".into()),
                Token::Uint(ether(1_000_000)),
                Token::Address(deployer),
            ],
            deployer,
        )
        .await?;
        let erc721 = Self::deploy_contract(
            client,
            artifacts_dir,
            ERC721_CONTRACT,
            &[
                Token::String("Test ERC721".into()),
                Token::String("T721".into()),
                Token::Address(deployer),
            ],
            deployer,
        )
        .await?;
        let oracle =
            Self::deploy_contract(client, artifacts_dir, ORACLE_CONTRACT, &[], deployer).await?;
        let token_args = [Token::Address(erc20.address()), Token::Address(deployer)];
        let manager =
            Self::deploy_contract(client, artifacts_dir, MANAGER_CONTRACT, &token_args, deployer)
                .await?;
        let dao =
            Self::deploy_contract(client, artifacts_dir, DAO_CONTRACT, &token_args, deployer)
                .await?;

        tracing::info!("All contracts deployed");
        Ok(Self {
            erc20,
            erc721,
            oracle,
            manager,
            dao,
        })
    }
}

/// Wraps encoding of an action; encoding errors make the action unavailable.
fn action(
    contract: ContractHandle,
    function: &'static str,
    args: impl Fn(usize) -> Vec<Token> + Send + Sync + 'static,
) -> impl Fn(usize) -> Option<Invocation> + Send + Sync + 'static {
    move |repetition| match contract.invocation(function, &args(repetition)) {
        Ok(invocation) => Some(invocation),
        Err(err) => {
            tracing::error!("Cannot encode `{function}` for run #{repetition}: {err:#}");
            None
        }
    }
}

/// Converts the configured oracle service fee. A fee that is not positive is not reported.
pub fn oracle_service_fee(fee_usd: f64) -> anyhow::Result<Option<BigDecimal>> {
    let fee = exact_decimal(fee_usd).context("invalid oracle service fee")?;
    Ok((fee > BigDecimal::from(0)).then_some(fee))
}

/// Builds the measured scenarios, in reporting order.
pub fn rwa_scenarios(
    contracts: &RwaContracts,
    accounts: &Accounts,
    runs: usize,
    oracle_fee_usd: Option<BigDecimal>,
) -> anyhow::Result<Vec<Scenario>> {
    let deployer = accounts.deployer;
    let runs_u64 = runs as u64;

    let user1 = accounts.user1;
    let token_id_base = unix_timestamp() * 1_000;
    let issuance = Scenario::new(
        "RWA Token Issuance (ERC-721)",
        deployer,
        runs,
        action(contracts.erc721.clone(), "mint", move |repetition| {
            let token_id = token_id_base + repetition as u64;
            vec![Token::Address(user1), Token::Uint(token_id.into())]
        }),
    );

    let funding = contracts.erc20.invocation(
        "transfer",
        &[Token::Address(user1), Token::Uint(ether(100) * U256::from(runs_u64))],
    )?;
    let user2 = accounts.user2;
    let transfer = Scenario::new(
        "RWA Token Transfer (ERC-20)",
        user1,
        runs,
        action(contracts.erc20.clone(), "transfer", move |_| {
            vec![Token::Address(user2), Token::Uint(ether(50))]
        }),
    )
    .with_setup(vec![Call::new(funding, deployer)]);

    let mut yield_setup = vec![
        contracts.erc20.invocation(
            "approve",
            &[
                Token::Address(contracts.manager.address()),
                Token::Uint(ether(1_000)),
            ],
        )?,
        contracts
            .manager
            .invocation("depositRewardTokens", &[Token::Uint(ether(1_000))])?,
    ];
    for &holder in &accounts.holders {
        yield_setup.push(contracts.erc20.invocation(
            "transfer",
            &[Token::Address(holder), Token::Uint(U256::exp10(12))],
        )?);
    }
    let holders: Vec<_> = accounts.holders.iter().copied().map(Token::Address).collect();
    let yield_distribution = Scenario::new(
        format!("Yield Distribution (N={} Holders)", accounts.holders.len()),
        deployer,
        runs,
        action(contracts.manager.clone(), "distributeRewards", move |_| {
            vec![Token::Array(holders.clone())]
        }),
    )
    .with_setup(
        yield_setup
            .into_iter()
            .map(|invocation| Call::new(invocation, deployer))
            .collect(),
    );

    // One proposal per repetition; proposal IDs match repetition indices.
    let proposals: Vec<Call> = (0..runs)
        .map(|index| {
            let description = Token::String(format!("Test Proposal #{index}"));
            let invocation = contracts.dao.invocation("createProposal", &[description])?;
            Ok(Call::new(invocation, deployer))
        })
        .collect::<anyhow::Result<_>>()?;
    let vote = Scenario::new(
        "Governance Vote",
        user1,
        runs,
        action(contracts.dao.clone(), "vote", |repetition| {
            vec![Token::Uint(U256::from(repetition as u64)), Token::Bool(true)]
        }),
    )
    .with_setup(proposals);

    let mut oracle_update = Scenario::new(
        "Oracle Update (Valuation)",
        deployer,
        runs,
        action(contracts.oracle.clone(), "updateAssetValue", |_| {
            let value = ORACLE_BASE_VALUE + unix_timestamp() % 100;
            vec![Token::Uint(ORACLE_ASSET_ID.into()), Token::Uint(value.into())]
        }),
    );
    if let Some(fee) = oracle_fee_usd {
        oracle_update = oracle_update.with_external_fee(fee);
    }

    Ok(vec![issuance, transfer, yield_distribution, vote, oracle_update])
}
