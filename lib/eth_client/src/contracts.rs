//! Utilities for reading compiled contracts (bytecode and ABI) from the filesystem.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use rollsim_types::{
    ethabi::{Contract, Token},
    Address,
};
use serde_json::Value;

use crate::Invocation;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error(
        "compiled contract file not found: {path:?}; make sure the contracts were compiled \
         (e.g., `truffle compile`) and the artifacts directory is configured correctly"
    )]
    NotFound { path: PathBuf },
    #[error("cannot read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {path:?}: not valid JSON")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("missing expected key `{key}` in {path:?}")]
    MissingKey { path: PathBuf, key: &'static str },
    #[error("bytecode not found in {path:?}")]
    MissingBytecode { path: PathBuf },
    #[error("invalid bytecode in {path:?}")]
    InvalidBytecode {
        path: PathBuf,
        #[source]
        source: hex::FromHexError,
    },
    #[error("invalid ABI in {path:?}")]
    InvalidAbi {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Compiled contract: ABI and creation bytecode.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub name: String,
    pub abi: Contract,
    pub bytecode: Vec<u8>,
}

impl ContractArtifact {
    /// Returns the data of the contract creation transaction.
    pub fn deployment_data(&self, constructor_args: &[Token]) -> anyhow::Result<Vec<u8>> {
        match self.abi.constructor() {
            Some(constructor) => constructor
                .encode_input(self.bytecode.clone(), constructor_args)
                .with_context(|| format!("cannot encode constructor args of {}", self.name)),
            None => {
                anyhow::ensure!(
                    constructor_args.is_empty(),
                    "{} has no constructor, but {} args were provided",
                    self.name,
                    constructor_args.len()
                );
                Ok(self.bytecode.clone())
            }
        }
    }
}

fn extract_bytecode(artifact: &Value, path: &Path) -> Result<Vec<u8>, ArtifactError> {
    let bytecode = artifact["bytecode"]
        .as_str()
        .or_else(|| artifact["deployedBytecode"].as_str())
        .unwrap_or_default();
    let bytecode = bytecode.strip_prefix("0x").unwrap_or(bytecode);
    if bytecode.is_empty() {
        return Err(ArtifactError::MissingBytecode { path: path.into() });
    }
    hex::decode(bytecode).map_err(|source| ArtifactError::InvalidBytecode {
        path: path.into(),
        source,
    })
}

/// Reads `<dir>/<name>.json` produced by the contract compiler (Truffle layout).
pub fn load_compiled_contract(dir: &Path, name: &str) -> Result<ContractArtifact, ArtifactError> {
    let path = dir.join(format!("{name}.json"));
    tracing::info!("Loading compiled {name} from {path:?}");

    let raw = match fs::read(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ArtifactError::NotFound { path });
        }
        Err(source) => return Err(ArtifactError::Io { path, source }),
    };
    let mut artifact: Value = serde_json::from_slice(&raw).map_err(|source| ArtifactError::Json {
        path: path.clone(),
        source,
    })?;

    let abi = artifact
        .get_mut("abi")
        .map(Value::take)
        .ok_or_else(|| ArtifactError::MissingKey {
            path: path.clone(),
            key: "abi",
        })?;
    let abi: Contract = serde_json::from_value(abi).map_err(|source| ArtifactError::InvalidAbi {
        path: path.clone(),
        source,
    })?;
    let bytecode = extract_bytecode(&artifact, &path)?;

    Ok(ContractArtifact {
        name: name.to_owned(),
        abi,
        bytecode,
    })
}

/// Deployed contract that can produce invocations of its functions.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    name: String,
    address: Address,
    abi: Arc<Contract>,
}

impl ContractHandle {
    pub fn new(artifact: &ContractArtifact, address: Address) -> Self {
        Self {
            name: artifact.name.clone(),
            address,
            abi: Arc::new(artifact.abi.clone()),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn invocation(&self, function: &str, args: &[Token]) -> anyhow::Result<Invocation> {
        let calldata = self
            .abi
            .function(function)
            .with_context(|| format!("{} has no function `{function}`", self.name))?
            .encode_input(args)
            .with_context(|| format!("cannot encode args of {}::{function}", self.name))?;
        Ok(Invocation {
            target: self.address,
            function: function.to_owned(),
            calldata,
        })
    }
}
