//! Contract instance runner
//!
//! A [`ContractRunner`] owns one compiled artifact and one network profile.
//! It deploys the artifact at most once and then routes method invocations
//! to the live instance:
//!
//! - Undeployed: only `deploy()` is valid
//! - Deployed: `invoke()` and `address()` are valid
//!
//! On the production network every deployment and state-changing call goes
//! through the runner's [`ConfirmationGate`] first and pays the profile's
//! fixed gas price.

use crate::config::RunnerConfig;
use crate::contract::abi::{AbiError, Function, Interface, LookupError, MethodTable};
use crate::contract::codec::{self, AbiValue};
use crate::contract::compiler::CompilerError;
use crate::contract::contract::CompiledArtifact;
use crate::contract::gate::{
    ConfirmationGate, DelayGate, GateNotice, GuardedOperation, DEPLOY_OBSERVATION_DELAY,
    TRANSACTION_OBSERVATION_DELAY,
};
use crate::core::{format_ether, TransactionRequest, TxHash};
use crate::crypto::{KeyError, KeyPair};
use crate::network::{
    wait_for_receipt, CallRequest, ChainClient, ClientError, JsonRpcClient, Network,
    NetworkProfile, TransactionReceipt,
};
use alloy_primitives::{Address, Bytes};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a deployment or transaction could not be completed
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("Signing failed: {0}")]
    Signing(#[from] KeyError),
    #[error("Encoding failed: {0}")]
    Encoding(#[from] AbiError),
    #[error("Node reports chain id {actual}, expected {expected}")]
    ChainMismatch { expected: String, actual: u64 },
    #[error("Transaction {0} was reverted")]
    Reverted(TxHash),
    #[error("Receipt for {0} carries no contract address")]
    MissingContractAddress(TxHash),
}

/// Runner errors
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),
    #[error("Compilation failed: {0}")]
    Compile(#[from] CompilerError),
    #[error("Invalid signing key: {0}")]
    Key(#[from] KeyError),
    #[error("Cannot reach {network}: {source}")]
    Endpoint {
        network: String,
        #[source]
        source: ClientError,
    },
    #[error("Insufficient funds: account {address} has no balance on {network}")]
    InsufficientFunds { address: Address, network: String },
    #[error("Deployment to {network} failed: {source}")]
    Deployment {
        network: String,
        #[source]
        source: SubmissionError,
    },
    #[error("Contract already deployed at {0}")]
    AlreadyDeployed(Address),
    #[error("Contract not deployed yet")]
    NotDeployed,
    #[error("Method {method} not found on contract deployed to {network}")]
    MethodNotFound { method: String, network: String },
    #[error("Invalid arguments for {method}: {reason}")]
    InvalidArguments { method: String, reason: String },
    #[error("Aborted: {0}")]
    Aborted(String),
    #[error("Call to {method} on {network} failed: {source}")]
    Invocation {
        method: String,
        network: String,
        #[source]
        source: SubmissionError,
    },
}

/// Result of [`ContractRunner::invoke`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    /// Decoded return values of a read-only call
    Value(Vec<AbiValue>),
    /// Receipt of a confirmed state-changing transaction
    Receipt(TransactionReceipt),
}

impl InvocationOutcome {
    /// First returned value, if this was a read
    pub fn value(&self) -> Option<&AbiValue> {
        match self {
            InvocationOutcome::Value(values) => values.first(),
            InvocationOutcome::Receipt(_) => None,
        }
    }

    pub fn receipt(&self) -> Option<&TransactionReceipt> {
        match self {
            InvocationOutcome::Receipt(receipt) => Some(receipt),
            InvocationOutcome::Value(_) => None,
        }
    }
}

/// How a method is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    ReadOnly,
    Mutating,
}

/// Decide mutability from the outcome of a gas-estimation probe
///
/// | probe result                  | kind     |
/// |-------------------------------|----------|
/// | estimate succeeded            | mutating |
/// | gas cannot be estimated       | mutating |
/// | any other failure             | read-only|
pub fn classify_probe(probe: &Result<u64, ClientError>) -> MethodKind {
    match probe {
        Ok(_) => MethodKind::Mutating,
        Err(ClientError::EstimationUnavailable(_)) => MethodKind::Mutating,
        Err(_) => MethodKind::ReadOnly,
    }
}

/// A live contract instance
#[derive(Debug, Clone)]
pub struct DeployedInstance {
    pub address: Address,
    pub transaction_hash: TxHash,
    pub chain_id: u64,
    methods: MethodTable,
}

/// Deploys one artifact and routes calls to it
pub struct ContractRunner<C: ChainClient> {
    artifact: Arc<CompiledArtifact>,
    profile: NetworkProfile,
    client: C,
    signer: KeyPair,
    gate: Arc<dyn ConfirmationGate>,
    poll_interval: Duration,
    confirmation_timeout: Duration,
    deployed: Option<DeployedInstance>,
}

impl ContractRunner<JsonRpcClient> {
    /// Bind an artifact to a network over JSON-RPC
    pub fn new(
        artifact: Arc<CompiledArtifact>,
        network: &str,
        config: &RunnerConfig,
    ) -> Result<Self, RunnerError> {
        let profile = NetworkProfile::resolve(network, config);
        let client =
            JsonRpcClient::new(&profile.endpoint_url).map_err(|source| RunnerError::Endpoint {
                network: profile.label.clone(),
                source,
            })?;
        Self::from_profile(artifact, profile, config, client)
    }
}

impl<C: ChainClient> ContractRunner<C> {
    /// Bind an artifact to a network using an existing client
    pub fn with_client(
        artifact: Arc<CompiledArtifact>,
        network: &str,
        config: &RunnerConfig,
        client: C,
    ) -> Result<Self, RunnerError> {
        let profile = NetworkProfile::resolve(network, config);
        Self::from_profile(artifact, profile, config, client)
    }

    fn from_profile(
        artifact: Arc<CompiledArtifact>,
        profile: NetworkProfile,
        config: &RunnerConfig,
        client: C,
    ) -> Result<Self, RunnerError> {
        if artifact.abi.is_empty() {
            return Err(RunnerError::InvalidArtifact(
                "interface descriptor is empty".to_string(),
            ));
        }
        if artifact.bytecode.is_empty() {
            return Err(RunnerError::InvalidArtifact("bytecode is empty".to_string()));
        }

        let signer = KeyPair::from_private_key_hex(&profile.signing_key)?;
        log::info!("Using network: {}", profile.label);

        Ok(Self {
            artifact,
            profile,
            client,
            signer,
            gate: Arc::new(DelayGate),
            poll_interval: config.confirmation_poll_interval,
            confirmation_timeout: config.confirmation_timeout,
            deployed: None,
        })
    }

    /// Replace the confirmation gate
    pub fn with_gate(mut self, gate: Arc<dyn ConfirmationGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn network(&self) -> Network {
        self.profile.network
    }

    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    pub fn interface(&self) -> &Interface {
        &self.artifact.abi
    }

    /// Address of the signing account
    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    pub fn is_deployed(&self) -> bool {
        self.deployed.is_some()
    }

    pub fn deployment(&self) -> Option<&DeployedInstance> {
        self.deployed.as_ref()
    }

    /// Address of the deployed instance
    pub fn address(&self) -> Result<Address, RunnerError> {
        self.deployed
            .as_ref()
            .map(|d| d.address)
            .ok_or(RunnerError::NotDeployed)
    }

    /// Deploy the artifact without constructor arguments
    pub async fn deploy(&mut self) -> Result<Address, RunnerError> {
        self.deploy_with_args(&[]).await
    }

    /// Deploy the artifact, ABI-encoding `args` for the constructor
    pub async fn deploy_with_args(&mut self, args: &[AbiValue]) -> Result<Address, RunnerError> {
        if let Some(deployed) = &self.deployed {
            return Err(RunnerError::AlreadyDeployed(deployed.address));
        }

        let init_code = self.init_code(args)?;
        let from = self.signer.address();
        let network = self.profile.label.clone();
        let deployment_error = |source: SubmissionError| RunnerError::Deployment {
            network: network.clone(),
            source,
        };

        let balance = self
            .client
            .balance(from)
            .await
            .map_err(|e| deployment_error(e.into()))?;
        log::info!("Deploying contracts with the account: {}", from);
        log::info!("Account balance: {} ETH", format_ether(balance));

        if balance == 0 {
            return Err(RunnerError::InsufficientFunds {
                address: from,
                network: self.profile.label.clone(),
            });
        }

        let gas_price = self.transaction_gas_price().await.map_err(deployment_error)?;
        let chain_id = self.checked_chain_id().await.map_err(deployment_error)?;
        if self.profile.is_production() {
            self.hold(GuardedOperation::Deploy, gas_price, DEPLOY_OBSERVATION_DELAY)
                .await?;
        }

        let (hash, receipt) = self
            .submit(None, init_code, gas_price, chain_id)
            .await
            .map_err(deployment_error)?;

        let address = receipt
            .contract_address
            .ok_or(SubmissionError::MissingContractAddress(hash))
            .map_err(deployment_error)?;
        log::info!("Contract deployed to: {}", address);

        self.deployed = Some(DeployedInstance {
            address,
            transaction_hash: hash,
            chain_id,
            methods: MethodTable::from_interface(&self.artifact.abi),
        });
        Ok(address)
    }

    /// Invoke a method on the deployed instance
    ///
    /// Read-only methods are executed with `eth_call` and their decoded
    /// return values are returned; anything else is sent as a transaction and
    /// its receipt is returned once mined.
    pub async fn invoke(
        &self,
        method: &str,
        args: &[AbiValue],
    ) -> Result<InvocationOutcome, RunnerError> {
        let deployed = self.deployed.as_ref().ok_or(RunnerError::NotDeployed)?;

        let function = deployed
            .methods
            .resolve(method, args.len())
            .map_err(|e| match e {
                LookupError::NotFound(_) => RunnerError::MethodNotFound {
                    method: method.to_string(),
                    network: self.profile.label.clone(),
                },
                arity @ LookupError::Arity { .. } => RunnerError::InvalidArguments {
                    method: method.to_string(),
                    reason: arity.to_string(),
                },
            })?;

        let data = codec::encode_call(function, args)
            .map(Bytes::from)
            .map_err(|e| RunnerError::InvalidArguments {
                method: method.to_string(),
                reason: e.to_string(),
            })?;

        let kind = self.classify(deployed, function).await;
        log::debug!("Invoking {} ({:?})", function.signature(), kind);

        let invocation_error = |source: SubmissionError| RunnerError::Invocation {
            method: method.to_string(),
            network: self.profile.label.clone(),
            source,
        };

        match kind {
            MethodKind::ReadOnly => {
                let request = CallRequest {
                    from: Some(self.signer.address()),
                    to: Some(deployed.address),
                    data,
                    value: 0,
                };
                let output = self
                    .client
                    .call(&request)
                    .await
                    .map_err(|e| invocation_error(e.into()))?;
                let values = codec::decode_output(function, &output)
                    .map_err(|e| invocation_error(e.into()))?;
                Ok(InvocationOutcome::Value(values))
            }
            MethodKind::Mutating => {
                let gas_price = self
                    .transaction_gas_price()
                    .await
                    .map_err(&invocation_error)?;
                if self.profile.is_production() {
                    self.hold(
                        GuardedOperation::Transaction {
                            method: method.to_string(),
                        },
                        gas_price,
                        TRANSACTION_OBSERVATION_DELAY,
                    )
                    .await?;
                }
                let (_, receipt) = self
                    .submit(Some(deployed.address), data, gas_price, deployed.chain_id)
                    .await
                    .map_err(invocation_error)?;
                Ok(InvocationOutcome::Receipt(receipt))
            }
        }
    }

    /// Declared mutability first; on production an estimate-gas probe
    /// decides when the interface carries no metadata
    async fn classify(&self, deployed: &DeployedInstance, function: &Function) -> MethodKind {
        match function.declared_read_only() {
            Some(true) => MethodKind::ReadOnly,
            Some(false) => MethodKind::Mutating,
            None if !self.profile.is_production() => MethodKind::Mutating,
            None => {
                let probe = self
                    .client
                    .estimate_gas(&CallRequest {
                        from: Some(self.signer.address()),
                        to: Some(deployed.address),
                        data: Bytes::copy_from_slice(&function.selector()),
                        value: 0,
                    })
                    .await;
                let kind = classify_probe(&probe);
                log::debug!(
                    "No declared mutability for {}, probe {:?} => {:?}",
                    function.name,
                    probe,
                    kind
                );
                kind
            }
        }
    }

    fn init_code(&self, args: &[AbiValue]) -> Result<Bytes, RunnerError> {
        let invalid = |reason: String| RunnerError::InvalidArguments {
            method: "constructor".to_string(),
            reason,
        };
        let types = self
            .artifact
            .abi
            .constructor_inputs()
            .iter()
            .map(|p| p.param_type())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid(e.to_string()))?;
        let encoded = codec::encode(&types, args).map_err(|e| invalid(e.to_string()))?;

        let mut code = self.artifact.bytecode.to_vec();
        code.extend_from_slice(&encoded);
        Ok(Bytes::from(code))
    }

    async fn hold(
        &self,
        operation: GuardedOperation,
        gas_price: u128,
        delay: Duration,
    ) -> Result<(), RunnerError> {
        let notice = GateNotice {
            operation,
            network: self.profile.label.clone(),
            gas_price,
            delay,
        };
        self.gate
            .hold(&notice)
            .await
            .map_err(|e| RunnerError::Aborted(e.to_string()))
    }

    /// Production pays the profile's fixed price; other networks ask the node
    async fn transaction_gas_price(&self) -> Result<u128, SubmissionError> {
        match self.profile.gas_price_override {
            Some(price) if self.profile.is_production() => Ok(price),
            _ => Ok(self.client.gas_price().await?),
        }
    }

    async fn checked_chain_id(&self) -> Result<u64, SubmissionError> {
        let chain_id = self.client.chain_id().await?;
        if !self.profile.network.accepts_chain_id(chain_id) {
            return Err(SubmissionError::ChainMismatch {
                expected: self.profile.network.name().to_string(),
                actual: chain_id,
            });
        }
        Ok(chain_id)
    }

    /// Sign, send and wait for one transaction
    async fn submit(
        &self,
        to: Option<Address>,
        data: Bytes,
        gas_price: u128,
        chain_id: u64,
    ) -> Result<(TxHash, TransactionReceipt), SubmissionError> {
        let from = self.signer.address();
        let gas_limit = self
            .client
            .estimate_gas(&CallRequest {
                from: Some(from),
                to,
                data: data.clone(),
                value: 0,
            })
            .await?;
        let nonce = self.client.nonce(from).await?;

        let request = TransactionRequest {
            nonce,
            gas_price,
            gas_limit,
            to,
            value: 0,
            data,
            chain_id,
        };
        let signed = request.sign(&self.signer)?;
        let hash = self.client.send_transaction(&signed).await?;
        log::info!("Transaction sent: {}", hash);

        if self.profile.is_production() {
            log::info!("Waiting for confirmation...");
        }
        let receipt = wait_for_receipt(
            &self.client,
            hash,
            self.poll_interval,
            self.confirmation_timeout,
        )
        .await?;

        if !receipt.status {
            return Err(SubmissionError::Reverted(hash));
        }
        log::info!(
            "Transaction {} confirmed in block {} (gas used: {})",
            hash,
            receipt.block_number,
            receipt.gas_used
        );
        Ok((hash, receipt))
    }
}
