//! Smart contract module
//!
//! Compiles Solidity source and drives the resulting contract on a chain.
//!
//! # Overview
//!
//! This module implements:
//! - The compiler adapter producing a [`CompiledArtifact`]
//! - Interface descriptors and the ABI codec
//! - The [`ContractRunner`] that deploys an artifact and invokes its methods
//! - Confirmation gates guarding production transactions
//!
//! # Example
//!
//! ```rust,no_run
//! use solrunner::config::RunnerConfig;
//! use solrunner::contract::{AbiValue, ContractCompiler, EXAMPLE_CONTRACT, EXAMPLE_CONTRACT_NAME};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let compiler = ContractCompiler::new(EXAMPLE_CONTRACT, EXAMPLE_CONTRACT_NAME);
//! let mut runner = compiler.compile(Some("localhost"), &RunnerConfig::from_env()).await?;
//!
//! runner.deploy().await?;
//! runner.invoke("setValue", &[AbiValue::from(7u64)]).await?;
//! let value = runner.invoke("value", &[]).await?;
//! println!("{} holds {:?}", runner.address()?, value.value());
//! # Ok(())
//! # }
//! ```

pub mod abi;
pub mod codec;
pub mod compiler;
pub mod contract;
pub mod example;
pub mod gate;
pub mod runner;

pub use abi::{
    AbiError, AbiItem, Event, Function, Interface, LookupError, MethodTable, Param, ParamType,
    StateMutability,
};
pub use codec::AbiValue;
pub use compiler::{CompilerError, CompilerService, ContractCompiler, SolcCompiler};
pub use contract::CompiledArtifact;
pub use example::{EXAMPLE_CONTRACT, EXAMPLE_CONTRACT_NAME};
pub use gate::{ConfirmationGate, DelayGate, GateError, GateNotice, GuardedOperation, NoopGate};
pub use runner::{
    classify_probe, ContractRunner, DeployedInstance, InvocationOutcome, MethodKind, RunnerError,
    SubmissionError,
};
