//! Solrunner: compile, deploy and drive Solidity contracts from Rust
//!
//! This crate provides:
//! - A compiler adapter over solc's standard-JSON interface
//! - A contract runner that deploys one artifact and invokes its methods
//! - Network profiles for a local node, Sepolia and mainnet
//! - A mainnet guard: observation delays and a fixed gas price for
//!   irreversible operations
//! - Legacy EIP-155 transaction signing (secp256k1) and a JSON-RPC client
//!
//! # Example
//!
//! ```rust,no_run
//! use solrunner::{ContractCompiler, RunnerConfig, EXAMPLE_CONTRACT, EXAMPLE_CONTRACT_NAME};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunnerConfig::from_env();
//! let compiler = ContractCompiler::new(EXAMPLE_CONTRACT, EXAMPLE_CONTRACT_NAME);
//!
//! let mut runner = compiler.compile(Some("sepolia"), &config).await?;
//! let address = runner.deploy().await?;
//! println!("Deployed to {}", address);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod contract;
pub mod core;
pub mod crypto;
pub mod network;

// Re-export commonly used types
pub use config::RunnerConfig;
pub use contract::{
    AbiValue, CompiledArtifact, ContractCompiler, ContractRunner, InvocationOutcome, RunnerError,
    EXAMPLE_CONTRACT, EXAMPLE_CONTRACT_NAME,
};
pub use alloy_primitives::{Address, Bytes, U256};
pub use core::TxHash;
pub use crypto::KeyPair;
pub use network::{JsonRpcClient, Network, NetworkProfile};
