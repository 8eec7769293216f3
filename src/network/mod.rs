//! Network access
//!
//! Provides everything the runner needs to reach a chain:
//! - Network selection and profiles (endpoint, signing key, gas policy)
//! - The `ChainClient` abstraction with structured errors
//! - A JSON-RPC implementation over HTTP

pub mod client;
pub mod profile;
pub mod rpc;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{wait_for_receipt, CallRequest, ChainClient, ClientError, TransactionReceipt};
pub use profile::{Network, NetworkProfile, LOCALHOST_RPC_URL, MAINNET_GAS_PRICE};
pub use rpc::JsonRpcClient;
