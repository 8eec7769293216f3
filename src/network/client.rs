//! Chain client abstraction
//!
//! [`ChainClient`] is the seam between the contract runner and a node. The
//! JSON-RPC implementation lives in [`crate::network::rpc`]; tests use an
//! in-memory chain.

use crate::core::{SignedTransaction, TxHash};
use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Client errors
///
/// Failures are classified structurally so that callers never have to match
/// on message text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Execution reverted: {0}")]
    Reverted(String),
    #[error("Cannot estimate gas: {0}")]
    EstimationUnavailable(String),
    #[error("Invalid response: {0}")]
    Decode(String),
    #[error("Timed out after {0:?} waiting for confirmation")]
    Timeout(Duration),
}

/// A read-only call or gas estimation request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<Address>,
    /// `None` for contract creation (gas estimation of a deployment)
    pub to: Option<Address>,
    pub data: Bytes,
    pub value: u128,
}

/// Receipt of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    /// Set for contract-creation transactions
    pub contract_address: Option<Address>,
    /// `false` if the transaction reverted
    pub status: bool,
}

/// Operations the runner needs from a node
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain id reported by the node
    async fn chain_id(&self) -> Result<u64, ClientError>;

    /// Balance of an account in wei
    async fn balance(&self, address: Address) -> Result<u128, ClientError>;

    /// Next nonce for an account, counting pending transactions
    async fn nonce(&self, address: Address) -> Result<u64, ClientError>;

    /// Node's suggested gas price in wei
    async fn gas_price(&self) -> Result<u128, ClientError>;

    /// Estimate the gas a call or deployment would use
    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, ClientError>;

    /// Execute a call against the latest state without creating a transaction
    async fn call(&self, request: &CallRequest) -> Result<Bytes, ClientError>;

    /// Submit a signed transaction
    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<TxHash, ClientError>;

    /// Receipt of a transaction, `None` while it is pending
    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, ClientError>;
}

/// Poll until a transaction is mined
pub async fn wait_for_receipt<C: ChainClient + ?Sized>(
    client: &C,
    hash: TxHash,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<TransactionReceipt, ClientError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(receipt) = client.transaction_receipt(hash).await? {
            return Ok(receipt);
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(ClientError::Timeout(timeout));
        }
        log::debug!("Transaction {} pending, polling again", hash);
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::mock::MockChain;

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_receipt_times_out() {
        let chain = MockChain::new();
        let start = tokio::time::Instant::now();

        let result = wait_for_receipt(
            &chain,
            TxHash::repeat_byte(7),
            Duration::from_secs(1),
            Duration::from_secs(10),
        )
        .await;

        assert_eq!(result, Err(ClientError::Timeout(Duration::from_secs(10))));
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_receipt_after_pending_polls() {
        let chain = MockChain::new();
        chain.set_confirmation_delay(3);
        let hash = TxHash::repeat_byte(9);
        chain.insert_receipt(TransactionReceipt {
            transaction_hash: hash,
            block_number: 1,
            gas_used: 21_000,
            contract_address: None,
            status: true,
        });

        let receipt = wait_for_receipt(
            &chain,
            hash,
            Duration::from_secs(1),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

        assert!(receipt.status);
        assert_eq!(chain.receipt_polls(hash), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfirmed_transaction_times_out() {
        let chain = MockChain::new();
        chain.never_confirm();
        let hash = TxHash::repeat_byte(3);
        chain.insert_receipt(TransactionReceipt {
            transaction_hash: hash,
            block_number: 1,
            gas_used: 21_000,
            contract_address: None,
            status: true,
        });

        let result = wait_for_receipt(
            &chain,
            hash,
            Duration::from_secs(1),
            Duration::from_secs(5),
        )
        .await;

        assert_eq!(result, Err(ClientError::Timeout(Duration::from_secs(5))));
        assert_eq!(chain.receipt_polls(hash), 6);
    }
}
