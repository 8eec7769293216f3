//! In-memory chain for tests
//!
//! Simulates just enough of a node to drive the runner: balances, nonces,
//! contract creation and the storage of the example contract
//! (`uint256 public value` initialised to 42, `setValue(uint256)`), extended
//! with `setMany(uint256[])`, which stores the sum of its arguments.

use crate::contract::abi::ParamType;
use crate::contract::codec::{self, AbiValue};
use crate::core::rlp::{self, RlpItem};
use crate::core::{SignedTransaction, TxHash};
use crate::network::client::{CallRequest, ChainClient, ClientError, TransactionReceipt};
use alloy_primitives::{keccak256, Address, Bytes, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

pub(crate) const INITIAL_VALUE: u64 = 42;

fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

struct State {
    chain_id: u64,
    gas_price: u128,
    block_number: u64,
    balances: HashMap<Address, u128>,
    nonces: HashMap<Address, u64>,
    contracts: HashMap<Address, U256>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    pending_polls: HashMap<TxHash, u32>,
    polls: HashMap<TxHash, u32>,
    confirmation_delay: u32,
    never_confirm: bool,
    sent: Vec<SignedTransaction>,
    estimates: Vec<CallRequest>,
    probe_response: Option<Result<u64, ClientError>>,
    fail_next_balance: Option<ClientError>,
    fail_next_send: Option<ClientError>,
    revert_next: bool,
}

/// An in-memory [`ChainClient`]
pub(crate) struct MockChain {
    state: Mutex<State>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                chain_id: 31337,
                gas_price: 1_000_000_000,
                block_number: 0,
                balances: HashMap::new(),
                nonces: HashMap::new(),
                contracts: HashMap::new(),
                receipts: HashMap::new(),
                pending_polls: HashMap::new(),
                polls: HashMap::new(),
                confirmation_delay: 0,
                never_confirm: false,
                sent: Vec::new(),
                estimates: Vec::new(),
                probe_response: None,
                fail_next_balance: None,
                fail_next_send: None,
                revert_next: false,
            }),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn fund(&self, address: Address, wei: u128) {
        self.with_state(|s| {
            s.balances.insert(address, wei);
        });
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.with_state(|s| s.chain_id = chain_id);
    }

    /// Number of receipt polls that report "pending" before each receipt appears
    pub fn set_confirmation_delay(&self, polls: u32) {
        self.with_state(|s| s.confirmation_delay = polls);
    }

    /// Keep every transaction pending forever
    pub fn never_confirm(&self) {
        self.with_state(|s| s.never_confirm = true);
    }

    /// Fixed answer for gas estimations against deployed contracts
    pub fn set_probe_response(&self, response: Result<u64, ClientError>) {
        self.with_state(|s| s.probe_response = Some(response));
    }

    pub fn fail_next_balance(&self, error: ClientError) {
        self.with_state(|s| s.fail_next_balance = Some(error));
    }

    pub fn fail_next_send(&self, error: ClientError) {
        self.with_state(|s| s.fail_next_send = Some(error));
    }

    /// Mine the next transaction with a failed status
    pub fn revert_next_transaction(&self) {
        self.with_state(|s| s.revert_next = true);
    }

    /// Register a receipt directly
    pub fn insert_receipt(&self, receipt: TransactionReceipt) {
        self.with_state(|s| {
            let delay = s.confirmation_delay;
            s.pending_polls.insert(receipt.transaction_hash, delay);
            s.receipts.insert(receipt.transaction_hash, receipt);
        });
    }

    pub fn sent_transactions(&self) -> Vec<SignedTransaction> {
        self.with_state(|s| s.sent.clone())
    }

    pub fn estimate_requests(&self) -> Vec<CallRequest> {
        self.with_state(|s| s.estimates.clone())
    }

    pub fn receipt_polls(&self, hash: TxHash) -> u32 {
        self.with_state(|s| s.polls.get(&hash).copied().unwrap_or(0))
    }

    pub fn contract_value(&self, address: Address) -> Option<U256> {
        self.with_state(|s| s.contracts.get(&address).copied())
    }

    fn contract_address(from: Address, nonce: u64) -> Address {
        let encoded = rlp::encode(&RlpItem::List(vec![
            RlpItem::bytes(from.as_slice()),
            RlpItem::uint(nonce as u128),
        ]));
        Address::from_slice(&keccak256(&encoded)[12..])
    }

    /// Execute the example contract; `Ok(Some(v))` writes `v`, `Ok(None)` reads
    fn execute(stored: U256, data: &[u8]) -> Result<(Option<U256>, Bytes), ClientError> {
        if data.len() < 4 {
            return Err(ClientError::Reverted("missing selector".to_string()));
        }
        let (sel, args) = data.split_at(4);
        let invalid = || ClientError::Reverted("invalid calldata".to_string());

        if sel == selector("value()") {
            let output = codec::encode(&[ParamType::Uint(256)], &[AbiValue::Uint(stored)])
                .map_err(|_| invalid())?;
            Ok((None, Bytes::from(output)))
        } else if sel == selector("setValue(uint256)") {
            match codec::decode(&[ParamType::Uint(256)], args).map_err(|_| invalid())?.as_slice() {
                [AbiValue::Uint(v)] => Ok((Some(*v), Bytes::new())),
                _ => Err(invalid()),
            }
        } else if sel == selector("setMany(uint256[])") {
            let kind = ParamType::Array(Box::new(ParamType::Uint(256)));
            match codec::decode(&[kind], args).map_err(|_| invalid())?.as_slice() {
                [AbiValue::Array(items)] => {
                    let sum = items.iter().fold(U256::ZERO, |acc, item| match item {
                        AbiValue::Uint(v) => acc.wrapping_add(*v),
                        _ => acc,
                    });
                    Ok((Some(sum), Bytes::new()))
                }
                _ => Err(invalid()),
            }
        } else {
            Err(ClientError::Reverted(
                "function selector was not recognized".to_string(),
            ))
        }
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> Result<u64, ClientError> {
        Ok(self.with_state(|s| s.chain_id))
    }

    async fn balance(&self, address: Address) -> Result<u128, ClientError> {
        self.with_state(|s| match s.fail_next_balance.take() {
            Some(error) => Err(error),
            None => Ok(s.balances.get(&address).copied().unwrap_or(0)),
        })
    }

    async fn nonce(&self, address: Address) -> Result<u64, ClientError> {
        Ok(self.with_state(|s| s.nonces.get(&address).copied().unwrap_or(0)))
    }

    async fn gas_price(&self) -> Result<u128, ClientError> {
        Ok(self.with_state(|s| s.gas_price))
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, ClientError> {
        self.with_state(|s| {
            s.estimates.push(request.clone());
            let Some(to) = request.to else {
                return Ok(150_000);
            };
            if let Some(response) = &s.probe_response {
                return response.clone();
            }
            let stored = s
                .contracts
                .get(&to)
                .copied()
                .ok_or_else(|| ClientError::Reverted("no contract at address".to_string()))?;
            Self::execute(stored, &request.data).map(|_| 45_000)
        })
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, ClientError> {
        self.with_state(|s| {
            let to = request
                .to
                .ok_or_else(|| ClientError::Rpc {
                    code: -32602,
                    message: "missing to".to_string(),
                })?;
            let stored = s.contracts.get(&to).copied().unwrap_or_default();
            Self::execute(stored, &request.data).map(|(_, output)| output)
        })
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<TxHash, ClientError> {
        self.with_state(|s| {
            if let Some(error) = s.fail_next_send.take() {
                return Err(error);
            }

            let expected_nonce = s.nonces.get(&tx.from).copied().unwrap_or(0);
            if tx.request.nonce != expected_nonce {
                return Err(ClientError::Rpc {
                    code: -32000,
                    message: format!(
                        "nonce too low: expected {}, got {}",
                        expected_nonce, tx.request.nonce
                    ),
                });
            }
            if tx.request.chain_id != s.chain_id {
                return Err(ClientError::Rpc {
                    code: -32000,
                    message: "invalid chain id".to_string(),
                });
            }
            s.nonces.insert(tx.from, expected_nonce + 1);
            s.sent.push(tx.clone());
            s.block_number += 1;

            let status = !std::mem::take(&mut s.revert_next);
            let mut contract_address = None;
            if status {
                match tx.request.to {
                    None => {
                        let address = Self::contract_address(tx.from, tx.request.nonce);
                        s.contracts.insert(address, U256::from(INITIAL_VALUE));
                        contract_address = Some(address);
                    }
                    Some(to) => {
                        let stored = s.contracts.get(&to).copied().unwrap_or_default();
                        if let Ok((Some(new_value), _)) = Self::execute(stored, &tx.request.data) {
                            s.contracts.insert(to, new_value);
                        }
                    }
                }
            }

            let receipt = TransactionReceipt {
                transaction_hash: tx.hash,
                block_number: s.block_number,
                gas_used: 21_000,
                contract_address,
                status,
            };
            let delay = s.confirmation_delay;
            s.pending_polls.insert(tx.hash, delay);
            s.receipts.insert(tx.hash, receipt);
            Ok(tx.hash)
        })
    }

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, ClientError> {
        Ok(self.with_state(|s| {
            *s.polls.entry(hash).or_insert(0) += 1;
            if s.never_confirm {
                return None;
            }
            match s.pending_polls.get_mut(&hash) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    None
                }
                _ => s.receipts.get(&hash).cloned(),
            }
        }))
    }
}
