//! Ethereum JSON-RPC client
//!
//! Implements [`ChainClient`] over HTTP with JSON-RPC 2.0 requests.

use crate::core::{SignedTransaction, TxHash};
use crate::network::client::{CallRequest, ChainClient, ClientError, TransactionReceipt};
use alloy_primitives::{hex, Address, Bytes};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// JSON-RPC error code geth/Hardhat use for reverts
const REVERT_ERROR_CODE: i64 = 3;

/// Message fragments nodes use when `eth_estimateGas` cannot find a gas limit
const GAS_ESTIMATION_FAILURES: &[&str] = &[
    "gas required exceeds",
    "exceeds allowance",
    "out of gas",
    "intrinsic gas",
    "cannot estimate gas",
    "exceeds block gas limit",
];

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Receipt as returned by `eth_getTransactionReceipt`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: TxHash,
    block_number: String,
    gas_used: String,
    #[serde(default)]
    contract_address: Option<Address>,
    #[serde(default)]
    status: Option<String>,
}

impl RawReceipt {
    fn into_receipt(self) -> Result<TransactionReceipt, ClientError> {
        Ok(TransactionReceipt {
            transaction_hash: self.transaction_hash,
            block_number: to_u64(parse_quantity_str(&self.block_number)?)?,
            gas_used: to_u64(parse_quantity_str(&self.gas_used)?)?,
            contract_address: self.contract_address,
            // Pre-Byzantium receipts carry no status; treat them as successful
            status: match self.status {
                Some(status) => parse_quantity_str(&status)? == 1,
                None => true,
            },
        })
    }
}

/// Format an integer as a JSON-RPC quantity
fn quantity(value: u128) -> String {
    format!("0x{:x}", value)
}

fn parse_quantity_str(s: &str) -> Result<u128, ClientError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| ClientError::Decode(format!("quantity without 0x prefix: {}", s)))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| ClientError::Decode(format!("invalid quantity {}: {}", s, e)))
}

fn to_u64(value: u128) -> Result<u64, ClientError> {
    u64::try_from(value)
        .map_err(|_| ClientError::Decode(format!("quantity {:#x} does not fit in 64 bits", value)))
}

fn parse_quantity(value: &Value) -> Result<u128, ClientError> {
    let s = value
        .as_str()
        .ok_or_else(|| ClientError::Decode(format!("expected quantity string, got {}", value)))?;
    parse_quantity_str(s)
}

fn parse_data(value: &Value) -> Result<Bytes, ClientError> {
    let s = value
        .as_str()
        .ok_or_else(|| ClientError::Decode(format!("expected hex data, got {}", value)))?;
    hex::decode(s)
        .map(Bytes::from)
        .map_err(|e| ClientError::Decode(format!("invalid hex data: {}", e)))
}

/// Lowercase `0x` form of an address, as nodes expect it
fn address_param(address: &Address) -> String {
    hex::encode_prefixed(address)
}

fn call_object(request: &CallRequest) -> Value {
    let mut object = json!({
        "data": hex::encode_prefixed(&request.data),
        "value": quantity(request.value),
    });
    if let Some(from) = request.from {
        object["from"] = json!(address_param(&from));
    }
    if let Some(to) = request.to {
        object["to"] = json!(address_param(&to));
    }
    object
}

/// Map an RPC error object to a structured client error
fn classify_error(method: &str, error: RpcErrorObject) -> ClientError {
    let message = error.message.to_ascii_lowercase();
    let reverted = error.code == REVERT_ERROR_CODE || message.starts_with("execution reverted");
    let estimation_failed = method == "eth_estimateGas"
        && GAS_ESTIMATION_FAILURES
            .iter()
            .any(|fragment| message.contains(fragment));

    if reverted {
        ClientError::Reverted(error.message)
    } else if estimation_failed {
        ClientError::EstimationUnavailable(error.message)
    } else {
        ClientError::Rpc {
            code: error.code,
            message: error.message,
        }
    }
}

/// HTTP JSON-RPC client bound to one endpoint
pub struct JsonRpcClient {
    endpoint: Url,
    http_client: Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Create a client for an endpoint URL
    pub fn new(endpoint: &str) -> Result<Self, ClientError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ClientError::Transport(format!("invalid endpoint URL: {}", e)))?;
        Ok(Self::with_client(Client::new(), endpoint))
    }

    /// Create a client with an existing HTTP client
    pub fn with_client(http_client: Client, endpoint: Url) -> Self {
        Self {
            endpoint,
            http_client,
            next_id: AtomicU64::new(1),
        }
    }

    /// Send a request and return its raw `result`
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        log::debug!("RPC {} (id {})", method, request.id);

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("HTTP error: {}", e)))?;

        let response: RpcResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("failed to read response: {}", e)))?;

        if let Some(error) = response.error {
            return Err(classify_error(method, error));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ChainClient for JsonRpcClient {
    async fn chain_id(&self) -> Result<u64, ClientError> {
        let result = self.request("eth_chainId", json!([])).await?;
        to_u64(parse_quantity(&result)?)
    }

    async fn balance(&self, address: Address) -> Result<u128, ClientError> {
        let result = self
            .request("eth_getBalance", json!([address_param(&address), "latest"]))
            .await?;
        parse_quantity(&result)
    }

    async fn nonce(&self, address: Address) -> Result<u64, ClientError> {
        let result = self
            .request(
                "eth_getTransactionCount",
                json!([address_param(&address), "pending"]),
            )
            .await?;
        to_u64(parse_quantity(&result)?)
    }

    async fn gas_price(&self) -> Result<u128, ClientError> {
        let result = self.request("eth_gasPrice", json!([])).await?;
        parse_quantity(&result)
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, ClientError> {
        let result = self
            .request("eth_estimateGas", json!([call_object(request)]))
            .await?;
        to_u64(parse_quantity(&result)?)
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, ClientError> {
        let result = self
            .request("eth_call", json!([call_object(request), "latest"]))
            .await?;
        parse_data(&result)
    }

    async fn send_transaction(&self, tx: &SignedTransaction) -> Result<TxHash, ClientError> {
        let result = self
            .request("eth_sendRawTransaction", json!([hex::encode_prefixed(&tx.raw)]))
            .await?;
        serde_json::from_value(result).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, ClientError> {
        let result = self
            .request("eth_getTransactionReceipt", json!([hash.to_string()]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let raw: RawReceipt =
            serde_json::from_value(result).map_err(|e| ClientError::Decode(e.to_string()))?;
        raw.into_receipt().map(Some)
    }
}
