//! Solidity compiler adapter
//!
//! Submits contract source to a compiler service using the solc
//! standard-JSON interface and normalizes the output for one contract symbol
//! into a [`CompiledArtifact`].

use crate::config::RunnerConfig;
use crate::contract::abi::Interface;
use crate::contract::contract::CompiledArtifact;
use crate::contract::runner::{ContractRunner, RunnerError};
use crate::network::JsonRpcClient;
use alloy_primitives::{hex, Bytes};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Source unit name used in compiler requests
pub const SOURCE_UNIT: &str = "contract.sol";

/// Network selector used when none is given
pub const DEFAULT_NETWORK: &str = "localhost";

/// Compiler errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompilerError {
    #[error("Compilation error: {0}")]
    Compilation(String),
    #[error("Contract {0} not found in compiler output")]
    SymbolNotFound(String),
    #[error("Compiler service failed: {0}")]
    Service(String),
    #[error("Invalid compiler output: {0}")]
    InvalidOutput(String),
}

/// A service that accepts solc standard-JSON input
#[async_trait]
pub trait CompilerService: Send + Sync {
    async fn compile_standard_json(&self, input: &Value) -> Result<Value, CompilerError>;
}

/// Runs a local `solc` binary in `--standard-json` mode
#[derive(Debug, Clone)]
pub struct SolcCompiler {
    binary: PathBuf,
}

impl SolcCompiler {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for SolcCompiler {
    fn default() -> Self {
        Self::new("solc")
    }
}

#[async_trait]
impl CompilerService for SolcCompiler {
    async fn compile_standard_json(&self, input: &Value) -> Result<Value, CompilerError> {
        let mut child = Command::new(&self.binary)
            .arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CompilerError::Service(format!("cannot run {}: {}", self.binary.display(), e))
            })?;

        let request = input.to_string();
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.as_bytes())
                .await
                .map_err(|e| CompilerError::Service(format!("cannot write input: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| CompilerError::Service(e.to_string()))?;

        if !output.status.success() {
            return Err(CompilerError::Service(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| CompilerError::InvalidOutput(format!("not JSON: {}", e)))
    }
}

/// Build the standard-JSON request for one source unit
pub fn standard_json_input(source: &str) -> Value {
    json!({
        "language": "Solidity",
        "sources": {
            SOURCE_UNIT: { "content": source }
        },
        "settings": {
            "outputSelection": {
                "*": { "*": ["abi", "evm.bytecode.object"] }
            }
        }
    })
}

/// Extract the artifact for `name` from standard-JSON output
///
/// Any entry in `errors` fails compilation, even when contracts were emitted.
pub fn extract_artifact(output: &Value, name: &str) -> Result<CompiledArtifact, CompilerError> {
    if let Some(errors) = output.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string())
                })
                .collect();
            return Err(CompilerError::Compilation(messages.join("\n")));
        }
    }

    let not_found = || CompilerError::SymbolNotFound(name.to_string());

    let contract = output
        .get("contracts")
        .and_then(|c| c.get(SOURCE_UNIT))
        .and_then(|unit| unit.get(name))
        .ok_or_else(not_found)?;

    let bytecode = contract
        .pointer("/evm/bytecode/object")
        .and_then(Value::as_str)
        .filter(|code| !code.is_empty())
        .ok_or_else(not_found)?;
    let bytecode = hex::decode(bytecode.trim()).map_err(|_| not_found())?;

    let abi = contract
        .get("abi")
        .ok_or_else(|| CompilerError::InvalidOutput(format!("{} has no ABI", name)))?;
    let abi = Interface::from_json(abi).map_err(|e| CompilerError::InvalidOutput(e.to_string()))?;

    Ok(CompiledArtifact::new(abi, Bytes::from(bytecode)))
}

/// Compiles one contract from source
pub struct ContractCompiler {
    source: String,
    name: String,
    service: Arc<dyn CompilerService>,
}

impl ContractCompiler {
    /// Create a compiler for the contract `name` defined in `source`, using `solc`
    pub fn new(source: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_service(source, name, Arc::new(SolcCompiler::default()))
    }

    pub fn with_service(
        source: impl Into<String>,
        name: impl Into<String>,
        service: Arc<dyn CompilerService>,
    ) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            service,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compile the source and extract the requested contract
    pub async fn compile_artifact(&self) -> Result<CompiledArtifact, CompilerError> {
        log::info!("Compiling contract {}...", self.name);

        let output = self
            .service
            .compile_standard_json(&standard_json_input(&self.source))
            .await?;
        let artifact = extract_artifact(&output, &self.name)?;

        log::info!(
            "Compiled {}: {} ABI entries, {} bytes of bytecode",
            self.name,
            artifact.abi.len(),
            artifact.bytecode.len()
        );
        Ok(artifact)
    }

    /// Compile and bind a runner to `network` (default `localhost`)
    pub async fn compile(
        &self,
        network: Option<&str>,
        config: &RunnerConfig,
    ) -> Result<ContractRunner<JsonRpcClient>, RunnerError> {
        let artifact = self.compile_artifact().await?;
        ContractRunner::new(
            Arc::new(artifact),
            network.unwrap_or(DEFAULT_NETWORK),
            config,
        )
    }
}
