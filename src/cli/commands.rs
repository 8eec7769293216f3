//! CLI commands for the contract runner
//!
//! Implements the command handlers behind `solrunner compile` and
//! `solrunner run`.

use crate::config::RunnerConfig;
use crate::contract::{
    AbiItem, AbiValue, ContractCompiler, ContractRunner, EXAMPLE_CONTRACT, EXAMPLE_CONTRACT_NAME,
};
use crate::network::{ChainClient, Network, LOCALHOST_RPC_URL};
use std::fs;
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Contract source and the symbol to build from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub source: String,
    pub contract: String,
}

impl SourceSpec {
    /// Read `file`, or fall back to the built-in example contract
    pub fn load(file: Option<&Path>, contract: Option<&str>) -> CliResult<Self> {
        let source = match file {
            Some(path) => fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?,
            None => EXAMPLE_CONTRACT.to_string(),
        };
        if source.trim().is_empty() {
            return Err("contract source is empty".into());
        }

        Ok(Self {
            source,
            contract: contract.unwrap_or(EXAMPLE_CONTRACT_NAME).to_string(),
        })
    }

    fn compiler(&self) -> ContractCompiler {
        ContractCompiler::new(self.source.clone(), self.contract.clone())
    }
}

/// Compile a contract and print its interface
pub async fn cmd_compile(spec: &SourceSpec) -> CliResult<()> {
    println!("🔨 Compiling contract {}...", spec.contract);
    let artifact = spec.compiler().compile_artifact().await?;

    println!("✅ Compiled successfully!");
    println!("   Bytecode: {} bytes", artifact.bytecode.len());
    println!("   Interface:");
    for item in artifact.abi.items() {
        match item {
            AbiItem::Function(function) => {
                let mutability = function
                    .state_mutability
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                println!("   - function {} [{}]", function.signature(), mutability);
            }
            AbiItem::Event(event) => println!("   - event {}", event.name),
            AbiItem::Constructor { inputs, .. } => {
                println!("   - constructor ({} arguments)", inputs.len())
            }
            _ => {}
        }
    }
    Ok(())
}

/// Compile, deploy and exercise a contract on the selected network
pub async fn cmd_run(spec: &SourceSpec, network: &str, config: &RunnerConfig) -> CliResult<()> {
    println!("Compiling contract...");
    let mut runner = spec.compiler().compile(Some(network), config).await?;

    println!("Deploying contract...");
    runner.deploy().await?;

    let address = runner.address()?;
    println!("Contract deployed to: {}", address);

    print_explorer_hint(runner.network(), &address.to_checksum(None));

    exercise(&runner).await
}

fn print_explorer_hint(network: Network, address: &str) {
    println!("\n📋 Contract Explorer:");
    match network.explorer_url(address) {
        Some(url) => println!("{}", url),
        None => {
            println!(
                "Check if you are running on localhost: {}/#/address/{}",
                LOCALHOST_RPC_URL, address
            );
            println!("(For testnet deployment, run: solrunner run --network sepolia)");
            println!("(For mainnet deployment, run: solrunner run --network mainnet)");
        }
    }
}

/// Read `value`, then on non-production networks set it to 100 and read it back
async fn exercise<C: ChainClient>(runner: &ContractRunner<C>) -> CliResult<()> {
    println!("\nTesting contract...");
    let current = runner.invoke("value", &[]).await?;
    if let Some(value) = current.value() {
        println!("Initial value: {}", value);
    }

    if runner.network().is_production() {
        println!(
            "Skipping state-modifying calls on {} for safety.",
            runner.profile().label
        );
        return Ok(());
    }

    runner.invoke("setValue", &[AbiValue::from(100u64)]).await?;
    let updated = runner.invoke("value", &[]).await?;
    if let Some(value) = updated.value() {
        println!("New value: {}", value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::abi::tests::TEST_CONTRACT_ABI;
    use crate::contract::{CompiledArtifact, Interface};
    use crate::contract::gate::tests::RecordingGate;
    use crate::crypto::KeyPair;
    use crate::network::mock::MockChain;
    use alloy_primitives::{Bytes, U256};
    use std::sync::Arc;

    #[test]
    fn test_load_defaults_to_example() {
        let spec = SourceSpec::load(None, None).unwrap();
        assert_eq!(spec.contract, "TestContract");
        assert!(spec.source.contains("contract TestContract"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Counter.sol");
        fs::write(&path, "contract Counter {}").unwrap();

        let spec = SourceSpec::load(Some(path.as_path()), Some("Counter")).unwrap();
        assert_eq!(spec.source, "contract Counter {}");
        assert_eq!(spec.contract, "Counter");

        assert!(SourceSpec::load(Some(dir.path().join("missing.sol").as_path()), None).is_err());

        let empty = dir.path().join("Empty.sol");
        fs::write(&empty, "  \n").unwrap();
        assert!(SourceSpec::load(Some(empty.as_path()), None).is_err());
    }

    fn runner_on(network: &str, chain_id: u64) -> ContractRunner<MockChain> {
        let config = RunnerConfig::default();
        let chain = MockChain::new();
        chain.set_chain_id(chain_id);
        let signer = KeyPair::from_private_key_hex(config.local_key()).unwrap();
        chain.fund(signer.address(), 1_000_000_000_000_000_000);

        let artifact = Arc::new(CompiledArtifact::new(
            Interface::from_json_str(TEST_CONTRACT_ABI).unwrap(),
            Bytes::from_static(&[0x60, 0x80]),
        ));
        ContractRunner::with_client(artifact, network, &config, chain)
            .unwrap()
            .with_gate(Arc::new(RecordingGate::default()))
    }

    #[tokio::test]
    async fn test_exercise_sets_value_off_mainnet() {
        let mut runner = runner_on("localhost", 31337);
        runner.deploy().await.unwrap();

        exercise(&runner).await.unwrap();

        let read = runner.invoke("value", &[]).await.unwrap();
        assert_eq!(read.value(), Some(&AbiValue::Uint(U256::from(100u64))));
    }

    #[tokio::test]
    async fn test_exercise_skips_writes_on_mainnet() {
        let mut runner = runner_on("mainnet", 1);
        runner.deploy().await.unwrap();

        exercise(&runner).await.unwrap();

        let read = runner.invoke("value", &[]).await.unwrap();
        assert_eq!(read.value(), Some(&AbiValue::Uint(U256::from(42u64))));
    }
}
