//! Solrunner CLI Application
//!
//! A command-line interface for compiling and running Solidity contracts.

use clap::{Parser, Subcommand};
use solrunner::cli::{self, SourceSpec};
use solrunner::config::RunnerConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "solrunner")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Compile, deploy and drive Solidity contracts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a contract and show its interface
    Compile {
        /// Solidity source file (defaults to the built-in example contract)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Contract to build from the source
        #[arg(short, long)]
        contract: Option<String>,
    },

    /// Compile, deploy and exercise a contract
    Run {
        /// Solidity source file (defaults to the built-in example contract)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Contract to build from the source
        #[arg(short, long)]
        contract: Option<String>,

        /// Target network: localhost, sepolia or mainnet
        #[arg(short, long, default_value = "localhost")]
        network: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        match cli.command {
            Commands::Compile { file, contract } => {
                let spec = SourceSpec::load(file.as_deref(), contract.as_deref())?;
                cli::cmd_compile(&spec).await?;
            }

            Commands::Run {
                file,
                contract,
                network,
            } => {
                let spec = SourceSpec::load(file.as_deref(), contract.as_deref())?;
                let config = RunnerConfig::from_env();
                cli::cmd_run(&spec, &network, &config).await?;
            }
        }

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}
