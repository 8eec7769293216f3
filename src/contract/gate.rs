//! Confirmation gates for irreversible operations
//!
//! Before a deployment or a state-changing transaction on the production
//! network, the runner hands a [`GateNotice`] to its [`ConfirmationGate`].
//! The default [`DelayGate`] prints a warning and waits, giving an operator a
//! window to abort the process. Tests swap in [`NoopGate`] or a recording gate.

use crate::core::format_gwei;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Observation delay before a production deployment
pub const DEPLOY_OBSERVATION_DELAY: Duration = Duration::from_secs(5);

/// Observation delay before a production state-changing transaction
pub const TRANSACTION_OBSERVATION_DELAY: Duration = Duration::from_secs(3);

const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Gate errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("Operation refused: {0}")]
    Refused(String),
}

/// What is about to happen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardedOperation {
    Deploy,
    Transaction { method: String },
}

impl fmt::Display for GuardedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardedOperation::Deploy => f.write_str("contract deployment"),
            GuardedOperation::Transaction { method } => {
                write!(f, "state-changing transaction {}", method)
            }
        }
    }
}

/// Details of a guarded operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateNotice {
    pub operation: GuardedOperation,
    /// Network label, e.g. "Ethereum Mainnet"
    pub network: String,
    /// Gas price the operation will pay, in wei
    pub gas_price: u128,
    /// How long to wait before proceeding
    pub delay: Duration,
}

impl GateNotice {
    /// Banner lines shown to the operator
    pub fn warning_lines(&self) -> Vec<String> {
        let headline = match &self.operation {
            GuardedOperation::Deploy => format!(
                "⚠️ WARNING: You are deploying to {}! This will use REAL ETH! ⚠️",
                self.network.to_uppercase()
            ),
            GuardedOperation::Transaction { method } => format!(
                "⚠️ WARNING: You are executing a state-changing transaction ({}) on {}!",
                method,
                self.network.to_uppercase()
            ),
        };
        vec![
            headline,
            format!("Using gas price: {} gwei", format_gwei(self.gas_price)),
        ]
    }
}

/// Decides whether, and when, a guarded operation may proceed
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn hold(&self, notice: &GateNotice) -> Result<(), GateError>;
}

/// Print the warning in red and wait out the notice's delay
#[derive(Debug, Default, Clone, Copy)]
pub struct DelayGate;

#[async_trait]
impl ConfirmationGate for DelayGate {
    async fn hold(&self, notice: &GateNotice) -> Result<(), GateError> {
        for line in notice.warning_lines() {
            log::debug!("{}", line);
            eprintln!("{}{}{}", RED, line, RESET);
        }
        log::info!(
            "Waiting {}s before {} (abort now to cancel)",
            notice.delay.as_secs(),
            notice.operation
        );
        tokio::time::sleep(notice.delay).await;
        log::info!("Proceeding with {}...", notice.operation);
        Ok(())
    }
}

/// Let every operation through immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopGate;

#[async_trait]
impl ConfirmationGate for NoopGate {
    async fn hold(&self, _notice: &GateNotice) -> Result<(), GateError> {
        Ok(())
    }
}
