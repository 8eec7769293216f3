//! Core chain primitives
//!
//! This module contains the transaction building blocks used by the
//! contract runner:
//! - RLP encoding
//! - Legacy transactions with EIP-155 replay protection
//! - Ether unit formatting

pub mod rlp;
pub mod transaction;
pub mod units;

pub use rlp::RlpItem;
pub use transaction::{SignedTransaction, TransactionRequest, TxHash};
pub use units::{format_ether, format_gwei, format_units, ETHER, GWEI};
