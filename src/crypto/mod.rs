//! Cryptographic utilities
//!
//! ECDSA key management (secp256k1) and Ethereum address derivation.
//! Hashing comes from `alloy_primitives::keccak256`.

pub mod keys;

pub use keys::{public_key_to_address, KeyError, KeyPair, Signature};
