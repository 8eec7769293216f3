//! Compiled contract artifacts

use crate::contract::abi::Interface;
use alloy_primitives::Bytes;

/// Interface descriptor plus deployable code for one contract symbol
///
/// Produced once by the compiler and never mutated; runners share it
/// through an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledArtifact {
    pub abi: Interface,
    /// Creation (init) bytecode
    pub bytecode: Bytes,
}

impl CompiledArtifact {
    pub fn new(abi: Interface, bytecode: Bytes) -> Self {
        Self { abi, bytecode }
    }

    /// Whether both the interface and the code are present
    pub fn is_deployable(&self) -> bool {
        !self.abi.is_empty() && !self.bytecode.is_empty()
    }
}
