//! Built-in example contract
//!
//! A single `uint256` state variable initialised to 42, with a public getter
//! and a setter. Used by the CLI when no source file is given.

/// Name of the example contract
pub const EXAMPLE_CONTRACT_NAME: &str = "TestContract";

/// Solidity source of the example contract
pub const EXAMPLE_CONTRACT: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.0;

contract TestContract {
    uint256 public value;

    constructor() {
        value = 42;
    }

    function setValue(uint256 newValue) public {
        value = newValue;
    }
}
"#;
