//! Contract interface descriptor
//!
//! Parses the JSON ABI emitted by the compiler into typed items and provides
//! the name-based method table used to dispatch invocations on a deployed
//! contract.

use alloy_primitives::keccak256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// ABI errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Malformed ABI: {0}")]
    Malformed(String),
    #[error("Unsupported ABI type: {0}")]
    Unsupported(String),
    #[error("Expected {expected} arguments, got {got}")]
    ArgumentCount { expected: usize, got: usize },
    #[error("Type mismatch for {param}: expected {expected}, got {got}")]
    TypeMismatch {
        param: String,
        expected: String,
        got: String,
    },
    #[error("Value out of range for {0}")]
    OutOfRange(String),
    #[error("Cannot parse {value:?} as {kind}")]
    Parse { kind: String, value: String },
    #[error("Invalid return data: {0}")]
    InvalidData(String),
}

/// Declared state mutability of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

impl StateMutability {
    /// Whether calls to a function with this mutability leave state untouched
    pub fn is_read_only(self) -> bool {
        matches!(self, StateMutability::Pure | StateMutability::View)
    }
}

impl fmt::Display for StateMutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateMutability::Pure => "pure",
            StateMutability::View => "view",
            StateMutability::NonPayable => "nonpayable",
            StateMutability::Payable => "payable",
        };
        f.write_str(name)
    }
}

/// Supported Solidity parameter types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    Uint(usize),
    Int(usize),
    Bool,
    Address,
    FixedBytes(usize),
    Bytes,
    String,
    /// `T[]`
    Array(Box<ParamType>),
    /// `T[N]`
    FixedArray(Box<ParamType>, usize),
    /// `(T1,T2,...)`
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Parse a Solidity type name (`uint256`, `uint`, `bytes32[]`, `(uint256,bool)[2]`, ...)
    pub fn parse(kind: &str) -> Result<Self, AbiError> {
        let kind = kind.trim();
        if kind.starts_with('(') {
            let close = matching_paren(kind).ok_or_else(|| AbiError::Unsupported(kind.to_string()))?;
            let members = split_top_level(&kind[1..close])
                .into_iter()
                .map(ParamType::parse)
                .collect::<Result<Vec<_>, _>>()?;
            return Self::with_array_suffix(ParamType::Tuple(members), &kind[close + 1..], kind);
        }

        match kind.find('[') {
            Some(start) => {
                Self::with_array_suffix(Self::parse_elementary(&kind[..start])?, &kind[start..], kind)
            }
            None => Self::parse_elementary(kind),
        }
    }

    fn parse_elementary(kind: &str) -> Result<Self, AbiError> {
        let unsupported = || AbiError::Unsupported(kind.to_string());

        match kind {
            "bool" => return Ok(ParamType::Bool),
            "address" => return Ok(ParamType::Address),
            "bytes" => return Ok(ParamType::Bytes),
            "string" => return Ok(ParamType::String),
            "uint" => return Ok(ParamType::Uint(256)),
            "int" => return Ok(ParamType::Int(256)),
            _ => {}
        }

        if let Some(bits) = kind.strip_prefix("uint") {
            let bits: usize = bits.parse().map_err(|_| unsupported())?;
            if bits == 0 || bits > 256 || bits % 8 != 0 {
                return Err(unsupported());
            }
            return Ok(ParamType::Uint(bits));
        }
        if let Some(bits) = kind.strip_prefix("int") {
            let bits: usize = bits.parse().map_err(|_| unsupported())?;
            if bits == 0 || bits > 256 || bits % 8 != 0 {
                return Err(unsupported());
            }
            return Ok(ParamType::Int(bits));
        }
        if let Some(len) = kind.strip_prefix("bytes") {
            let len: usize = len.parse().map_err(|_| unsupported())?;
            if len == 0 || len > 32 {
                return Err(unsupported());
            }
            return Ok(ParamType::FixedBytes(len));
        }

        Err(unsupported())
    }

    /// Wrap `base` in one array layer per `[]`/`[N]` group, innermost first
    fn with_array_suffix(base: ParamType, suffix: &str, kind: &str) -> Result<Self, AbiError> {
        let unsupported = || AbiError::Unsupported(kind.to_string());
        let mut result = base;
        let mut rest = suffix;

        while !rest.is_empty() {
            let inner = rest.strip_prefix('[').ok_or_else(unsupported)?;
            let close = inner.find(']').ok_or_else(unsupported)?;
            let dimension = &inner[..close];
            result = if dimension.is_empty() {
                ParamType::Array(Box::new(result))
            } else {
                let len: usize = dimension.parse().map_err(|_| unsupported())?;
                if len == 0 {
                    return Err(unsupported());
                }
                ParamType::FixedArray(Box::new(result), len)
            };
            rest = &inner[close + 1..];
        }
        Ok(result)
    }

    /// Dynamic types are encoded in the tail with an offset in the head
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            ParamType::Tuple(members) => members.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }

    /// Bytes the type occupies in the head of an enclosing sequence
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return 32;
        }
        match self {
            ParamType::FixedArray(inner, len) => inner.head_size() * len,
            ParamType::Tuple(members) => members.iter().map(ParamType::head_size).sum(),
            _ => 32,
        }
    }
}

/// Index of the parenthesis closing the one at position 0
fn matching_paren(kind: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in kind.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a tuple body on commas that are not nested in parentheses
fn split_top_level(body: &str) -> Vec<&str> {
    if body.trim().is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Uint(bits) => write!(f, "uint{}", bits),
            ParamType::Int(bits) => write!(f, "int{}", bits),
            ParamType::Bool => f.write_str("bool"),
            ParamType::Address => f.write_str("address"),
            ParamType::FixedBytes(len) => write!(f, "bytes{}", len),
            ParamType::Bytes => f.write_str("bytes"),
            ParamType::String => f.write_str("string"),
            ParamType::Array(inner) => write!(f, "{}[]", inner),
            ParamType::FixedArray(inner, len) => write!(f, "{}[{}]", inner, len),
            ParamType::Tuple(members) => {
                f.write_str("(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", member)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A function or event parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
    /// Members of a `tuple` (struct) parameter
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Param>,
}

impl Param {
    /// Resolve the declared type, expanding `tuple` from its components
    pub fn param_type(&self) -> Result<ParamType, AbiError> {
        match self.kind.strip_prefix("tuple") {
            Some(suffix) => {
                let members = self
                    .components
                    .iter()
                    .map(Param::param_type)
                    .collect::<Result<Vec<_>, _>>()?;
                ParamType::with_array_suffix(ParamType::Tuple(members), suffix, &self.kind)
            }
            None => ParamType::parse(&self.kind),
        }
    }

    /// Canonical type name used in signatures
    fn canonical_kind(&self) -> String {
        self.param_type()
            .map(|t| t.to_string())
            .unwrap_or_else(|_| self.kind.clone())
    }
}

/// A callable contract function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub inputs: Vec<Param>,
    pub outputs: Vec<Param>,
    /// `None` when the compiler output carries no mutability metadata
    pub state_mutability: Option<StateMutability>,
}

impl Function {
    /// Canonical signature, e.g. `setValue(uint256)`
    pub fn signature(&self) -> String {
        let inputs: Vec<String> = self.inputs.iter().map(Param::canonical_kind).collect();
        format!("{}({})", self.name, inputs.join(","))
    }

    /// First four bytes of the keccak hash of the signature
    pub fn selector(&self) -> [u8; 4] {
        let hash = keccak256(self.signature().as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    /// Read-only according to declared metadata, `None` if unknown
    pub fn declared_read_only(&self) -> Option<bool> {
        self.state_mutability.map(StateMutability::is_read_only)
    }

    pub fn input_types(&self) -> Result<Vec<ParamType>, AbiError> {
        self.inputs.iter().map(Param::param_type).collect()
    }

    pub fn output_types(&self) -> Result<Vec<ParamType>, AbiError> {
        self.outputs.iter().map(Param::param_type).collect()
    }
}

/// A contract event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub inputs: Vec<Param>,
    pub anonymous: bool,
}

/// One entry of the interface descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiItem {
    Function(Function),
    Constructor {
        inputs: Vec<Param>,
        state_mutability: Option<StateMutability>,
    },
    Event(Event),
    Error {
        name: String,
        inputs: Vec<Param>,
    },
    Fallback,
    Receive,
}

#[derive(Deserialize)]
struct RawItem {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<Param>,
    #[serde(default)]
    outputs: Vec<Param>,
    #[serde(rename = "stateMutability", default)]
    state_mutability: Option<StateMutability>,
    #[serde(default)]
    constant: Option<bool>,
    #[serde(default)]
    payable: Option<bool>,
    #[serde(default)]
    anonymous: bool,
}

impl RawItem {
    /// Mutability from `stateMutability`, or from pre-0.4.16 `constant`/`payable` flags
    fn mutability(&self) -> Option<StateMutability> {
        if self.state_mutability.is_some() {
            return self.state_mutability;
        }
        match (self.constant, self.payable) {
            (Some(true), _) => Some(StateMutability::View),
            (_, Some(true)) => Some(StateMutability::Payable),
            (Some(false), _) => Some(StateMutability::NonPayable),
            _ => None,
        }
    }

    fn into_item(self) -> Result<AbiItem, AbiError> {
        let state_mutability = self.mutability();
        match self.kind.as_deref().unwrap_or("function") {
            "function" => Ok(AbiItem::Function(Function {
                name: self.name,
                inputs: self.inputs,
                outputs: self.outputs,
                state_mutability,
            })),
            "constructor" => Ok(AbiItem::Constructor {
                inputs: self.inputs,
                state_mutability,
            }),
            "event" => Ok(AbiItem::Event(Event {
                name: self.name,
                inputs: self.inputs,
                anonymous: self.anonymous,
            })),
            "error" => Ok(AbiItem::Error {
                name: self.name,
                inputs: self.inputs,
            }),
            "fallback" => Ok(AbiItem::Fallback),
            "receive" => Ok(AbiItem::Receive),
            other => Err(AbiError::Malformed(format!("unknown item type {:?}", other))),
        }
    }
}

/// The ordered interface descriptor of a compiled contract
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interface {
    items: Vec<AbiItem>,
}

impl Interface {
    pub fn new(items: Vec<AbiItem>) -> Self {
        Self { items }
    }

    /// Parse an ABI JSON array
    pub fn from_json(value: &serde_json::Value) -> Result<Self, AbiError> {
        let raw: Vec<RawItem> = serde_json::from_value(value.clone())
            .map_err(|e| AbiError::Malformed(e.to_string()))?;
        let items = raw
            .into_iter()
            .map(RawItem::into_item)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { items })
    }

    pub fn from_json_str(json: &str) -> Result<Self, AbiError> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| AbiError::Malformed(e.to_string()))?;
        Self::from_json(&value)
    }

    pub fn items(&self) -> &[AbiItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// All functions, in declaration order
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.items.iter().filter_map(|item| match item {
            AbiItem::Function(f) => Some(f),
            _ => None,
        })
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.items.iter().filter_map(|item| match item {
            AbiItem::Event(e) => Some(e),
            _ => None,
        })
    }

    /// Constructor parameters (empty if the contract declares none)
    pub fn constructor_inputs(&self) -> &[Param] {
        self.items
            .iter()
            .find_map(|item| match item {
                AbiItem::Constructor { inputs, .. } => Some(inputs.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

/// Method lookup failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no method named {0}")]
    NotFound(String),
    #[error("no overload of {name} takes {got} arguments (available: {available:?})")]
    Arity {
        name: String,
        got: usize,
        available: Vec<usize>,
    },
}

/// Name-based dispatch table built from an interface descriptor
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    methods: HashMap<String, Vec<Function>>,
}

impl MethodTable {
    pub fn from_interface(interface: &Interface) -> Self {
        let mut methods: HashMap<String, Vec<Function>> = HashMap::new();
        for function in interface.functions() {
            methods
                .entry(function.name.clone())
                .or_default()
                .push(function.clone());
        }
        Self { methods }
    }

    /// Resolve a method by name, picking the overload matching the argument count
    pub fn resolve(&self, name: &str, arg_count: usize) -> Result<&Function, LookupError> {
        let overloads = self
            .methods
            .get(name)
            .ok_or_else(|| LookupError::NotFound(name.to_string()))?;

        overloads
            .iter()
            .find(|f| f.inputs.len() == arg_count)
            .ok_or_else(|| LookupError::Arity {
                name: name.to_string(),
                got: arg_count,
                available: overloads.iter().map(|f| f.inputs.len()).collect(),
            })
    }
}
