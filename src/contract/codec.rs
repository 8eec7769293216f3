//! ABI value encoding
//!
//! Encodes call arguments and decodes return data following the Solidity
//! contract ABI. Static values occupy their head slots in place; dynamic
//! values (`bytes`, `string`, `T[]` and anything containing them) are
//! referenced from the head by offset and stored in the tail.

use crate::contract::abi::{AbiError, Function, ParamType};
use alloy_primitives::{hex, Address, Bytes, U256};
use std::fmt;

const WORD: usize = 32;

/// A typed ABI value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Uint(U256),
    Int(i128),
    Bool(bool),
    Address(Address),
    FixedBytes(Vec<u8>),
    Bytes(Bytes),
    String(String),
    Array(Vec<AbiValue>),
    FixedArray(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    fn kind(&self) -> &'static str {
        match self {
            AbiValue::Uint(_) => "uint",
            AbiValue::Int(_) => "int",
            AbiValue::Bool(_) => "bool",
            AbiValue::Address(_) => "address",
            AbiValue::FixedBytes(_) => "fixed bytes",
            AbiValue::Bytes(_) => "bytes",
            AbiValue::String(_) => "string",
            AbiValue::Array(_) => "array",
            AbiValue::FixedArray(_) => "fixed array",
            AbiValue::Tuple(_) => "tuple",
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, open: &str, items: &[AbiValue], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(close)
}

impl fmt::Display for AbiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiValue::Uint(v) => write!(f, "{}", v),
            AbiValue::Int(v) => write!(f, "{}", v),
            AbiValue::Bool(v) => write!(f, "{}", v),
            AbiValue::Address(a) => write!(f, "{}", a),
            AbiValue::FixedBytes(b) => f.write_str(&hex::encode_prefixed(b)),
            AbiValue::Bytes(b) => f.write_str(&hex::encode_prefixed(b)),
            AbiValue::String(s) => f.write_str(s),
            AbiValue::Array(items) | AbiValue::FixedArray(items) => write_list(f, "[", items, "]"),
            AbiValue::Tuple(items) => write_list(f, "(", items, ")"),
        }
    }
}

impl From<u64> for AbiValue {
    fn from(value: u64) -> Self {
        AbiValue::Uint(U256::from(value))
    }
}

impl From<U256> for AbiValue {
    fn from(value: U256) -> Self {
        AbiValue::Uint(value)
    }
}

impl From<bool> for AbiValue {
    fn from(value: bool) -> Self {
        AbiValue::Bool(value)
    }
}

impl From<Address> for AbiValue {
    fn from(value: Address) -> Self {
        AbiValue::Address(value)
    }
}

impl From<&str> for AbiValue {
    fn from(value: &str) -> Self {
        AbiValue::String(value.to_string())
    }
}

impl From<Vec<AbiValue>> for AbiValue {
    fn from(items: Vec<AbiValue>) -> Self {
        AbiValue::Array(items)
    }
}

/// Encode calldata for a function call: selector followed by the arguments
pub fn encode_call(function: &Function, args: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    let types = function.input_types()?;
    let mut data = function.selector().to_vec();
    data.extend(encode(&types, args)?);
    Ok(data)
}

/// Encode a sequence of values against their declared types
pub fn encode(types: &[ParamType], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    check_count(types.len(), values.len())?;
    encode_sequence(types, values)
}

fn check_count(expected: usize, got: usize) -> Result<(), AbiError> {
    if expected != got {
        return Err(AbiError::ArgumentCount { expected, got });
    }
    Ok(())
}

fn encode_sequence(types: &[ParamType], values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
    let head_size: usize = types.iter().map(ParamType::head_size).sum();
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for (kind, value) in types.iter().zip(values) {
        if kind.is_dynamic() {
            head.extend_from_slice(&u256_word(U256::from(head_size + tail.len())));
            tail.extend(encode_value(kind, value)?);
        } else {
            head.extend(encode_value(kind, value)?);
        }
    }

    head.extend(tail);
    Ok(head)
}

fn encode_value(kind: &ParamType, value: &AbiValue) -> Result<Vec<u8>, AbiError> {
    match (kind, value) {
        (ParamType::Bytes, AbiValue::Bytes(b)) => Ok(encode_byte_string(b)),
        (ParamType::String, AbiValue::String(s)) => Ok(encode_byte_string(s.as_bytes())),
        (ParamType::Array(inner), AbiValue::Array(items)) => {
            let types = vec![(**inner).clone(); items.len()];
            let mut out = u256_word(U256::from(items.len())).to_vec();
            out.extend(encode_sequence(&types, items)?);
            Ok(out)
        }
        (ParamType::FixedArray(inner, len), AbiValue::FixedArray(items) | AbiValue::Array(items)) => {
            check_count(*len, items.len())?;
            encode_sequence(&vec![(**inner).clone(); *len], items)
        }
        (ParamType::Tuple(types), AbiValue::Tuple(items)) => {
            check_count(types.len(), items.len())?;
            encode_sequence(types, items)
        }
        _ => encode_static(kind, value).map(|word| word.to_vec()),
    }
}

fn mismatch(kind: &ParamType, value: &AbiValue) -> AbiError {
    AbiError::TypeMismatch {
        param: kind.to_string(),
        expected: kind.to_string(),
        got: value.kind().to_string(),
    }
}

fn u256_word(value: U256) -> [u8; WORD] {
    value.to_be_bytes::<WORD>()
}

fn encode_static(kind: &ParamType, value: &AbiValue) -> Result<[u8; WORD], AbiError> {
    let mut word = [0u8; WORD];
    match (kind, value) {
        (ParamType::Uint(bits), AbiValue::Uint(v)) => {
            if v.bit_len() > *bits {
                return Err(AbiError::OutOfRange(kind.to_string()));
            }
            word = u256_word(*v);
        }
        (ParamType::Uint(bits), AbiValue::Int(v)) if *v >= 0 => {
            return encode_static(&ParamType::Uint(*bits), &AbiValue::Uint(U256::from(*v as u128)));
        }
        (ParamType::Int(bits), AbiValue::Int(v)) => {
            if *bits < 128 {
                let min = -(1i128 << (bits - 1));
                let max = (1i128 << (bits - 1)) - 1;
                if *v < min || *v > max {
                    return Err(AbiError::OutOfRange(kind.to_string()));
                }
            }
            if *v < 0 {
                word[..16].fill(0xff);
            }
            word[16..].copy_from_slice(&v.to_be_bytes());
        }
        (ParamType::Int(bits), AbiValue::Uint(v)) => {
            let v = i128::try_from(*v).map_err(|_| AbiError::OutOfRange(kind.to_string()))?;
            return encode_static(&ParamType::Int(*bits), &AbiValue::Int(v));
        }
        (ParamType::Bool, AbiValue::Bool(v)) => {
            word[31] = u8::from(*v);
        }
        (ParamType::Address, AbiValue::Address(a)) => {
            word[12..].copy_from_slice(a.as_slice());
        }
        (ParamType::FixedBytes(len), AbiValue::FixedBytes(b)) => {
            if b.len() != *len {
                return Err(AbiError::OutOfRange(kind.to_string()));
            }
            word[..*len].copy_from_slice(b);
        }
        _ => return Err(mismatch(kind, value)),
    }
    Ok(word)
}

fn encode_byte_string(bytes: &[u8]) -> Vec<u8> {
    let padded_len = bytes.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(WORD + padded_len);
    out.extend_from_slice(&u256_word(U256::from(bytes.len())));
    out.extend_from_slice(bytes);
    out.resize(WORD + padded_len, 0);
    out
}

/// Decode return data against the declared output types
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    decode_sequence(types, data)
}

/// Decode the return data of a function call
pub fn decode_output(function: &Function, data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    decode(&function.output_types()?, data)
}

/// Decode values laid out from the start of `data`; offsets are relative to it
fn decode_sequence(types: &[ParamType], data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
    let head_size: usize = types.iter().map(ParamType::head_size).sum();
    if data.len() < head_size {
        return Err(AbiError::InvalidData(format!(
            "expected at least {} bytes, got {}",
            head_size,
            data.len()
        )));
    }

    let mut position = 0;
    let mut values = Vec::with_capacity(types.len());
    for kind in types {
        let size = kind.head_size();
        let value = if kind.is_dynamic() {
            let offset = read_usize(&data[position..position + WORD])?;
            let tail = data
                .get(offset..)
                .ok_or_else(|| AbiError::InvalidData(format!("offset {} out of bounds", offset)))?;
            decode_value(kind, tail)?
        } else {
            decode_value(kind, &data[position..position + size])?
        };
        values.push(value);
        position += size;
    }
    Ok(values)
}

fn decode_value(kind: &ParamType, data: &[u8]) -> Result<AbiValue, AbiError> {
    match kind {
        ParamType::Bytes | ParamType::String => {
            let len = read_usize(word_at(data, 0)?)?;
            let bytes = data
                .get(WORD..WORD + len)
                .ok_or_else(|| AbiError::InvalidData(format!("length {} out of bounds", len)))?
                .to_vec();
            match kind {
                ParamType::Bytes => Ok(AbiValue::Bytes(Bytes::from(bytes))),
                _ => String::from_utf8(bytes)
                    .map(AbiValue::String)
                    .map_err(|e| AbiError::InvalidData(e.to_string())),
            }
        }
        ParamType::Array(inner) => {
            let len = read_usize(word_at(data, 0)?)?;
            let items = &data[WORD..];
            if len.saturating_mul(inner.head_size()) > items.len() {
                return Err(AbiError::InvalidData(format!(
                    "array of {} elements does not fit in {} bytes",
                    len,
                    items.len()
                )));
            }
            decode_sequence(&vec![(**inner).clone(); len], items).map(AbiValue::Array)
        }
        ParamType::FixedArray(inner, len) => {
            decode_sequence(&vec![(**inner).clone(); *len], data).map(AbiValue::FixedArray)
        }
        ParamType::Tuple(members) => decode_sequence(members, data).map(AbiValue::Tuple),
        _ => decode_static(kind, word_at(data, 0)?),
    }
}

fn word_at(data: &[u8], start: usize) -> Result<&[u8], AbiError> {
    data.get(start..start + WORD)
        .ok_or_else(|| AbiError::InvalidData(format!("word at {} out of bounds", start)))
}

fn decode_static(kind: &ParamType, word: &[u8]) -> Result<AbiValue, AbiError> {
    let value = match kind {
        ParamType::Uint(_) => AbiValue::Uint(U256::from_be_slice(word)),
        ParamType::Int(_) => {
            let negative = word[16] & 0x80 != 0;
            let fill = if negative { 0xff } else { 0x00 };
            if word[..16].iter().any(|b| *b != fill) {
                return Err(AbiError::InvalidData(format!(
                    "{} value does not fit in 128 bits",
                    kind
                )));
            }
            let mut low = [0u8; 16];
            low.copy_from_slice(&word[16..]);
            AbiValue::Int(i128::from_be_bytes(low))
        }
        ParamType::Bool => AbiValue::Bool(word[31] != 0),
        ParamType::Address => AbiValue::Address(Address::from_slice(&word[12..])),
        ParamType::FixedBytes(len) => AbiValue::FixedBytes(word[..*len].to_vec()),
        _ => return Err(AbiError::InvalidData(format!("{} is not a single word", kind))),
    };
    Ok(value)
}

fn read_usize(word: &[u8]) -> Result<usize, AbiError> {
    let value = U256::from_be_slice(word);
    if value.bit_len() > 32 {
        return Err(AbiError::InvalidData(format!("offset {} too large", value)));
    }
    usize::try_from(value).map_err(|_| AbiError::InvalidData(format!("offset {} too large", value)))
}
