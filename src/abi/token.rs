use crate::abi::param_type::ParamType;
use crate::utils::{bytes_to_data, hex_str_to_bytes};
use crate::{Address, Error};
use num256::Uint256;
use num_traits::{Bounded, Num, Zero};
use serde_json::Value;
use std::str::FromStr;

/// A token represents a value of parameter of the contract call.
///
/// Signed integers are kept as their two's complement 256 bit word, which
/// is exactly what ends up on the wire.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AbiToken {
    Uint(Uint256),
    Int(Uint256),
    Address(Address),
    Bool(bool),
    String(String),
    /// Dynamic `bytes`
    UnboundedBytes(Vec<u8>),
    /// `bytesN`, at most 32 bytes
    Bytes(Vec<u8>),
    /// `T[]`
    Dynamic(Vec<AbiToken>),
    /// `T[k]`
    FixedArray(Vec<AbiToken>),
    Struct(Vec<AbiToken>),
}

impl From<Uint256> for AbiToken {
    fn from(v: Uint256) -> AbiToken {
        AbiToken::Uint(v)
    }
}

impl From<u64> for AbiToken {
    fn from(v: u64) -> AbiToken {
        AbiToken::Uint(v.into())
    }
}

impl From<bool> for AbiToken {
    fn from(v: bool) -> AbiToken {
        AbiToken::Bool(v)
    }
}

impl From<Address> for AbiToken {
    fn from(v: Address) -> AbiToken {
        AbiToken::Address(v)
    }
}

impl From<&str> for AbiToken {
    fn from(v: &str) -> AbiToken {
        AbiToken::String(v.to_string())
    }
}

impl AbiToken {
    /// Binds a loosely typed JSON argument to the declared parameter type.
    pub fn from_json(kind: &ParamType, value: &Value) -> Result<AbiToken, Error> {
        match kind {
            ParamType::Uint(bits) => {
                let (negative, magnitude) = json_integer(kind, value)?;
                if negative && !magnitude.is_zero() {
                    return Err(Error::bad_argument(kind, "negative value"));
                }
                if *bits < 256 && magnitude >= pow2(*bits) {
                    return Err(Error::bad_argument(kind, "value out of range"));
                }
                Ok(AbiToken::Uint(magnitude))
            }
            ParamType::Int(bits) => {
                let (negative, magnitude) = json_integer(kind, value)?;
                let limit = pow2(bits - 1);
                if magnitude.is_zero() {
                    Ok(AbiToken::Int(magnitude))
                } else if negative {
                    if magnitude > limit {
                        return Err(Error::bad_argument(kind, "value out of range"));
                    }
                    let one: Uint256 = 1u8.into();
                    Ok(AbiToken::Int(Uint256::max_value() - (magnitude - one)))
                } else {
                    if magnitude >= limit {
                        return Err(Error::bad_argument(kind, "value out of range"));
                    }
                    Ok(AbiToken::Int(magnitude))
                }
            }
            ParamType::Address => match value {
                Value::String(s) => Ok(AbiToken::Address(Address::parse_and_validate(s.trim())?)),
                _ => Err(Error::bad_argument(kind, "expected an address string")),
            },
            ParamType::Bool => match value {
                Value::Bool(b) => Ok(AbiToken::Bool(*b)),
                Value::String(s) if s == "true" => Ok(AbiToken::Bool(true)),
                Value::String(s) if s == "false" => Ok(AbiToken::Bool(false)),
                _ => Err(Error::bad_argument(kind, "expected true or false")),
            },
            ParamType::String => match value {
                Value::String(s) => Ok(AbiToken::String(s.clone())),
                // "42" went through coercion and came back as a number
                Value::Number(n) => Ok(AbiToken::String(n.to_string())),
                Value::Bool(b) => Ok(AbiToken::String(b.to_string())),
                _ => Err(Error::bad_argument(kind, "expected a string")),
            },
            ParamType::Bytes => Ok(AbiToken::UnboundedBytes(json_bytes(kind, value)?)),
            ParamType::FixedBytes(size) => {
                let bytes = json_bytes(kind, value)?;
                if bytes.len() > *size {
                    return Err(Error::bad_argument(
                        kind,
                        format!("{} bytes do not fit", bytes.len()),
                    ));
                }
                Ok(AbiToken::Bytes(bytes))
            }
            ParamType::Array(inner) => {
                let values = json_array(kind, value)?;
                Ok(AbiToken::Dynamic(
                    values
                        .iter()
                        .map(|v| AbiToken::from_json(inner, v))
                        .collect::<Result<_, _>>()?,
                ))
            }
            ParamType::FixedArray(inner, size) => {
                let values = json_array(kind, value)?;
                if values.len() != *size {
                    return Err(Error::bad_argument(
                        kind,
                        format!("expected {size} elements, got {}", values.len()),
                    ));
                }
                Ok(AbiToken::FixedArray(
                    values
                        .iter()
                        .map(|v| AbiToken::from_json(inner, v))
                        .collect::<Result<_, _>>()?,
                ))
            }
            ParamType::Tuple(members) => {
                let values = json_array(kind, value)?;
                if values.len() != members.len() {
                    return Err(Error::bad_argument(
                        kind,
                        format!("expected {} members, got {}", members.len(), values.len()),
                    ));
                }
                Ok(AbiToken::Struct(
                    members
                        .iter()
                        .zip(values.iter())
                        .map(|(m, v)| AbiToken::from_json(m, v))
                        .collect::<Result<_, _>>()?,
                ))
            }
        }
    }

    /// JSON rendering for display. Integers become decimal strings so
    /// nothing is lost to floating point on the way out.
    pub fn to_json(&self) -> Value {
        match self {
            AbiToken::Uint(v) => Value::String(v.to_string()),
            AbiToken::Int(v) => Value::String(signed_to_string(v)),
            AbiToken::Address(a) => Value::String(a.to_string()),
            AbiToken::Bool(b) => Value::Bool(*b),
            AbiToken::String(s) => Value::String(s.clone()),
            AbiToken::UnboundedBytes(b) | AbiToken::Bytes(b) => Value::String(bytes_to_data(b)),
            AbiToken::Dynamic(items) | AbiToken::FixedArray(items) | AbiToken::Struct(items) => {
                Value::Array(items.iter().map(AbiToken::to_json).collect())
            }
        }
    }

    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiToken::String(_) | AbiToken::UnboundedBytes(_) | AbiToken::Dynamic(_) => true,
            AbiToken::FixedArray(items) | AbiToken::Struct(items) => {
                items.iter().any(AbiToken::is_dynamic)
            }
            _ => false,
        }
    }
}

/// 2^bits for bits below 256
fn pow2(bits: usize) -> Uint256 {
    let mut bytes = [0u8; 32];
    bytes[31 - bits / 8] = 1 << (bits % 8);
    Uint256::from_be_bytes(&bytes)
}

fn signed_to_string(word: &Uint256) -> String {
    if word.to_be_bytes()[0] & 0x80 == 0 {
        return word.to_string();
    }
    let one: Uint256 = 1u8.into();
    format!("-{}", (Uint256::max_value() - *word) + one)
}

/// Sign and magnitude of an integer argument given as a JSON number,
/// a decimal string or a `0x` hex string
fn json_integer(kind: &ParamType, value: &Value) -> Result<(bool, Uint256), Error> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(Error::bad_argument(kind, "expected an integer")),
    };
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    let parsed = match digits.strip_prefix("0x") {
        Some(hex) => Uint256::from_str_radix(hex, 16),
        None => {
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(Error::bad_argument(kind, format!("{text} is not an integer")));
            }
            Uint256::from_str(digits)
        }
    };
    match parsed {
        Ok(v) => Ok((negative, v)),
        Err(_) => Err(Error::bad_argument(kind, format!("{text} is not an integer"))),
    }
}

fn json_bytes(kind: &ParamType, value: &Value) -> Result<Vec<u8>, Error> {
    match value {
        Value::String(s) if s.starts_with("0x") => hex_str_to_bytes(s),
        _ => Err(Error::bad_argument(kind, "expected 0x prefixed hex")),
    }
}

/// Arrays and tuples come either as JSON arrays or, when typed into a
/// read call, as the text of one
fn json_array(kind: &ParamType, value: &Value) -> Result<Vec<Value>, Error> {
    match value {
        Value::Array(values) => Ok(values.clone()),
        Value::String(s) => match serde_json::from_str(s) {
            Ok(Value::Array(values)) => Ok(values),
            _ => Err(Error::bad_argument(kind, "expected an array")),
        },
        _ => Err(Error::bad_argument(kind, "expected an array")),
    }
}
