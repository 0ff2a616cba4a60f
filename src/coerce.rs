//! Turning what a user typed into an argument value.
//!
//! Rules are tried in order and the first that matches wins:
//!
//! 1. `true` / `false` become booleans
//! 2. anything that parses as JSON becomes that JSON value, unless the
//!    result is empty (`null`, `0`, `""`) in which case the raw text goes on
//! 3. an amount with a currency suffix (`1.5eth`, `20 gwei`) becomes its
//!    value in wei, as a decimal string
//! 4. everything else is passed through as a string
//!
//! The result is loosely typed; binding it against the declared parameter
//! type happens in [`crate::abi::AbiToken::from_json`].

use crate::units::parse_amount;
use crate::Error;
use serde_json::Value;

pub fn coerce_argument(raw: &str) -> Result<Value, Error> {
    match raw {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }

    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        if is_integer_beyond_f64(raw, &parsed) {
            // floats would silently eat the low digits of a big integer
            return Ok(Value::String(raw.trim().to_string()));
        }
        if !is_empty_json(&parsed) {
            return Ok(parsed);
        }
    }

    if let Some(amount) = parse_amount(raw) {
        return Ok(Value::String(amount?.to_string()));
    }

    Ok(Value::String(raw.to_string()))
}

/// Coerces every argument in order, stopping at the first bad amount
pub fn coerce_arguments(raw: &[String]) -> Result<Vec<Value>, Error> {
    raw.iter().map(|arg| coerce_argument(arg)).collect()
}

fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn is_integer_beyond_f64(raw: &str, parsed: &Value) -> bool {
    match parsed {
        Value::Number(n) => {
            let text = raw.trim();
            let digits = text.strip_prefix('-').unwrap_or(text);
            !n.is_u64() && !n.is_i64() && digits.chars().all(|c| c.is_ascii_digit())
        }
        _ => false,
    }
}
