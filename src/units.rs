use crate::Error;
use num256::Uint256;
use std::str::FromStr;

/// Currency units an argument may be written in
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Unit {
    Wei,
    Gwei,
    Ether,
}

/// Recognised suffixes, longest first so `ether` is not read as `eth`
const SUFFIXES: [(&str, Unit); 4] = [
    ("ether", Unit::Ether),
    ("eth", Unit::Ether),
    ("gwei", Unit::Gwei),
    ("wei", Unit::Wei),
];

impl Unit {
    /// Decimal places between this unit and wei
    pub fn decimals(&self) -> usize {
        match self {
            Unit::Wei => 0,
            Unit::Gwei => 9,
            Unit::Ether => 18,
        }
    }
}

/// Splits a trailing unit off `input`, returning the trimmed amount
pub fn strip_unit_suffix(input: &str) -> Option<(&str, Unit)> {
    let input = input.trim();
    SUFFIXES.iter().find_map(|(suffix, unit)| {
        input
            .strip_suffix(suffix)
            .map(|amount| (amount.trim(), *unit))
    })
}

/// Converts a decimal amount of `unit` to wei without going through floats.
/// `1.5` ether is fine, `0.0000000001` gwei is not.
pub fn to_base_units(amount: &str, unit: Unit) -> Result<Uint256, Error> {
    let invalid = || Error::InvalidAmount(amount.to_string());
    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }
    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > unit.decimals() {
        return Err(invalid());
    }

    let mut digits = String::with_capacity(whole.len() + unit.decimals());
    digits.push_str(whole);
    digits.push_str(fraction);
    for _ in fraction.len()..unit.decimals() {
        digits.push('0');
    }
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(0u8.into());
    }
    // 2^256 has 78 digits
    if digits.len() > 78 {
        return Err(invalid());
    }
    let value = Uint256::from_str(digits).map_err(|_| invalid())?;
    // anything between 2^256 and 10^78 must not wrap around
    if value.to_string() != digits {
        return Err(invalid());
    }
    Ok(value)
}

/// Parses strings like `1.5eth` or `20 gwei` into wei. Returns `None`
/// when there is no unit suffix or the amount is not a decimal number.
pub fn parse_amount(input: &str) -> Option<Result<Uint256, Error>> {
    let (amount, unit) = strip_unit_suffix(input)?;
    let looks_numeric = !amount.is_empty()
        && amount.chars().all(|c| c.is_ascii_digit() || c == '.')
        && amount.chars().any(|c| c.is_ascii_digit());
    if !looks_numeric {
        return None;
    }
    Some(to_base_units(amount, unit))
}

/// `1 ether` in wei
pub fn one_eth() -> Uint256 {
    1_000_000_000_000_000_000u64.into()
}

#[test]
fn strip_suffixes() {
    assert_eq!(strip_unit_suffix("1.5eth"), Some(("1.5", Unit::Ether)));
    assert_eq!(strip_unit_suffix(" 2 ether "), Some(("2", Unit::Ether)));
    assert_eq!(strip_unit_suffix("20 gwei"), Some(("20", Unit::Gwei)));
    assert_eq!(strip_unit_suffix("7wei"), Some(("7", Unit::Wei)));
    assert_eq!(strip_unit_suffix("hello"), None);
    // case sensitive
    assert_eq!(strip_unit_suffix("1ETH"), None);
}

#[test]
fn convert_exactly() {
    assert_eq!(
        to_base_units("3.5", Unit::Ether).unwrap(),
        Uint256::from(3_500_000_000_000_000_000u64)
    );
    assert_eq!(to_base_units("1", Unit::Ether).unwrap(), one_eth());
    assert_eq!(to_base_units("0.1", Unit::Gwei).unwrap(), Uint256::from(100_000_000u64));
    assert_eq!(to_base_units("12", Unit::Wei).unwrap(), Uint256::from(12u64));
    assert_eq!(to_base_units(".5", Unit::Gwei).unwrap(), Uint256::from(500_000_000u64));
    assert_eq!(to_base_units("0", Unit::Ether).unwrap(), Uint256::from(0u64));
    assert!(to_base_units("1.50", Unit::Wei).is_err());
}

#[test]
fn reject_bad_amounts() {
    assert!(to_base_units("0.0000000001", Unit::Gwei).is_err());
    assert!(to_base_units("1.2.3", Unit::Ether).is_err());
    assert!(to_base_units("-1", Unit::Ether).is_err());
    assert!(to_base_units(".", Unit::Ether).is_err());
    assert!(to_base_units(&"9".repeat(70), Unit::Ether).is_err());
}

#[test]
fn parse_amounts() {
    assert_eq!(
        parse_amount("1eth").unwrap().unwrap(),
        Uint256::from(1_000_000_000_000_000_000u64)
    );
    assert!(parse_amount("1.5").is_none());
    assert!(parse_amount("seth").is_none());
    assert!(parse_amount("eth").is_none());
    assert!(parse_amount("0.0000000000000000001eth").unwrap().is_err());
}
