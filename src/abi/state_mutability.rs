use serde::de::Visitor;
use serde::de::{self, Deserialize, Deserializer, Unexpected};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StateMutability {
    /// Specified to not read blockchain state
    Pure,
    /// Specified to not modify the blockchain state
    View,
    /// Function does not accept ether
    Nonpayable,
    /// Function accepts ether
    Payable,
}

impl StateMutability {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateMutability::Pure => "pure",
            StateMutability::View => "view",
            StateMutability::Nonpayable => "nonpayable",
            StateMutability::Payable => "payable",
        }
    }

    /// Derives mutability from the pre 0.4.16 `payable` / `constant` flags.
    /// An item carrying neither flag is nonpayable.
    pub fn from_legacy_flags(payable: bool, constant: bool) -> StateMutability {
        if payable {
            StateMutability::Payable
        } else if constant {
            StateMutability::View
        } else {
            StateMutability::Nonpayable
        }
    }

    /// True when calling does not change state, so a plain call is enough
    pub fn is_read_only(&self) -> bool {
        matches!(self, StateMutability::Pure | StateMutability::View)
    }
}

impl FromStr for StateMutability {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pure" => Ok(StateMutability::Pure),
            "view" => Ok(StateMutability::View),
            "nonpayable" => Ok(StateMutability::Nonpayable),
            "payable" => Ok(StateMutability::Payable),
            _ => Err(()),
        }
    }
}

impl Serialize for StateMutability {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StateMutability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(StateMutabilityVisitor)
    }
}

struct StateMutabilityVisitor;

impl<'de> Visitor<'de> for StateMutabilityVisitor {
    type Value = StateMutability;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a string")
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        s.parse()
            .map_err(|_| de::Error::invalid_value(Unexpected::Str(s), &self))
    }
}

#[test]
fn deserialize_pure() {
    let data = r#""pure""#;
    let state: StateMutability = serde_json::from_str(data).expect("Unable to parse");
    assert_eq!(state, StateMutability::Pure);
}

#[test]
fn deserialize_view() {
    let data = r#""view""#;
    let state: StateMutability = serde_json::from_str(data).expect("Unable to parse");
    assert_eq!(state, StateMutability::View);
}

#[test]
fn deserialize_nonpayable() {
    let data = r#""nonpayable""#;
    let state: StateMutability = serde_json::from_str(data).expect("Unable to parse");
    assert_eq!(state, StateMutability::Nonpayable);
}

#[test]
fn deserialize_payable() {
    let data = r#""payable""#;
    let state: StateMutability = serde_json::from_str(data).expect("Unable to parse");
    assert_eq!(state, StateMutability::Payable);
}

#[test]
#[should_panic]
fn deserialize_wrong_type() {
    let data = r#"123"#;
    let _state: StateMutability = serde_json::from_str(data).expect("Unable to parse");
}

#[test]
#[should_panic]
fn deserialize_wrong_value() {
    let data = r#""unknown""#;
    let _state: StateMutability = serde_json::from_str(data).expect("Unable to parse");
}

#[test]
fn legacy_flags() {
    assert_eq!(
        StateMutability::from_legacy_flags(true, false),
        StateMutability::Payable
    );
    assert_eq!(
        StateMutability::from_legacy_flags(true, true),
        StateMutability::Payable
    );
    assert_eq!(
        StateMutability::from_legacy_flags(false, true),
        StateMutability::View
    );
    assert_eq!(
        StateMutability::from_legacy_flags(false, false),
        StateMutability::Nonpayable
    );
}
