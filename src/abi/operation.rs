use serde::de::{self, Deserialize, Deserializer, Unexpected, Visitor};
use serde::{Serialize, Serializer};
use std::fmt;

/// Deserializes "type" value from the ABI JSON spec
///
/// https://docs.soliditylang.org/en/latest/abi-spec.html#json
///
/// Missing "type" means function, see the `Default` impl.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum ItemKind {
    #[default]
    Function,
    Constructor,
    Event,
    Fallback,
    Receive,
    Error,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Function => "function",
            ItemKind::Constructor => "constructor",
            ItemKind::Event => "event",
            ItemKind::Fallback => "fallback",
            ItemKind::Receive => "receive",
            ItemKind::Error => "error",
        }
    }
}

impl Serialize for ItemKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ItemKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(ItemKindVisitor)
    }
}

struct ItemKindVisitor;

impl<'de> Visitor<'de> for ItemKindVisitor {
    type Value = ItemKind;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a string")
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        match s {
            "function" => Ok(ItemKind::Function),
            "constructor" => Ok(ItemKind::Constructor),
            "event" => Ok(ItemKind::Event),
            "fallback" => Ok(ItemKind::Fallback),
            "receive" => Ok(ItemKind::Receive),
            "error" => Ok(ItemKind::Error),
            _ => Err(de::Error::invalid_value(Unexpected::Str(s), &self)),
        }
    }
}

#[test]
fn deserialize_function() {
    let data = r#""function""#;
    let op: ItemKind = serde_json::from_str(data).expect("Unable to parse");
    assert_eq!(op, ItemKind::Function);
}

#[test]
fn deserialize_event() {
    let data = r#""event""#;
    let op: ItemKind = serde_json::from_str(data).expect("Unable to parse");
    assert_eq!(op, ItemKind::Event);
}

#[test]
fn deserialize_constructor() {
    let data = r#""constructor""#;
    let op: ItemKind = serde_json::from_str(data).expect("Unable to parse");
    assert_eq!(op, ItemKind::Constructor);
}

#[test]
fn deserialize_fallback() {
    let data = r#""fallback""#;
    let op: ItemKind = serde_json::from_str(data).expect("Unable to parse");
    assert_eq!(op, ItemKind::Fallback);
}

#[test]
fn deserialize_custom_error() {
    let data = r#""error""#;
    let op: ItemKind = serde_json::from_str(data).expect("Unable to parse");
    assert_eq!(op, ItemKind::Error);
}

#[test]
#[should_panic]
fn deserialize_unknown_string() {
    let data = r#""asdf""#;
    let _op: ItemKind = serde_json::from_str(data).expect("Unable to parse");
}

#[test]
#[should_panic]
fn deserialize_unknown_type() {
    let data = r#"42"#;
    let _op: ItemKind = serde_json::from_str(data).expect("Unable to parse");
}
