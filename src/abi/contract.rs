use crate::abi::item::AbiItem;
use crate::Error;
use serde::de::{Deserialize, Deserializer, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::io;

/// A whole interface description. Only a JSON array is accepted, an
/// object or a scalar is rejected as a malformed description.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContractAbi {
    items: Vec<AbiItem>,
}

impl ContractAbi {
    pub fn new(items: Vec<AbiItem>) -> Self {
        ContractAbi { items }
    }

    pub fn load<T: io::Read>(reader: T) -> Result<Self, Error> {
        serde_json::from_reader(reader).map_err(From::from)
    }

    pub fn from_json_str(data: &str) -> Result<Self, Error> {
        serde_json::from_str(data).map_err(From::from)
    }

    pub fn from_value(value: Value) -> Result<Self, Error> {
        serde_json::from_value(value).map_err(From::from)
    }

    pub fn items(&self) -> &[AbiItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn functions(&self) -> impl Iterator<Item = &AbiItem> {
        self.items.iter().filter(|item| item.is_function())
    }

    /// First function declared under `name`
    pub fn find_function(&self, name: &str) -> Option<&AbiItem> {
        self.functions().find(|item| item.name() == name)
    }

    /// Every overload declared under `name`, in declaration order
    pub fn overloads(&self, name: &str) -> Vec<&AbiItem> {
        self.functions().filter(|item| item.name() == name).collect()
    }

    pub fn to_pretty_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(&self.items).map_err(From::from)
    }
}

impl Serialize for ContractAbi {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.items.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContractAbi {
    fn deserialize<D>(deserializer: D) -> Result<ContractAbi, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ContractVisitor)
    }
}

struct ContractVisitor;

impl<'a> Visitor<'a> for ContractVisitor {
    type Value = ContractAbi;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array of interface items")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'a>,
    {
        let mut result = ContractAbi { items: Vec::new() };
        while let Some(item) = seq.next_element()? {
            result.items.push(item)
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::operation::ItemKind;
    use crate::abi::param::Param;
    use crate::abi::state_mutability::StateMutability;
    use std::io::BufReader;

    #[test]
    fn decode_contract() {
        let abi_def = r#"[
  {
    "constant": true,
    "inputs": [
      {"name": "", "type": "bytes"},
      {"name": "", "type": "bool"},
      {"name": "", "type": "uint256[]"}
    ],
    "name": "sam",
    "outputs": [],
    "payable": false,
    "stateMutability": "pure",
    "type": "function"
  },
  {
    "inputs": [{"name": "", "type": "bytes3[2]"}],
    "name": "bar_defaults",
    "outputs": [],
    "stateMutability": "pure"
  },
  {
    "name": "f_nested",
    "type": "function",
    "inputs": [
      {
        "name": "t",
        "type": "tuple",
        "components": [
          {"name": "x", "type": "uint256"},
          {"name": "y", "type": "uint256"}
        ]
      }
    ],
    "outputs": [],
    "stateMutability": "nonpayable"
  },
  {
    "anonymous": false,
    "inputs": [
      {"indexed": true, "name": "a", "type": "uint256"},
      {"indexed": false, "name": "b", "type": "bytes32"}
    ],
    "name": "Event",
    "type": "event"
  },
  {
    "inputs": [],
    "payable": false,
    "stateMutability": "nonpayable",
    "type": "constructor"
  }
]"#;

        let contract =
            ContractAbi::load(BufReader::new(abi_def.as_bytes())).expect("Unable to load contract");

        assert_eq!(contract.items().len(), 5);
        let sam = &contract.items()[0];
        assert_eq!(sam.name(), "sam");
        assert_eq!(sam.kind, ItemKind::Function);
        assert_eq!(sam.payable, Some(false));
        assert_eq!(sam.constant, Some(true));
        assert_eq!(sam.signature().unwrap(), "sam(bytes,bool,uint256[])");

        let bar_defaults = &contract.items()[1];
        assert_eq!(bar_defaults.kind, ItemKind::Function);
        assert_eq!(bar_defaults.payable, None);
        assert_eq!(bar_defaults.constant, None);

        let f_nested = &contract.items()[2];
        let mut t = Param::new("t", "tuple");
        t.components = vec![Param::new("x", "uint256"), Param::new("y", "uint256")];
        assert_eq!(f_nested.inputs, vec![t]);
        assert_eq!(f_nested.signature().unwrap(), "f_nested((uint256,uint256))");

        let event = &contract.items()[3];
        assert_eq!(
            *event,
            AbiItem {
                kind: ItemKind::Event,
                name: Some("Event".to_owned()),
                inputs: vec![
                    Param {
                        indexed: true,
                        ..Param::new("a", "uint256")
                    },
                    Param::new("b", "bytes32"),
                ],
                anonymous: Some(false),
                ..Default::default()
            }
        );

        let ctor = &contract.items()[4];
        assert_eq!(ctor.kind, ItemKind::Constructor);
        assert_eq!(ctor.name, None);
        assert_eq!(ctor.state_mutability, Some(StateMutability::Nonpayable));

        assert_eq!(contract.functions().count(), 3);
    }

    #[test]
    fn reject_non_array() {
        for bad in [r#"{"abi": []}"#, "42", r#""text""#, "null"] {
            match ContractAbi::from_json_str(bad) {
                Err(Error::InvalidAbi(_)) => {}
                other => panic!("{bad} gave {other:?}"),
            }
        }
        assert!(ContractAbi::from_json_str("[").is_err());
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(ContractAbi::from_json_str("[]").unwrap().is_empty());
    }

    #[test]
    fn overloads_in_order() {
        let abi = ContractAbi::from_json_str(
            r#"[{"name":"f","inputs":[]},
                {"name":"g","inputs":[]},
                {"name":"f","inputs":[{"name":"a","type":"uint8"}]}]"#,
        )
        .unwrap();
        let found = abi.overloads("f");
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].inputs.len(), 1);
        assert_eq!(abi.find_function("f").unwrap().inputs.len(), 0);
        assert!(abi.find_function("h").is_none());
    }

    #[test]
    fn pretty_json_reloads() {
        let abi = ContractAbi::from_json_str(
            r#"[{"type":"function","name":"f","inputs":[],"outputs":[],"stateMutability":"view"}]"#,
        )
        .unwrap();
        let text = abi.to_pretty_json().unwrap();
        assert!(text.contains("\"stateMutability\": \"view\""));
        assert_eq!(ContractAbi::from_json_str(&text).unwrap(), abi);
    }
}
