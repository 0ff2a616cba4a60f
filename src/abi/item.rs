use crate::abi::classify::Category;
use crate::abi::decode::decode_tokens;
use crate::abi::derive_method_id;
use crate::abi::encode::encode_call;
use crate::abi::operation::ItemKind;
use crate::abi::param::Param;
use crate::abi::param_type::ParamType;
use crate::abi::state_mutability::StateMutability;
use crate::abi::token::AbiToken;
use crate::Error;
use serde::de::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// The JSON format for a contract’s interface is given by an array of
/// function and/or event descriptions. This is one of them.
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Default)]
pub struct AbiItem {
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<Param>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<Param>>,
    #[serde(
        rename = "stateMutability",
        default,
        deserialize_with = "lenient_state_mutability",
        skip_serializing_if = "Option::is_none"
    )]
    pub state_mutability: Option<StateMutability>,
    /// Pre 0.4.16 flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payable: Option<bool>,
    /// Pre 0.4.16 flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous: Option<bool>,
}

/// An unrecognised mutability string is treated as absent, so the legacy
/// flags decide instead of the whole description failing to load.
fn lenient_state_mutability<'de, D>(deserializer: D) -> Result<Option<StateMutability>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(raw) => match raw.parse() {
            Ok(state) => Some(state),
            Err(()) => {
                warn!("Unrecognised stateMutability {raw:?}, falling back to legacy flags");
                None
            }
        },
    })
}

impl AbiItem {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn is_function(&self) -> bool {
        self.kind == ItemKind::Function
    }

    pub fn outputs(&self) -> &[Param] {
        self.outputs.as_deref().unwrap_or(&[])
    }

    /// Declared mutability, or the one derived from legacy flags
    pub fn mutability(&self) -> StateMutability {
        match self.state_mutability {
            Some(state) => state,
            None => StateMutability::from_legacy_flags(
                self.payable.unwrap_or(false),
                self.constant.unwrap_or(false),
            ),
        }
    }

    /// Invocation category, `None` for anything that is not a function
    pub fn category(&self) -> Option<Category> {
        if self.is_function() {
            Some(self.mutability().into())
        } else {
            None
        }
    }

    pub fn input_types(&self) -> Result<Vec<ParamType>, Error> {
        self.inputs.iter().map(Param::param_type).collect()
    }

    pub fn output_types(&self) -> Result<Vec<ParamType>, Error> {
        self.outputs().iter().map(Param::param_type).collect()
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub fn signature(&self) -> Result<String, Error> {
        let types = self
            .input_types()?
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        Ok(format!("{}({})", self.name(), types.join(",")))
    }

    pub fn selector(&self) -> Result<[u8; 4], Error> {
        Ok(derive_method_id(&self.signature()?))
    }

    /// Human readable form: `name(input: type, ...): outputs`
    pub fn display_signature(&self) -> String {
        fn describe(params: &[Param]) -> String {
            params
                .iter()
                .map(|p| {
                    if p.name.is_empty() {
                        p.type_.clone()
                    } else {
                        format!("{}: {}", p.name, p.type_)
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        }
        let outputs = if self.outputs().is_empty() {
            "void".to_string()
        } else {
            describe(self.outputs())
        };
        format!("{}({}): {}", self.name(), describe(&self.inputs), outputs)
    }

    /// Binds JSON arguments to the inputs and produces call data
    pub fn encode_input(&self, args: &[Value]) -> Result<Vec<u8>, Error> {
        if args.len() != self.inputs.len() {
            return Err(Error::ArgumentCount {
                expected: self.inputs.len(),
                got: args.len(),
            });
        }
        let tokens = self
            .input_types()?
            .iter()
            .zip(args)
            .map(|(kind, arg)| AbiToken::from_json(kind, arg))
            .collect::<Result<Vec<_>, _>>()?;
        encode_call(&self.signature()?, &tokens)
    }

    /// Decodes return data. No outputs is `null`, a single output is
    /// unwrapped and several outputs become an object keyed by position and,
    /// where the output is named, by name.
    pub fn decode_output(&self, data: &[u8]) -> Result<Value, Error> {
        let tokens = decode_tokens(&self.output_types()?, data)?;
        let outputs = self.outputs();
        Ok(match tokens.len() {
            0 => Value::Null,
            1 => tokens[0].to_json(),
            _ => {
                let mut map = Map::new();
                for (i, (token, param)) in tokens.iter().zip(outputs).enumerate() {
                    let value = token.to_json();
                    if !param.name.is_empty() {
                        map.insert(param.name.clone(), value.clone());
                    }
                    map.insert(i.to_string(), value);
                }
                Value::Object(map)
            }
        })
    }
}
