use crate::abi::param_type::ParamType;
use crate::Error;

/// One input or output descriptor of an interface item
#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct Param {
    /// Unnamed parameters come through as an empty string
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Param>,
    /// Only meaningful for event inputs
    #[serde(default, skip_serializing_if = "is_false")]
    pub indexed: bool,
    #[serde(
        rename = "internalType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub internal_type: Option<String>,
}

fn is_false(val: &bool) -> bool {
    !*val
}

impl Param {
    pub fn new(name: &str, type_: &str) -> Param {
        Param {
            name: name.to_string(),
            type_: type_.to_string(),
            components: Vec::new(),
            indexed: false,
            internal_type: None,
        }
    }

    pub fn param_type(&self) -> Result<ParamType, Error> {
        ParamType::parse(&self.type_, &self.components)
    }
}

#[test]
fn deserialize_minimal() {
    let param: Param = serde_json::from_str(r#"{"type":"uint256"}"#).unwrap();
    assert_eq!(param, Param::new("", "uint256"));
}

#[test]
fn deserialize_full() {
    let param: Param = serde_json::from_str(
        r#"{"name":"a","type":"uint256","indexed":true,"internalType":"uint256"}"#,
    )
    .unwrap();
    assert_eq!(param.name, "a");
    assert!(param.indexed);
    assert_eq!(param.internal_type.as_deref(), Some("uint256"));
}
