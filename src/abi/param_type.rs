use crate::abi::param::Param;
use crate::Error;
use std::fmt;

/// A Solidity type as it appears in an interface description, parsed
/// into something the encoder and decoder can walk.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParamType {
    Address,
    Bool,
    String,
    /// Dynamic `bytes`
    Bytes,
    /// `bytes1` to `bytes32`
    FixedBytes(usize),
    /// Unsigned integer with its bit size
    Uint(usize),
    /// Signed integer with its bit size
    Int(usize),
    /// `T[]`
    Array(Box<ParamType>),
    /// `T[k]`
    FixedArray(Box<ParamType>, usize),
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Parses a type string. `components` is only consulted for tuples,
    /// including arrays of tuples.
    pub fn parse(type_: &str, components: &[Param]) -> Result<ParamType, Error> {
        let type_ = type_.trim();
        if let Some(stripped) = type_.strip_suffix(']') {
            let open = stripped
                .rfind('[')
                .ok_or_else(|| Error::UnsupportedType(type_.to_string()))?;
            let inner = ParamType::parse(&stripped[..open], components)?;
            let size = &stripped[open + 1..];
            if size.is_empty() {
                return Ok(ParamType::Array(Box::new(inner)));
            }
            let size: usize = size
                .parse()
                .map_err(|_| Error::UnsupportedType(type_.to_string()))?;
            return Ok(ParamType::FixedArray(Box::new(inner), size));
        }

        match type_ {
            "address" => Ok(ParamType::Address),
            "bool" => Ok(ParamType::Bool),
            "string" => Ok(ParamType::String),
            "bytes" => Ok(ParamType::Bytes),
            "uint" => Ok(ParamType::Uint(256)),
            "int" => Ok(ParamType::Int(256)),
            "tuple" => Ok(ParamType::Tuple(
                components
                    .iter()
                    .map(Param::param_type)
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            _ => {
                if let Some(bits) = type_.strip_prefix("uint") {
                    Ok(ParamType::Uint(parse_bits(type_, bits)?))
                } else if let Some(bits) = type_.strip_prefix("int") {
                    Ok(ParamType::Int(parse_bits(type_, bits)?))
                } else if let Some(size) = type_.strip_prefix("bytes") {
                    match size.parse::<usize>() {
                        Ok(size) if (1..=32).contains(&size) => Ok(ParamType::FixedBytes(size)),
                        _ => Err(Error::UnsupportedType(type_.to_string())),
                    }
                } else {
                    Err(Error::UnsupportedType(type_.to_string()))
                }
            }
        }
    }

    /// Dynamic types are encoded out of line, behind an offset
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::String | ParamType::Bytes | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            ParamType::Tuple(members) => members.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }

    /// Number of bytes this type takes in the head of an encoding
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return 32;
        }
        match self {
            ParamType::FixedArray(inner, size) => inner.head_size() * size,
            ParamType::Tuple(members) => members.iter().map(ParamType::head_size).sum(),
            _ => 32,
        }
    }
}

fn parse_bits(type_: &str, bits: &str) -> Result<usize, Error> {
    match bits.parse::<usize>() {
        Ok(bits) if bits > 0 && bits <= 256 && bits % 8 == 0 => Ok(bits),
        _ => Err(Error::UnsupportedType(type_.to_string())),
    }
}

impl fmt::Display for ParamType {
    /// Canonical form used in function signatures
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamType::Address => write!(f, "address"),
            ParamType::Bool => write!(f, "bool"),
            ParamType::String => write!(f, "string"),
            ParamType::Bytes => write!(f, "bytes"),
            ParamType::FixedBytes(size) => write!(f, "bytes{size}"),
            ParamType::Uint(bits) => write!(f, "uint{bits}"),
            ParamType::Int(bits) => write!(f, "int{bits}"),
            ParamType::Array(inner) => write!(f, "{inner}[]"),
            ParamType::FixedArray(inner, size) => write!(f, "{inner}[{size}]"),
            ParamType::Tuple(members) => {
                write!(f, "(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{member}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[test]
fn parse_elementary() {
    assert_eq!(ParamType::parse("uint256", &[]).unwrap(), ParamType::Uint(256));
    assert_eq!(ParamType::parse("uint", &[]).unwrap(), ParamType::Uint(256));
    assert_eq!(ParamType::parse("int8", &[]).unwrap(), ParamType::Int(8));
    assert_eq!(ParamType::parse("address", &[]).unwrap(), ParamType::Address);
    assert_eq!(ParamType::parse("bytes", &[]).unwrap(), ParamType::Bytes);
    assert_eq!(
        ParamType::parse("bytes32", &[]).unwrap(),
        ParamType::FixedBytes(32)
    );
}

#[test]
fn parse_arrays() {
    assert_eq!(
        ParamType::parse("uint256[]", &[]).unwrap(),
        ParamType::Array(Box::new(ParamType::Uint(256)))
    );
    assert_eq!(
        ParamType::parse("bytes3[2]", &[]).unwrap(),
        ParamType::FixedArray(Box::new(ParamType::FixedBytes(3)), 2)
    );
    // the last bracket is the outermost dimension
    assert_eq!(
        ParamType::parse("uint8[2][]", &[]).unwrap(),
        ParamType::Array(Box::new(ParamType::FixedArray(
            Box::new(ParamType::Uint(8)),
            2
        )))
    );
}

#[test]
fn parse_tuple_array() {
    let components: Vec<Param> = serde_json::from_str(
        r#"[{"name":"x","type":"uint256"},{"name":"y","type":"string"}]"#,
    )
    .unwrap();
    let parsed = ParamType::parse("tuple[]", &components).unwrap();
    assert_eq!(parsed.to_string(), "(uint256,string)[]");
    assert!(parsed.is_dynamic());
}

#[test]
fn reject_unsupported() {
    for bad in ["uint7", "uint264", "bytes33", "bytes0", "fixed128x18", "function", "uint[x]"] {
        match ParamType::parse(bad, &[]) {
            Err(Error::UnsupportedType(_)) => {}
            other => panic!("{bad} parsed as {other:?}"),
        }
    }
}

#[test]
fn head_sizes() {
    assert_eq!(ParamType::parse("uint256[3]", &[]).unwrap().head_size(), 96);
    assert_eq!(ParamType::parse("string[3]", &[]).unwrap().head_size(), 32);
    assert_eq!(ParamType::parse("bool", &[]).unwrap().head_size(), 32);
}
