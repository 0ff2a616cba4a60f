use crate::utils::{bytes_to_hex_str, hex_str_to_bytes};
use crate::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Representation of an Ethereum address.
///
/// Addresses reach us as text: typed in by a user, returned by a wallet,
/// or embedded in a registry response.
#[derive(PartialEq, Debug, Clone, Copy, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// Get raw bytes of the address.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_slice(data: &[u8]) -> Result<Address, Error> {
        if data.len() != 20 {
            return Err(Error::InvalidAddressLength {
                got: data.len(),
                expected: 20,
            });
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(data);
        Ok(Address(out))
    }

    /// Parses the address and, when the input is mixed case, checks the
    /// EIP-55 checksum. All lower or all upper case input carries no checksum.
    pub fn parse_and_validate(input: &str) -> Result<Address, Error> {
        let address: Address = input.parse()?;
        let body = input.strip_prefix("0x").unwrap_or(input);
        let is_lower = body.chars().all(|c| !c.is_ascii_uppercase());
        let is_upper = body.chars().all(|c| !c.is_ascii_lowercase());
        if is_lower || is_upper || body == address.checksum_body() {
            Ok(address)
        } else {
            Err(Error::InvalidEip55)
        }
    }

    /// EIP-55 encoding without the `0x` prefix
    fn checksum_body(&self) -> String {
        let lower = bytes_to_hex_str(&self.0);
        let hash = Keccak256::digest(lower.as_bytes());
        lower
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
                if c.is_ascii_alphabetic() && nibble >= 8 {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect()
    }
}

impl From<[u8; 20]> for Address {
    fn from(val: [u8; 20]) -> Address {
        Address(val)
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Parses a string into an Ethereum address, `0x` prefix optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let body = s.strip_prefix("0x").unwrap_or(s);
        if body.len() != 40 {
            return Err(Error::InvalidAddressLength {
                got: body.len(),
                expected: 40,
            });
        }
        Address::from_slice(&hex_str_to_bytes(body)?)
    }
}

impl fmt::Display for Address {
    /// Checksummed form, this is what explorers and wallets show
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", self.checksum_body())
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x")?;
        }
        write!(f, "{}", bytes_to_hex_str(&self.0))
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{self:#x}"))
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[test]
#[should_panic]
fn decode_invalid_length() {
    "123".parse::<Address>().unwrap();
}

#[test]
#[should_panic]
fn decode_invalid_character() {
    "0xzz34567890123456789012345678901234567890"
        .parse::<Address>()
        .unwrap();
}

#[test]
fn decode() {
    let address: Address = "1234567890123456789012345678901234567890"
        .parse::<Address>()
        .unwrap();

    assert_eq!(
        address,
        Address::from([
            0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78,
            0x90, 0x12, 0x34, 0x56, 0x78, 0x90
        ])
    );
}

#[test]
fn handle_prefixed() {
    let address: Address = "0x000000000000000000000000000b9331677e6ebf"
        .parse()
        .unwrap();
    assert_eq!(
        address,
        Address::from([
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x0b, 0x93, 0x31, 0x67, 0x7e, 0x6e, 0xbf
        ])
    );
}

#[test]
fn eip55_display() {
    // test vectors from the EIP itself
    let address: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
        .parse()
        .unwrap();
    assert_eq!(
        address.to_string(),
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
    );
    let address: Address = "0xdbf03b407c01e7cd3cbea99509d93f8dddc8c6fb"
        .parse()
        .unwrap();
    assert_eq!(
        address.to_string(),
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB"
    );
}

#[test]
fn eip55_validation() {
    assert!(Address::parse_and_validate("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed").is_ok());
    assert!(Address::parse_and_validate("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_ok());
    match Address::parse_and_validate("0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed") {
        Err(Error::InvalidEip55) => {}
        other => panic!("expected checksum failure, got {other:?}"),
    }
}

#[test]
fn to_hex() {
    let address: Address = "1234567890123456789ABCDEF678901234567890"
        .parse::<Address>()
        .unwrap();

    assert_eq!(
        format!("{address:x}"),
        "1234567890123456789abcdef678901234567890",
    );
    assert_eq!(
        format!("{address:#x}"),
        "0x1234567890123456789abcdef678901234567890",
    );
}

#[test]
fn serde_roundtrip_as_string() {
    let address: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
        .parse()
        .unwrap();
    let json = serde_json::to_string(&address).unwrap();
    assert_eq!(json, r#""0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed""#);
    let back: Address = serde_json::from_str(&json).unwrap();
    assert_eq!(back, address);
}
