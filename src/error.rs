use std::fmt;
use std::num::ParseIntError;
use std::str::Utf8Error;

/// Custom error implementation that describes possible
/// error states.
///
/// This is shared by a whole crate.
#[derive(Debug)]
pub enum Error {
    InvalidAddressLength { got: usize, expected: usize },
    InvalidUtf8(Utf8Error),
    InvalidHex(ParseIntError),
    InvalidEip55,
    InvalidAbi(String),
    UnsupportedType(String),
    BadArgument { kind: String, reason: String },
    ArgumentCount { expected: usize, got: usize },
    InvalidAmount(String),
    DecodeFailed(String),
    UnknownNetwork(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidAddressLength { got, expected } => {
                write!(f, "Invalid address length, got {got}, expected {expected}")
            }
            Error::InvalidUtf8(_) => write!(f, "Failed to parse bytes as utf8"),
            Error::InvalidHex(_) => write!(f, "Invalid hex character"),
            Error::InvalidEip55 => write!(f, "Invalid EIP-55 Address encoding"),
            Error::InvalidAbi(val) => write!(f, "Invalid interface description: {val}"),
            Error::UnsupportedType(val) => write!(f, "Unsupported ABI type {val}"),
            Error::BadArgument { kind, reason } => {
                write!(f, "Invalid argument for {kind}: {reason}")
            }
            Error::ArgumentCount { expected, got } => write!(
                f,
                "Invalid number of parameters, got {got} expected {expected}"
            ),
            Error::InvalidAmount(val) => write!(f, "Invalid currency amount {val}"),
            Error::DecodeFailed(val) => write!(f, "Failed to decode ABI data: {val}"),
            Error::UnknownNetwork(val) => write!(f, "Unknown network {val}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidHex(inner) => Some(inner),
            Error::InvalidUtf8(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<Utf8Error> for Error {
    fn from(e: Utf8Error) -> Self {
        Error::InvalidUtf8(e)
    }
}

impl From<ParseIntError> for Error {
    fn from(e: ParseIntError) -> Self {
        Error::InvalidHex(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidAbi(e.to_string())
    }
}

impl Error {
    pub(crate) fn bad_argument(kind: impl ToString, reason: impl ToString) -> Self {
        Error::BadArgument {
            kind: kind.to_string(),
            reason: reason.to_string(),
        }
    }
}
