use abiscope::Error as AbiscopeError;
use abiscope::Network;
use abiscope::Uint256;
use awc::error::SendRequestError as ActixError;
use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;
use tokio::time::error::Elapsed;

#[derive(Debug)]
pub enum ClientError {
    BadResponse(String),
    FailedToSend(ActixError),
    JsonRpcError {
        code: i64,
        message: String,
        data: String,
    },
    BadInput(String),
    AbiscopeError(AbiscopeError),
    ContractCallError(String),
    /// Operation name that is not part of the bound interface
    OperationNotFound(String),
    /// The interface registry answered, but not with an interface
    Registry {
        network: Network,
        message: String,
        result: String,
    },
    WalletUnavailable,
    NoAccount,
    TransactionReverted(Uint256),
    TransactionTimeout,
}

impl From<AbiscopeError> for ClientError {
    fn from(error: AbiscopeError) -> Self {
        ClientError::AbiscopeError(error)
    }
}

impl From<Elapsed> for ClientError {
    fn from(_error: Elapsed) -> Self {
        ClientError::TransactionTimeout
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ClientError::BadResponse(val) => write!(f, "Bad response {val}"),
            ClientError::BadInput(val) => write!(f, "Bad input {val}"),
            ClientError::FailedToSend(val) => write!(f, "Failed to send {val}"),
            ClientError::AbiscopeError(val) => write!(f, "{val}"),
            ClientError::ContractCallError(val) => {
                write!(f, "Error performing contract call {val}")
            }
            ClientError::OperationNotFound(val) => {
                write!(f, "Operation {val} is not part of this interface")
            }
            ClientError::JsonRpcError {
                code,
                message,
                data,
            } => write!(
                f,
                "Response error code {code} message {message} data {data:?}"
            ),
            ClientError::Registry {
                network,
                message,
                result,
            } => write!(f, "[{network}] {message} \u{2014} {result}"),
            ClientError::WalletUnavailable => write!(f, "No wallet connected"),
            ClientError::NoAccount => write!(f, "Wallet did not grant any account"),
            ClientError::TransactionReverted(hash) => {
                write!(f, "Transaction {hash:#066x} reverted")
            }
            ClientError::TransactionTimeout => write!(f, "Transaction did not enter chain in time"),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClientError::AbiscopeError(inner) => Some(inner),
            _ => None,
        }
    }
}

#[test]
fn registry_message() {
    let err = ClientError::Registry {
        network: Network::Rinkeby,
        message: "NOTOK".to_string(),
        result: "Contract source code not verified".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "[rinkeby] NOTOK \u{2014} Contract source code not verified"
    );
}
