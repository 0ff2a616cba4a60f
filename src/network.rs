use crate::Error;
use std::fmt;
use std::str::FromStr;

/// Networks a wallet may report. The identity always comes from the
/// wallet, nothing here guesses one.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[serde(alias = "mainnet")]
    Main,
    Ropsten,
    Rinkeby,
    Goerli,
    Kovan,
    Private,
    Localhost,
    Hardhat,
}

/// Networks probed, in this order, when the registry has nothing for the
/// current one
pub const PROBE_CANDIDATES: [Network; 3] = [Network::Main, Network::Ropsten, Network::Rinkeby];

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Main => "main",
            Network::Ropsten => "ropsten",
            Network::Rinkeby => "rinkeby",
            Network::Goerli => "goerli",
            Network::Kovan => "kovan",
            Network::Private => "private",
            Network::Localhost => "localhost",
            Network::Hardhat => "hardhat",
        }
    }

    /// Anything we don't know is a private chain
    pub fn from_chain_id(chain_id: u64) -> Network {
        match chain_id {
            1 => Network::Main,
            3 => Network::Ropsten,
            4 => Network::Rinkeby,
            5 => Network::Goerli,
            42 => Network::Kovan,
            1337 => Network::Localhost,
            31337 => Network::Hardhat,
            _ => Network::Private,
        }
    }

    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Network::Main => Some(1),
            Network::Ropsten => Some(3),
            Network::Rinkeby => Some(4),
            Network::Goerli => Some(5),
            Network::Kovan => Some(42),
            Network::Localhost => Some(1337),
            Network::Hardhat => Some(31337),
            Network::Private => None,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Network::Localhost | Network::Hardhat)
    }

    /// Base URL of the interface registry API. Networks the registry
    /// doesn't serve fall back to main.
    pub fn registry_api_base(&self) -> &'static str {
        match self {
            Network::Ropsten => "https://api-ropsten.etherscan.io",
            Network::Rinkeby => "https://api-rinkeby.etherscan.io",
            _ => "https://api.etherscan.io",
        }
    }

    fn explorer_base(&self) -> String {
        match self {
            // private has its own explorer subdomain as well
            Network::Ropsten
            | Network::Rinkeby
            | Network::Goerli
            | Network::Kovan
            | Network::Private => {
                format!("https://{}.etherscan.io", self.as_str())
            }
            _ => "https://etherscan.io".to_string(),
        }
    }

    pub fn explorer_address_url(&self, address: &str) -> String {
        format!("{}/address/{address}", self.explorer_base())
    }

    pub fn explorer_transaction_url(&self, hash: &str) -> String {
        format!("{}/tx/{hash}", self.explorer_base())
    }

    /// Subdomain of the marketplace metadata API
    pub fn marketplace_subdomain(&self) -> &'static str {
        match self {
            Network::Main => "api",
            _ => "testnets-api",
        }
    }

    /// Name used when suggesting a switch to the user
    pub fn display_name(&self) -> &'static str {
        match self {
            Network::Ropsten => "Ropsten Test Network",
            Network::Rinkeby => "Rinkeby Test Network",
            Network::Goerli => "Goerli Test Network",
            Network::Kovan => "Kovan Test Network",
            _ => "Ethereum Main Network",
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "main" | "mainnet" => Ok(Network::Main),
            "ropsten" => Ok(Network::Ropsten),
            "rinkeby" => Ok(Network::Rinkeby),
            "goerli" => Ok(Network::Goerli),
            "kovan" => Ok(Network::Kovan),
            "private" => Ok(Network::Private),
            "localhost" => Ok(Network::Localhost),
            "hardhat" => Ok(Network::Hardhat),
            _ => Err(Error::UnknownNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[test]
fn parse_names() {
    assert_eq!("main".parse::<Network>().unwrap(), Network::Main);
    assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Main);
    assert_eq!("Rinkeby".parse::<Network>().unwrap(), Network::Rinkeby);
    assert!("moon".parse::<Network>().is_err());
    let n: Network = serde_json::from_str(r#""mainnet""#).unwrap();
    assert_eq!(n, Network::Main);
    assert_eq!(serde_json::to_string(&Network::Hardhat).unwrap(), r#""hardhat""#);
}

#[test]
fn chain_ids() {
    for id in [1, 3, 4, 5, 42, 1337, 31337] {
        assert_eq!(Network::from_chain_id(id).chain_id(), Some(id));
    }
    assert_eq!(Network::from_chain_id(999), Network::Private);
}

#[test]
fn urls() {
    assert_eq!(
        Network::Rinkeby.registry_api_base(),
        "https://api-rinkeby.etherscan.io"
    );
    assert_eq!(Network::Goerli.registry_api_base(), "https://api.etherscan.io");
    assert_eq!(
        Network::Main.explorer_transaction_url("0xab"),
        "https://etherscan.io/tx/0xab"
    );
    assert_eq!(
        Network::Ropsten.explorer_address_url("0xcd"),
        "https://ropsten.etherscan.io/address/0xcd"
    );
    assert_eq!(
        Network::Private.explorer_transaction_url("0xef"),
        "https://private.etherscan.io/tx/0xef"
    );
    assert_eq!(
        Network::Hardhat.explorer_address_url("0xcd"),
        "https://etherscan.io/address/0xcd"
    );
    assert_eq!(Network::Main.marketplace_subdomain(), "api");
    assert_eq!(Network::Rinkeby.marketplace_subdomain(), "testnets-api");
    assert_eq!(Network::Private.display_name(), "Ethereum Main Network");
}
