//! Interface registry client and the network probe used when the registry
//! has nothing for the current network.

use crate::config::ScopeConfig;
use crate::fetch::{HttpFetcher, JsonFetcher};
use crate::jsonrpc::error::ClientError;
use abiscope::abi::ContractAbi;
use abiscope::network::PROBE_CANDIDATES;
use abiscope::{Address, Network};
use async_trait::async_trait;
use serde_json::Value;
use url::Url;

/// Source of interface descriptions keyed by address and network
#[async_trait(?Send)]
pub trait AbiRegistry {
    async fn fetch_abi(&self, address: Address, network: Network)
        -> Result<ContractAbi, ClientError>;
}

/// Envelope of every registry answer. `status` "1" means `result` holds
/// the interface as a JSON encoded string, anything else is a failure
/// described by `message` and `result`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegistryResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

impl RegistryResponse {
    pub fn into_abi(self, network: Network) -> Result<ContractAbi, ClientError> {
        match (self.status.as_str(), self.result) {
            ("1", Value::String(result)) if !result.is_empty() => {
                Ok(ContractAbi::from_json_str(&result)?)
            }
            (_, result) => Err(ClientError::Registry {
                network,
                message: self.message,
                result: match result {
                    Value::String(s) => s,
                    other => other.to_string(),
                },
            }),
        }
    }
}

pub struct EtherscanRegistry<F> {
    fetcher: F,
    api_key: String,
}

impl EtherscanRegistry<HttpFetcher> {
    pub fn from_config(config: &ScopeConfig) -> Self {
        EtherscanRegistry::new(HttpFetcher::direct(config), &config.registry_api_key)
    }
}

impl<F: JsonFetcher> EtherscanRegistry<F> {
    pub fn new(fetcher: F, api_key: &str) -> Self {
        EtherscanRegistry {
            fetcher,
            api_key: api_key.to_string(),
        }
    }

    pub fn abi_url(&self, address: Address, network: Network) -> Result<String, ClientError> {
        let endpoint = format!("{}/api", network.registry_api_base());
        let address = address.to_string();
        Url::parse_with_params(
            &endpoint,
            &[
                ("module", "contract"),
                ("action", "getabi"),
                ("address", address.as_str()),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .map(String::from)
        .map_err(|e| ClientError::BadInput(format!("registry url {endpoint}: {e}")))
    }
}

#[async_trait(?Send)]
impl<F: JsonFetcher> AbiRegistry for EtherscanRegistry<F> {
    async fn fetch_abi(
        &self,
        address: Address,
        network: Network,
    ) -> Result<ContractAbi, ClientError> {
        let url = self.abi_url(address, network)?;
        let body = self.fetcher.fetch_json(&url).await?;
        let response: RegistryResponse = serde_json::from_value(body)
            .map_err(|e| ClientError::BadResponse(format!("registry envelope {e}")))?;
        response.into_abi(network)
    }
}

/// Tries the probe candidates in order, skipping `failed`, and returns the
/// first network on which the registry knows `address`. Stops at the first
/// hit.
pub async fn find_valid_network<R>(
    registry: &R,
    address: Address,
    failed: Network,
) -> Option<Network>
where
    R: AbiRegistry + ?Sized,
{
    for network in PROBE_CANDIDATES.iter().copied().filter(|n| *n != failed) {
        match registry.fetch_abi(address, network).await {
            Ok(_) => {
                info!("{address} has an interface on {network}");
                return Some(network);
            }
            Err(e) => debug!("Probe {network}: {e}"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;
    use serde_json::json;
    use std::cell::RefCell;

    const ABI: &str = r#"[{"type":"function","name":"name","inputs":[],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"}]"#;

    fn address() -> Address {
        "0x06012c8cf97bead5deae237070f9587f8e7a266d".parse().unwrap()
    }

    #[test]
    fn url_shape() {
        let registry = EtherscanRegistry::new(MockFetcher::default(), "KEY");
        assert_eq!(
            registry.abi_url(address(), Network::Rinkeby).unwrap(),
            "https://api-rinkeby.etherscan.io/api?module=contract&action=getabi&address=0x06012c8cf97BEaD5deAe237070F9587f8E7A266d&apikey=KEY"
        );
    }

    #[test]
    fn envelope() {
        let ok: RegistryResponse =
            serde_json::from_value(json!({"status": "1", "message": "OK", "result": ABI})).unwrap();
        assert_eq!(ok.into_abi(Network::Main).unwrap().items().len(), 1);

        let missing: RegistryResponse = serde_json::from_value(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Contract source code not verified"
        }))
        .unwrap();
        let err = missing.into_abi(Network::Ropsten).unwrap_err();
        assert_eq!(
            err.to_string(),
            "[ropsten] NOTOK \u{2014} Contract source code not verified"
        );

        let garbage: RegistryResponse =
            serde_json::from_value(json!({"status": "1", "message": "OK", "result": "{}"})).unwrap();
        assert!(matches!(
            garbage.into_abi(Network::Main),
            Err(ClientError::AbiscopeError(_))
        ));
    }

    #[test]
    fn fetch_through_fetcher() {
        actix_rt::System::new().block_on(async {
            let url = EtherscanRegistry::new(MockFetcher::default(), "K")
                .abi_url(address(), Network::Main)
                .unwrap();
            let fetcher = MockFetcher::default()
                .with(&url, json!({"status": "1", "message": "OK", "result": ABI}));
            let registry = EtherscanRegistry::new(fetcher, "K");
            assert!(registry.fetch_abi(address(), Network::Main).await.is_ok());
            assert!(registry.fetch_abi(address(), Network::Rinkeby).await.is_err());
        });
    }

    /// Only knows the address on one network, records every lookup
    struct OneNetwork {
        known: Network,
        asked: RefCell<Vec<Network>>,
    }

    #[async_trait(?Send)]
    impl AbiRegistry for OneNetwork {
        async fn fetch_abi(
            &self,
            _address: Address,
            network: Network,
        ) -> Result<ContractAbi, ClientError> {
            self.asked.borrow_mut().push(network);
            if network == self.known {
                Ok(ContractAbi::default())
            } else {
                Err(ClientError::Registry {
                    network,
                    message: "NOTOK".to_string(),
                    result: String::new(),
                })
            }
        }
    }

    #[test]
    fn probe_is_sequential() {
        actix_rt::System::new().block_on(async {
            let registry = OneNetwork {
                known: Network::Rinkeby,
                asked: RefCell::new(Vec::new()),
            };
            let found = find_valid_network(&registry, address(), Network::Goerli).await;
            assert_eq!(found, Some(Network::Rinkeby));
            assert_eq!(
                *registry.asked.borrow(),
                vec![Network::Main, Network::Ropsten, Network::Rinkeby]
            );

            let registry = OneNetwork {
                known: Network::Main,
                asked: RefCell::new(Vec::new()),
            };
            let found = find_valid_network(&registry, address(), Network::Main).await;
            assert_eq!(found, None);
            assert_eq!(
                *registry.asked.borrow(),
                vec![Network::Ropsten, Network::Rinkeby]
            );
        });
    }
}
