use crate::jsonrpc::error::ClientError;
use std::env;
use std::time::Duration;

pub const RPC_URL_VAR: &str = "ABISCOPE_RPC_URL";
pub const REGISTRY_KEY_VAR: &str = "ETHERSCAN_API_KEY";
pub const METADATA_PROXY_VAR: &str = "ABISCOPE_METADATA_PROXY";
pub const TIMEOUT_VAR: &str = "ABISCOPE_TIMEOUT_SECS";
pub const CONFIRMATIONS_VAR: &str = "ABISCOPE_CONFIRMATIONS";

/// Settings shared by every client in this crate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeConfig {
    /// JSON-RPC endpoint of the node or wallet
    pub rpc_url: String,
    pub registry_api_key: String,
    /// Base URL of a fetch proxy serving `/api/metadata?url=`, metadata is
    /// fetched directly when absent
    pub metadata_proxy: Option<String>,
    pub request_timeout: Duration,
    /// Delay between receipt polls of a submitted transaction
    pub poll_interval: Duration,
    /// Blocks on top of the inclusion block before a transaction is final
    pub confirmations: u64,
    pub transaction_timeout: Duration,
    /// Largest response body accepted from any endpoint
    pub max_body_size: usize,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        ScopeConfig {
            rpc_url: "http://localhost:8545".to_string(),
            registry_api_key: String::new(),
            metadata_proxy: None,
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            confirmations: 1,
            transaction_timeout: Duration::from_secs(600),
            max_body_size: 16 * 1024 * 1024,
        }
    }
}

impl ScopeConfig {
    pub fn new(rpc_url: &str, request_timeout: Duration) -> Self {
        ScopeConfig {
            rpc_url: rpc_url.to_string(),
            request_timeout,
            ..Default::default()
        }
    }

    /// Reads settings from the environment, loading `.env` first when one
    /// exists. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ClientError> {
        if let Err(e) = dotenv::dotenv() {
            debug!("No .env loaded: {e}");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ScopeConfig::default();
        if let Some(url) = lookup(RPC_URL_VAR) {
            config.rpc_url = url;
        }
        if let Some(key) = lookup(REGISTRY_KEY_VAR) {
            config.registry_api_key = key;
        }
        config.metadata_proxy = lookup(METADATA_PROXY_VAR).filter(|p| !p.is_empty());
        if let Some(secs) = lookup(TIMEOUT_VAR) {
            config.request_timeout = Duration::from_secs(parse_number(TIMEOUT_VAR, &secs)?);
        }
        if let Some(count) = lookup(CONFIRMATIONS_VAR) {
            config.confirmations = parse_number(CONFIRMATIONS_VAR, &count)?;
        }
        Ok(config)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64, ClientError> {
    value
        .trim()
        .parse()
        .map_err(|e| ClientError::BadInput(format!("{key}={value}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ScopeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ScopeConfig::default());
    }

    #[test]
    fn reads_variables() {
        let config = ScopeConfig::from_lookup(lookup(&[
            (RPC_URL_VAR, "https://rpc.example"),
            (REGISTRY_KEY_VAR, "KEY"),
            (METADATA_PROXY_VAR, "https://proxy.example"),
            (TIMEOUT_VAR, " 5 "),
            (CONFIRMATIONS_VAR, "3"),
        ]))
        .unwrap();
        assert_eq!(config.rpc_url, "https://rpc.example");
        assert_eq!(config.registry_api_key, "KEY");
        assert_eq!(
            config.metadata_proxy.as_deref(),
            Some("https://proxy.example")
        );
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.confirmations, 3);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(ScopeConfig::from_lookup(lookup(&[(TIMEOUT_VAR, "soon")])).is_err());
        assert!(ScopeConfig::from_lookup(lookup(&[(CONFIRMATIONS_VAR, "-1")])).is_err());
    }
}
