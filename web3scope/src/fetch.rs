//! Fetching JSON documents over HTTP, optionally through a proxy that
//! serves `GET /api/metadata?url=<target>` and returns the target's body.

use crate::config::ScopeConfig;
use crate::jsonrpc::error::ClientError;
use async_trait::async_trait;
use awc::http::header;
use awc::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const PROXY_PATH: &str = "/api/metadata";

/// Anything that can turn a URL into a JSON value
#[async_trait(?Send)]
pub trait JsonFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, ClientError>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    proxy: Option<String>,
    timeout: Duration,
    body_limit: usize,
}

impl HttpFetcher {
    pub fn new(config: &ScopeConfig) -> Self {
        HttpFetcher {
            client: Client::default(),
            proxy: config.metadata_proxy.clone(),
            timeout: config.request_timeout,
            body_limit: config.max_body_size,
        }
    }

    /// Fetcher that never goes through the proxy, for APIs that allow
    /// cross origin requests themselves
    pub fn direct(config: &ScopeConfig) -> Self {
        HttpFetcher {
            proxy: None,
            ..HttpFetcher::new(config)
        }
    }

    fn target(&self, url: &str) -> Result<String, ClientError> {
        match &self.proxy {
            Some(base) => proxied_url(base, url),
            None => Ok(url.to_string()),
        }
    }
}

pub fn proxied_url(base: &str, target: &str) -> Result<String, ClientError> {
    let endpoint = format!("{}{PROXY_PATH}", base.trim_end_matches('/'));
    Url::parse_with_params(&endpoint, &[("url", target)])
        .map(String::from)
        .map_err(|e| ClientError::BadInput(format!("proxy url {endpoint}: {e}")))
}

#[async_trait(?Send)]
impl JsonFetcher for HttpFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, ClientError> {
        let target = self.target(url)?;
        trace!("Fetching {target}");
        let mut res = self
            .client
            .get(&target)
            .append_header((header::ACCEPT, "application/json"))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ClientError::FailedToSend)?;
        if !res.status().is_success() {
            return Err(ClientError::BadResponse(format!(
                "{} from {url}",
                res.status()
            )));
        }
        let body = res.body().limit(self.body_limit).await.map_err(|e| {
            ClientError::BadResponse(format!("Size Limit {} Error {e}", self.body_limit))
        })?;
        serde_json::from_slice(&body)
            .map_err(|e| ClientError::BadResponse(format!("{url} is not JSON: {e}")))
    }
}

#[test]
fn proxy_url_is_encoded() {
    assert_eq!(
        proxied_url("https://scope.example/", "https://ipfs.io/ipfs/Qm1?x=1&y=2").unwrap(),
        "https://scope.example/api/metadata?url=https%3A%2F%2Fipfs.io%2Fipfs%2FQm1%3Fx%3D1%26y%3D2"
    );
    assert!(proxied_url("not a url", "https://x.io").is_err());
}
