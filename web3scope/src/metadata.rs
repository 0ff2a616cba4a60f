//! Token metadata resolution.
//!
//! The contract is asked for the token's URI first. Whatever it points at
//! is fetched and sanitized; if that fails the bare URI is still worth
//! showing. Only when the contract has no usable URI is the marketplace
//! registry consulted, and its answer is tagged so it can be told apart.

use crate::config::ScopeConfig;
use crate::contract::{BoundContract, ContractHandle};
use crate::discovery::{discover_token_uri, SINGLE_TOKEN_URI};
use crate::fetch::{HttpFetcher, JsonFetcher};
use crate::invoke::invoke_read;
use crate::jsonrpc::error::ClientError;
use crate::registry::{find_valid_network, AbiRegistry};
use crate::wallet::WalletSession;
use abiscope::abi::ContractAbi;
use abiscope::metadata::{
    extract_image_preview, is_registry_metadata_uri, normalize_uri, sanitize_document,
    MetadataDocument,
};
use abiscope::{Address, Network};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use url::Url;

/// Key added to registry answers
pub const SOURCE_KEY: &str = "_source";
pub const REGISTRY_SOURCE: &str = "opensea";

/// Owned tokens beyond this are not listed
pub const MAX_GALLERY_TOKENS: usize = 100;

/// Interface assumed for a token contract whose real one is unavailable
pub const DEFAULT_TOKEN_ABI: &str = r#"[
    {"type":"function","name":"tokenURI","inputs":[{"name":"tokenId","type":"uint256"}],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"},
    {"type":"function","name":"uri","inputs":[{"name":"id","type":"uint256"}],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"}
]"#;

pub fn default_token_abi() -> Result<ContractAbi, ClientError> {
    Ok(ContractAbi::from_json_str(DEFAULT_TOKEN_ABI)?)
}

/// Secondary source of metadata keyed by contract and token
#[async_trait(?Send)]
pub trait MetadataRegistry {
    async fn fetch_metadata(
        &self,
        address: Address,
        token_id: &str,
        network: Network,
    ) -> Result<MetadataDocument, ClientError>;
}

pub struct OpenSeaRegistry<F> {
    fetcher: F,
}

impl OpenSeaRegistry<HttpFetcher> {
    pub fn from_config(config: &ScopeConfig) -> Self {
        OpenSeaRegistry::new(HttpFetcher::direct(config))
    }
}

impl<F: JsonFetcher> OpenSeaRegistry<F> {
    pub fn new(fetcher: F) -> Self {
        OpenSeaRegistry { fetcher }
    }

    pub fn metadata_url(address: Address, token_id: &str, network: Network) -> String {
        format!(
            "https://{}.opensea.io/api/v1/metadata/{address:#x}/{token_id}?format=json",
            network.marketplace_subdomain()
        )
    }
}

#[async_trait(?Send)]
impl<F: JsonFetcher> MetadataRegistry for OpenSeaRegistry<F> {
    async fn fetch_metadata(
        &self,
        address: Address,
        token_id: &str,
        network: Network,
    ) -> Result<MetadataDocument, ClientError> {
        let url = Self::metadata_url(address, token_id, network);
        match self.fetcher.fetch_json(&url).await? {
            Value::Object(mut doc) => {
                doc.insert(
                    SOURCE_KEY.to_string(),
                    Value::String(REGISTRY_SOURCE.to_string()),
                );
                Ok(doc)
            }
            other => Err(ClientError::BadResponse(format!(
                "metadata registry returned {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedMetadata {
    /// Fetched from the token's own URI and sanitized
    Document(MetadataDocument),
    /// The URI could not be fetched, this is what the contract returned
    RawUri(String),
    /// Came from the metadata registry, not from the contract
    Registry(MetadataDocument),
    None,
}

impl ResolvedMetadata {
    pub fn document(&self) -> Option<&MetadataDocument> {
        match self {
            ResolvedMetadata::Document(doc) | ResolvedMetadata::Registry(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn image(&self) -> Option<&str> {
        extract_image_preview(self.document())
    }
}

/// Fetches `uri` after making it fetchable and sanitizes the result
pub async fn fetch_document<F>(fetcher: &F, uri: &str) -> Result<MetadataDocument, ClientError>
where
    F: JsonFetcher + ?Sized,
{
    match fetcher.fetch_json(&normalize_uri(uri)).await? {
        Value::Object(doc) => Ok(sanitize_document(doc)),
        other => Err(ClientError::BadResponse(format!(
            "metadata at {uri} is not an object: {other}"
        ))),
    }
}

pub async fn resolve_token_metadata<H, F, M>(
    handle: &H,
    token_id: &str,
    network: Network,
    fetcher: &F,
    registry: &M,
) -> ResolvedMetadata
where
    H: ContractHandle + ?Sized,
    F: JsonFetcher + ?Sized,
    M: MetadataRegistry + ?Sized,
{
    let uri = match discover_token_uri(handle, token_id).await {
        Ok(uri) => uri,
        Err(e) => {
            warn!("No token uri for {token_id} on {}: {e}", handle.address());
            None
        }
    };
    if let Some(uri) = uri.filter(|uri| !is_registry_metadata_uri(uri)) {
        return match fetch_document(fetcher, &uri).await {
            Ok(doc) => ResolvedMetadata::Document(doc),
            Err(e) => {
                warn!("Failed to fetch metadata from {uri}: {e}");
                ResolvedMetadata::RawUri(uri)
            }
        };
    }
    match registry
        .fetch_metadata(handle.address(), token_id, network)
        .await
    {
        Ok(doc) => ResolvedMetadata::Registry(doc),
        Err(e) => {
            warn!("Metadata registry has nothing for {token_id}: {e}");
            ResolvedMetadata::None
        }
    }
}

/// A token as listed on the marketplace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub address: Address,
    pub token_id: String,
    pub network: Network,
}

const ASSET_PATH: &str = "opensea.io/assets/ethereum/";

/// Parses `https://opensea.io/assets/ethereum/<address>/<id>`. The main
/// host means main network, any other host (the testnets site) rinkeby.
pub fn parse_asset_url(input: &str) -> Result<AssetRef, ClientError> {
    if !input.contains(ASSET_PATH) {
        return Err(ClientError::BadInput(format!(
            "{input} is not a marketplace asset url"
        )));
    }
    let url = Url::parse(input).map_err(|e| ClientError::BadInput(format!("{input}: {e}")))?;
    let network = match url.host_str() {
        Some("opensea.io") => Network::Main,
        _ => Network::Rinkeby,
    };
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    match segments.as_slice() {
        ["assets", "ethereum", address, token_id, ..] => Ok(AssetRef {
            address: Address::parse_and_validate(address)?,
            token_id: token_id.to_string(),
            network,
        }),
        _ => Err(ClientError::BadInput(format!(
            "{input} does not name a contract and token"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMetadata {
    pub asset: AssetRef,
    /// False when the registry had no interface and the default one was used
    pub verified_interface: bool,
    pub suggestion: Option<Network>,
    pub metadata: ResolvedMetadata,
}

/// Metadata of the token behind a marketplace asset url, read through the
/// contract where possible
pub async fn metadata_for_asset_url<R, F, M>(
    input: &str,
    abi_registry: &R,
    session: &WalletSession,
    config: &ScopeConfig,
    fetcher: &F,
    metadata_registry: &M,
) -> Result<AssetMetadata, ClientError>
where
    R: AbiRegistry + ?Sized,
    F: JsonFetcher + ?Sized,
    M: MetadataRegistry + ?Sized,
{
    let asset = parse_asset_url(input)?;
    let (abi, verified_interface, suggestion) =
        match abi_registry.fetch_abi(asset.address, asset.network).await {
            Ok(abi) => (abi, true, None),
            Err(e) => {
                warn!("Using the default token interface for {}: {e}", asset.address);
                let suggestion =
                    find_valid_network(abi_registry, asset.address, asset.network).await;
                (default_token_abi()?, false, suggestion)
            }
        };
    let contract = BoundContract::new(asset.address, abi, session, config);
    let metadata = resolve_token_metadata(
        &contract,
        &asset.token_id,
        asset.network,
        fetcher,
        metadata_registry,
    )
    .await;
    Ok(AssetMetadata {
        asset,
        verified_interface,
        suggestion,
        metadata,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenImage {
    pub token_id: String,
    pub uri: Option<String>,
    pub image: Option<String>,
}

/// Images of every token `owner` holds on an enumerable token contract.
/// Tokens are looked up concurrently, any failed step leaves that token's
/// fields empty.
pub async fn owned_token_images<H, F>(handle: &H, owner: Address, fetcher: &F) -> Vec<TokenImage>
where
    H: ContractHandle + ?Sized,
    F: JsonFetcher + ?Sized,
{
    let owner_arg = Value::String(owner.to_string());
    let balance = invoke_read(handle, "balanceOf", &[owner_arg.clone()])
        .await
        .and_then(|v| as_count(&v))
        .unwrap_or(0);
    if balance > MAX_GALLERY_TOKENS {
        warn!("{owner} holds {balance} tokens, listing the first {MAX_GALLERY_TOKENS}");
    }
    let lookups = (0..balance.min(MAX_GALLERY_TOKENS)).map(|index| {
        let owner_arg = owner_arg.clone();
        async move {
            let token_id = invoke_read(
                handle,
                "tokenOfOwnerByIndex",
                &[owner_arg, Value::String(index.to_string())],
            )
            .await
            .and_then(|v| as_text(&v))?;
            let uri = invoke_read(
                handle,
                SINGLE_TOKEN_URI,
                &[Value::String(token_id.clone())],
            )
            .await
            .and_then(|v| as_text(&v));
            let image = match &uri {
                Some(uri) => match fetch_document(fetcher, uri).await {
                    Ok(doc) => extract_image_preview(Some(&doc)).map(str::to_string),
                    Err(e) => {
                        debug!("No metadata for token {token_id}: {e}");
                        None
                    }
                },
                None => None,
            };
            Some(TokenImage {
                token_id,
                uri,
                image,
            })
        }
    });
    join_all(lookups).await.into_iter().flatten().collect()
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_count(value: &Value) -> Option<usize> {
    as_text(value)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::MULTI_TOKEN_URI;
    use crate::testing::{MockFetcher, MockHandle};
    use serde_json::json;

    fn address() -> Address {
        "0x06012c8cf97bead5deae237070f9587f8e7a266d".parse().unwrap()
    }

    fn doc(value: Value) -> MetadataDocument {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn registry_url() {
        assert_eq!(
            OpenSeaRegistry::<MockFetcher>::metadata_url(address(), "7", Network::Main),
            "https://api.opensea.io/api/v1/metadata/0x06012c8cf97bead5deae237070f9587f8e7a266d/7?format=json"
        );
        assert!(
            OpenSeaRegistry::<MockFetcher>::metadata_url(address(), "7", Network::Rinkeby)
                .starts_with("https://testnets-api.opensea.io/")
        );
    }

    fn registry_with(doc: Value) -> OpenSeaRegistry<MockFetcher> {
        let url = OpenSeaRegistry::<MockFetcher>::metadata_url(address(), "1", Network::Main);
        OpenSeaRegistry::new(MockFetcher::default().with(&url, doc))
    }

    fn handle() -> MockHandle {
        MockHandle {
            address: address(),
            ..Default::default()
        }
    }

    #[test]
    fn fetched_and_sanitized() {
        actix_rt::System::new().block_on(async {
            let handle = handle().with(SINGLE_TOKEN_URI, Ok(json!("ipfs://QmMeta")));
            let fetcher = MockFetcher::default().with(
                "https://ipfs.io/ipfs/QmMeta",
                json!({"name": "One", "image": "ipfs://QmImg"}),
            );
            let registry = registry_with(json!({}));
            let resolved =
                resolve_token_metadata(&handle, "1", Network::Main, &fetcher, &registry).await;
            assert_eq!(resolved.image(), Some("https://ipfs.io/ipfs/QmImg"));
            assert!(matches!(resolved, ResolvedMetadata::Document(_)));
            // the registry was never asked
            assert_eq!(fetcher.requested.borrow().len(), 1);
            assert!(registry.fetcher.requested.borrow().is_empty());
        });
    }

    #[test]
    fn unfetchable_uri_is_returned_raw() {
        actix_rt::System::new().block_on(async {
            let handle = handle().with(MULTI_TOKEN_URI, Ok(json!("https://gone.example/1")));
            let resolved = resolve_token_metadata(
                &handle,
                "1",
                Network::Main,
                &MockFetcher::default(),
                &registry_with(json!({})),
            )
            .await;
            assert_eq!(
                resolved,
                ResolvedMetadata::RawUri("https://gone.example/1".to_string())
            );
            assert_eq!(resolved.image(), None);
        });
    }

    #[test]
    fn registry_fallback_is_tagged() {
        actix_rt::System::new().block_on(async {
            let registry = registry_with(json!({"image_url": "https://img.example/1.png"}));
            // no accessor at all
            let resolved = resolve_token_metadata(
                &handle(),
                "1",
                Network::Main,
                &MockFetcher::default(),
                &registry,
            )
            .await;
            let expected = doc(json!({
                "image_url": "https://img.example/1.png",
                "_source": "opensea"
            }));
            assert_eq!(resolved, ResolvedMetadata::Registry(expected.clone()));

            // the contract points at the registry itself
            let handle = handle().with(
                SINGLE_TOKEN_URI,
                Ok(json!("https://api.opensea.io/api/v1/metadata/0x06/1")),
            );
            let fetcher = MockFetcher::default();
            let resolved =
                resolve_token_metadata(&handle, "1", Network::Main, &fetcher, &registry).await;
            assert_eq!(resolved, ResolvedMetadata::Registry(expected));
            assert!(fetcher.requested.borrow().is_empty());
        });
    }

    #[test]
    fn nothing_anywhere() {
        actix_rt::System::new().block_on(async {
            let handle = handle().with(SINGLE_TOKEN_URI, Err("execution reverted"));
            let registry = OpenSeaRegistry::new(MockFetcher::default());
            let resolved = resolve_token_metadata(
                &handle,
                "1",
                Network::Main,
                &MockFetcher::default(),
                &registry,
            )
            .await;
            assert_eq!(resolved, ResolvedMetadata::None);
        });
    }

    #[test]
    fn asset_urls() {
        let asset =
            parse_asset_url("https://opensea.io/assets/ethereum/0x06012c8cf97bead5deae237070f9587f8e7a266d/42")
                .unwrap();
        assert_eq!(
            asset,
            AssetRef {
                address: address(),
                token_id: "42".to_string(),
                network: Network::Main,
            }
        );
        let asset = parse_asset_url(
            "https://testnets.opensea.io/assets/ethereum/0x06012c8cf97bead5deae237070f9587f8e7a266d/3/",
        )
        .unwrap();
        assert_eq!(asset.network, Network::Rinkeby);
        assert_eq!(asset.token_id, "3");
        assert!(parse_asset_url("https://example.com/assets/ethereum/0x06/1").is_err());
        assert!(parse_asset_url("https://opensea.io/assets/ethereum/0x06012c").is_err());
        assert!(parse_asset_url("https://opensea.io/assets/ethereum/nothex/1").is_err());
    }

    #[test]
    fn default_abi_has_both_accessors() {
        let abi = default_token_abi().unwrap();
        assert!(abi.find_function(SINGLE_TOKEN_URI).is_some());
        assert!(abi.find_function(MULTI_TOKEN_URI).is_some());
    }

    #[test]
    fn gallery() {
        actix_rt::System::new().block_on(async {
            // every index maps to token 5, only its uri resolves
            let handle = handle()
                .with("balanceOf", Ok(json!("2")))
                .with("tokenOfOwnerByIndex", Ok(json!("5")))
                .with(SINGLE_TOKEN_URI, Ok(json!("ipfs://QmFive")));
            let fetcher = MockFetcher::default()
                .with("https://ipfs.io/ipfs/QmFive", json!({"image": "ipfs://QmPic"}));
            let images = owned_token_images(&handle, address(), &fetcher).await;
            assert_eq!(images.len(), 2);
            assert_eq!(images[0].token_id, "5");
            assert_eq!(images[0].uri.as_deref(), Some("ipfs://QmFive"));
            assert_eq!(images[1].image.as_deref(), Some("https://ipfs.io/ipfs/QmPic"));
            assert_eq!(handle.calls.borrow()[1].1[1], json!("0"));
        });
    }

    #[test]
    fn gallery_without_balance() {
        actix_rt::System::new().block_on(async {
            let handle = handle().with("balanceOf", Err("not a token"));
            let images = owned_token_images(&handle, address(), &MockFetcher::default()).await;
            assert!(images.is_empty());
            assert_eq!(handle.called("tokenOfOwnerByIndex"), 0);
        });
    }
}
