use crate::config::ScopeConfig;
use crate::jsonrpc::client::HttpClient;
use crate::jsonrpc::error::ClientError;
use crate::types::{Data, TransactionReceipt, TransactionRequest};
use crate::wallet::WalletProvider;
use abiscope::{Address, Network, Uint256};
use async_trait::async_trait;
use num_traits::ToPrimitive;
use std::time::Duration;

/// A wallet reached over JSON-RPC, such as a browser extension's provider
/// bridge or a development node with unlocked accounts
#[derive(Clone)]
pub struct RpcWallet {
    jsonrpc_client: HttpClient,
    timeout: Duration,
}

impl RpcWallet {
    pub fn new(config: &ScopeConfig) -> Self {
        RpcWallet {
            jsonrpc_client: HttpClient::new(&config.rpc_url, config.max_body_size),
            timeout: config.request_timeout,
        }
    }

    pub fn url(&self) -> &str {
        self.jsonrpc_client.url()
    }

    pub async fn eth_chainid(&self) -> Result<u64, ClientError> {
        let value: Uint256 = self
            .jsonrpc_client
            .request_method("eth_chainId", Vec::<String>::new(), self.timeout)
            .await?;
        value
            .to_u64()
            .ok_or_else(|| ClientError::BadResponse(format!("chain id {value} out of range")))
    }
}

#[async_trait(?Send)]
impl WalletProvider for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ClientError> {
        let granted: Result<Vec<Address>, ClientError> = self
            .jsonrpc_client
            .request_method("eth_requestAccounts", Vec::<String>::new(), self.timeout)
            .await;
        match granted {
            Ok(accounts) => Ok(accounts),
            // plain nodes don't know the method
            Err(ClientError::JsonRpcError { code, message, .. }) => {
                debug!("eth_requestAccounts unsupported ({code} {message}), using eth_accounts");
                self.accounts().await
            }
            Err(e) => Err(e),
        }
    }

    async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
        self.jsonrpc_client
            .request_method("eth_accounts", Vec::<String>::new(), self.timeout)
            .await
    }

    async fn network(&self) -> Result<Network, ClientError> {
        Ok(Network::from_chain_id(self.eth_chainid().await?))
    }

    async fn call(&self, request: TransactionRequest) -> Result<Vec<u8>, ClientError> {
        let data: Data = self
            .jsonrpc_client
            .request_method("eth_call", (request, "latest"), self.timeout)
            .await?;
        Ok(data.0)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<Uint256, ClientError> {
        self.jsonrpc_client
            .request_method("eth_sendTransaction", vec![request], self.timeout)
            .await
    }

    async fn transaction_receipt(
        &self,
        hash: Uint256,
    ) -> Result<Option<TransactionReceipt>, ClientError> {
        self.jsonrpc_client
            .request_method(
                "eth_getTransactionReceipt",
                vec![format!("{hash:#066x}")],
                self.timeout,
            )
            .await
    }

    async fn block_number(&self) -> Result<Uint256, ClientError> {
        self.jsonrpc_client
            .request_method("eth_blockNumber", Vec::<String>::new(), self.timeout)
            .await
    }
}

#[ignore]
#[test]
fn live_node() {
    use env_logger::{Builder, Env};
    Builder::from_env(Env::default().default_filter_or("debug")).init();
    actix_rt::System::new().block_on(async {
        let wallet = RpcWallet::new(&ScopeConfig::default());
        let accounts = wallet.request_accounts().await.unwrap();
        assert!(!accounts.is_empty());
        let network = wallet.network().await.unwrap();
        assert!(network.is_local());
        wallet.block_number().await.unwrap();
    });
}
