//! The wallet capability.
//!
//! A wallet is passed explicitly to whatever needs it. It is absent until
//! the user grants access ([`WalletSession::connect`]) and gone once the
//! session is disconnected or dropped.

mod rpc;

pub use rpc::RpcWallet;

use crate::jsonrpc::error::ClientError;
use crate::types::{TransactionReceipt, TransactionRequest};
use abiscope::{Address, Network, Uint256};
use async_trait::async_trait;
use futures::stream::{self, LocalBoxStream, StreamExt};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::sleep;

#[async_trait(?Send)]
pub trait WalletProvider {
    /// Asks the user for access, may open a prompt
    async fn request_accounts(&self) -> Result<Vec<Address>, ClientError>;
    /// Accounts already granted, never prompts
    async fn accounts(&self) -> Result<Vec<Address>, ClientError>;
    async fn network(&self) -> Result<Network, ClientError>;
    /// Read only call against the latest block
    async fn call(&self, request: TransactionRequest) -> Result<Vec<u8>, ClientError>;
    /// Hands the transaction to the wallet for signing and broadcast,
    /// returning its hash
    async fn send_transaction(&self, request: TransactionRequest) -> Result<Uint256, ClientError>;
    async fn transaction_receipt(
        &self,
        hash: Uint256,
    ) -> Result<Option<TransactionReceipt>, ClientError>;
    async fn block_number(&self) -> Result<Uint256, ClientError>;
}

/// Notifications a wallet emits on its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    NetworkChanged(Network),
}

/// A connected wallet together with the account and network currently in use
pub struct WalletSession {
    wallet: Rc<dyn WalletProvider>,
    account: Option<Address>,
    network: Network,
}

impl WalletSession {
    pub async fn connect(wallet: Rc<dyn WalletProvider>) -> Result<Self, ClientError> {
        let accounts = wallet.request_accounts().await?;
        let account = accounts.first().copied();
        if account.is_none() {
            warn!("Wallet connected without granting an account");
        }
        let network = wallet.network().await?;
        info!("Connected to {network} as {account:?}");
        Ok(WalletSession {
            wallet,
            account,
            network,
        })
    }

    pub fn wallet(&self) -> Rc<dyn WalletProvider> {
        self.wallet.clone()
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Applies a wallet notification, returns true when the session changed.
    /// The account only switches when the current one was revoked.
    pub fn apply(&mut self, event: WalletEvent) -> bool {
        match event {
            WalletEvent::AccountsChanged(accounts) => {
                let keep = match self.account {
                    Some(current) => accounts.contains(&current),
                    None => false,
                };
                if keep || accounts.is_empty() {
                    return false;
                }
                self.account = accounts.first().copied();
                debug!("Switched account to {:?}", self.account);
                true
            }
            WalletEvent::NetworkChanged(network) => {
                if network == self.network {
                    return false;
                }
                debug!("Switched network {} -> {network}", self.network);
                self.network = network;
                true
            }
        }
    }

    pub fn disconnect(self) {
        debug!("Disconnected from {}", self.network);
    }
}

struct WatchState {
    wallet: Rc<dyn WalletProvider>,
    interval: Duration,
    accounts: Option<Vec<Address>>,
    network: Option<Network>,
    pending: VecDeque<WalletEvent>,
    polled: bool,
}

impl WatchState {
    async fn poll(&mut self) {
        match self.wallet.accounts().await {
            Ok(accounts) => {
                if matches!(&self.accounts, Some(prev) if *prev != accounts) {
                    self.pending
                        .push_back(WalletEvent::AccountsChanged(accounts.clone()));
                }
                self.accounts = Some(accounts);
            }
            Err(e) => warn!("Failed to poll wallet accounts {e}"),
        }
        match self.wallet.network().await {
            Ok(network) => {
                if matches!(self.network, Some(prev) if prev != network) {
                    self.pending.push_back(WalletEvent::NetworkChanged(network));
                }
                self.network = Some(network);
            }
            Err(e) => warn!("Failed to poll wallet network {e}"),
        }
    }
}

/// Endless stream of wallet notifications, produced by polling accounts and
/// network every `interval`. The first successful poll only records a
/// baseline.
pub fn watch_wallet(
    wallet: Rc<dyn WalletProvider>,
    interval: Duration,
) -> LocalBoxStream<'static, WalletEvent> {
    let state = WatchState {
        wallet,
        interval,
        accounts: None,
        network: None,
        pending: VecDeque::new(),
        polled: false,
    };
    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((event, state));
            }
            // failed polls wait too
            if state.polled {
                sleep(state.interval).await;
            }
            state.poll().await;
            state.polled = true;
        }
    })
    .boxed_local()
}
