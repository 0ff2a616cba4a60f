//! Contracts bound to an address, an interface and a wallet.
//!
//! Operations are looked up by name in a map built once when the interface
//! is bound. Writes are exposed as a [`TransactionStream`] yielding the
//! lifecycle of the submission as it happens.

use crate::config::ScopeConfig;
use crate::jsonrpc::error::ClientError;
use crate::types::{Data, TransactionReceipt, TransactionRequest, TxEvent, UnpaddedHex, WriteOptions};
use crate::wallet::{WalletProvider, WalletSession};
use abiscope::abi::{classify, AbiItem, ClassifiedInterface, ContractAbi};
use abiscope::{Address, Error as AbiscopeError, Network, Uint256};
use async_trait::async_trait;
use futures::stream::{self, LocalBoxStream, Stream, StreamExt};
use num_traits::{ToPrimitive, Zero};
use serde_json::Value;
use std::collections::HashMap;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// A contract whose operations can be invoked by name
#[async_trait(?Send)]
pub trait ContractHandle {
    fn address(&self) -> Address;
    fn has_operation(&self, name: &str) -> bool;
    /// Read only call, nothing is signed
    async fn call(&self, name: &str, args: &[Value]) -> Result<Value, ClientError>;
    /// State changing submission. Nothing happens until the stream is polled.
    fn send(&self, name: &str, args: &[Value], options: &WriteOptions) -> TransactionStream;
}

/// Timing of the lifecycle stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxSettings {
    pub poll_interval: Duration,
    pub confirmations: u64,
    pub timeout: Duration,
}

impl From<&ScopeConfig> for TxSettings {
    fn from(config: &ScopeConfig) -> Self {
        TxSettings {
            poll_interval: config.poll_interval,
            confirmations: config.confirmations,
            timeout: config.transaction_timeout,
        }
    }
}

pub struct BoundContract {
    address: Address,
    abi: ContractAbi,
    operations: HashMap<String, Vec<AbiItem>>,
    wallet: Rc<dyn WalletProvider>,
    account: Option<Address>,
    network: Network,
    settings: TxSettings,
}

impl BoundContract {
    pub fn new(
        address: Address,
        abi: ContractAbi,
        session: &WalletSession,
        config: &ScopeConfig,
    ) -> Self {
        let mut operations: HashMap<String, Vec<AbiItem>> = HashMap::new();
        for item in abi.functions() {
            operations
                .entry(item.name().to_string())
                .or_default()
                .push(item.clone());
        }
        BoundContract {
            address,
            abi,
            operations,
            wallet: session.wallet(),
            account: session.account(),
            network: session.network(),
            settings: config.into(),
        }
    }

    pub fn abi(&self) -> &ContractAbi {
        &self.abi
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn classify(&self) -> ClassifiedInterface {
        classify(self.abi.items())
    }

    /// First overload of `name` taking `argc` arguments
    fn operation(&self, name: &str, argc: usize) -> Result<&AbiItem, ClientError> {
        let overloads = self
            .operations
            .get(name)
            .ok_or_else(|| ClientError::OperationNotFound(name.to_string()))?;
        match overloads.iter().find(|item| item.inputs.len() == argc) {
            Some(item) => Ok(item),
            None => Err(AbiscopeError::ArgumentCount {
                expected: overloads[0].inputs.len(),
                got: argc,
            }
            .into()),
        }
    }

    fn transaction(
        &self,
        name: &str,
        args: &[Value],
        options: &WriteOptions,
    ) -> Result<TransactionRequest, ClientError> {
        let data = self.operation(name, args.len())?.encode_input(args)?;
        let from = options.sender.or(self.account).ok_or(ClientError::NoAccount)?;
        Ok(TransactionRequest {
            from: Some(from),
            to: self.address,
            value: if options.value.is_zero() {
                None
            } else {
                Some(UnpaddedHex(options.value))
            },
            data: Some(Data(data)),
        })
    }
}

#[async_trait(?Send)]
impl ContractHandle for BoundContract {
    fn address(&self) -> Address {
        self.address
    }

    fn has_operation(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    async fn call(&self, name: &str, args: &[Value]) -> Result<Value, ClientError> {
        let item = self.operation(name, args.len())?;
        let request = TransactionRequest {
            from: self.account,
            to: self.address,
            value: None,
            data: Some(Data(item.encode_input(args)?)),
        };
        let bytes = self.wallet.call(request).await?;
        Ok(item.decode_output(&bytes)?)
    }

    fn send(&self, name: &str, args: &[Value], options: &WriteOptions) -> TransactionStream {
        match self.transaction(name, args, options) {
            Ok(request) => TransactionStream::submit(
                self.wallet.clone(),
                self.network,
                self.settings,
                request,
            ),
            Err(e) => TransactionStream::failed(e),
        }
    }
}

enum Stage {
    Submit(TransactionRequest),
    Mining {
        hash: Uint256,
    },
    Confirming {
        hash: Uint256,
        receipt: TransactionReceipt,
        inclusion: Uint256,
        seen: u64,
    },
    Done,
}

struct Lifecycle {
    wallet: Rc<dyn WalletProvider>,
    network: Network,
    settings: TxSettings,
    started: Instant,
    stage: Stage,
}

impl Lifecycle {
    fn fail(&mut self, e: ClientError) -> Option<Result<TxEvent, ClientError>> {
        self.stage = Stage::Done;
        Some(Err(e))
    }

    fn timed_out(&self) -> bool {
        self.started.elapsed() > self.settings.timeout
    }

    async fn step(&mut self) -> Option<Result<TxEvent, ClientError>> {
        loop {
            match std::mem::replace(&mut self.stage, Stage::Done) {
                Stage::Done => return None,
                Stage::Submit(request) => {
                    return match self.wallet.send_transaction(request).await {
                        Ok(hash) => {
                            if !self.network.is_local() {
                                let shown = format!("{hash:#066x}");
                                debug!(
                                    "Submitted {}",
                                    self.network.explorer_transaction_url(&shown)
                                );
                            }
                            self.started = Instant::now();
                            self.stage = Stage::Mining { hash };
                            Some(Ok(TxEvent::Submitted(hash)))
                        }
                        Err(e) => self.fail(e),
                    }
                }
                Stage::Mining { hash } => {
                    if self.timed_out() {
                        return self.fail(ClientError::TransactionTimeout);
                    }
                    match self.wallet.transaction_receipt(hash).await {
                        Ok(Some(receipt)) => match receipt.block_number.clone() {
                            Some(_) if !receipt.is_success() => {
                                return self.fail(ClientError::TransactionReverted(hash));
                            }
                            Some(inclusion) => {
                                self.stage = Stage::Confirming {
                                    hash,
                                    receipt,
                                    inclusion,
                                    seen: 0,
                                };
                            }
                            None => {
                                self.stage = Stage::Mining { hash };
                                sleep(self.settings.poll_interval).await;
                            }
                        },
                        Ok(None) => {
                            self.stage = Stage::Mining { hash };
                            sleep(self.settings.poll_interval).await;
                        }
                        Err(e) => return self.fail(e),
                    }
                }
                Stage::Confirming {
                    hash,
                    receipt,
                    inclusion,
                    seen,
                } => {
                    if seen >= self.settings.confirmations {
                        return Some(Ok(TxEvent::Receipt(receipt)));
                    }
                    if self.timed_out() {
                        return self.fail(ClientError::TransactionTimeout);
                    }
                    let current = match self.wallet.block_number().await {
                        Ok(current) => current,
                        Err(e) => return self.fail(e),
                    };
                    if confirmations_at(current, inclusion) > seen {
                        let event = TxEvent::Confirmed {
                            confirmations: seen + 1,
                            receipt: receipt.clone(),
                        };
                        self.stage = Stage::Confirming {
                            hash,
                            receipt,
                            inclusion,
                            seen: seen + 1,
                        };
                        return Some(Ok(event));
                    }
                    self.stage = Stage::Confirming {
                        hash,
                        receipt,
                        inclusion,
                        seen,
                    };
                    sleep(self.settings.poll_interval).await;
                }
            }
        }
    }
}

/// The inclusion block counts as the first confirmation
fn confirmations_at(current: Uint256, inclusion: Uint256) -> u64 {
    if current < inclusion {
        return 0;
    }
    (current - inclusion).to_u64().unwrap_or(u64::MAX - 1) + 1
}

/// Lifecycle events of one submission, strictly in the order
/// `Submitted`, `Confirmed`..., `Receipt`. A failure ends the stream with an
/// `Err` after whatever was already yielded.
pub struct TransactionStream {
    inner: LocalBoxStream<'static, Result<TxEvent, ClientError>>,
}

/// Everything a finished stream produced
#[derive(Debug)]
pub struct TransactionOutcome {
    pub events: Vec<TxEvent>,
    pub result: Result<TransactionReceipt, ClientError>,
}

impl TransactionStream {
    pub fn new(inner: LocalBoxStream<'static, Result<TxEvent, ClientError>>) -> Self {
        TransactionStream { inner }
    }

    pub fn submit(
        wallet: Rc<dyn WalletProvider>,
        network: Network,
        settings: TxSettings,
        request: TransactionRequest,
    ) -> Self {
        let lifecycle = Lifecycle {
            wallet,
            network,
            settings,
            started: Instant::now(),
            stage: Stage::Submit(request),
        };
        TransactionStream::new(
            stream::unfold(lifecycle, |mut lifecycle| async move {
                lifecycle.step().await.map(|item| (item, lifecycle))
            })
            .boxed_local(),
        )
    }

    /// A stream that fails before anything is submitted
    pub fn failed(error: ClientError) -> Self {
        TransactionStream::new(stream::once(async move { Err(error) }).boxed_local())
    }

    /// Drains the stream
    pub async fn outcome(mut self) -> TransactionOutcome {
        let mut events = Vec::new();
        while let Some(item) = self.next().await {
            match item {
                Ok(event) => events.push(event),
                Err(e) => {
                    return TransactionOutcome {
                        events,
                        result: Err(e),
                    }
                }
            }
        }
        let result = match events.last() {
            Some(TxEvent::Receipt(receipt)) => Ok(receipt.clone()),
            _ => Err(ClientError::BadResponse(
                "transaction stream ended without a receipt".to_string(),
            )),
        };
        TransactionOutcome { events, result }
    }
}

impl Stream for TransactionStream {
    type Item = Result<TxEvent, ClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    const ABI: &str = r#"[
        {"type":"function","name":"name","inputs":[],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"},
        {"type":"function","name":"mint","inputs":[{"name":"to","type":"address"}],"outputs":[],"stateMutability":"payable"},
        {"type":"function","name":"mint","inputs":[{"name":"to","type":"address"},{"name":"n","type":"uint256"}],"outputs":[],"stateMutability":"payable"},
        {"type":"event","name":"Transfer","inputs":[]}
    ]"#;

    /// Mines every transaction in block 10 and then advances one block per
    /// `block_number` call
    #[derive(Default)]
    struct ChainWallet {
        sent: RefCell<Vec<TransactionRequest>>,
        receipt_polls: Cell<u32>,
        block: Cell<u64>,
        revert: bool,
    }

    #[async_trait(?Send)]
    impl WalletProvider for ChainWallet {
        async fn request_accounts(&self) -> Result<Vec<Address>, ClientError> {
            Ok(vec![sender()])
        }
        async fn accounts(&self) -> Result<Vec<Address>, ClientError> {
            Ok(vec![sender()])
        }
        async fn network(&self) -> Result<Network, ClientError> {
            Ok(Network::Hardhat)
        }
        async fn call(&self, request: TransactionRequest) -> Result<Vec<u8>, ClientError> {
            assert_eq!(request.from, Some(sender()));
            assert!(request.value.is_none());
            // abi encoded "hi"
            let mut out = vec![0u8; 96];
            out[31] = 0x20;
            out[63] = 2;
            out[64] = b'h';
            out[65] = b'i';
            Ok(out)
        }
        async fn send_transaction(
            &self,
            request: TransactionRequest,
        ) -> Result<Uint256, ClientError> {
            self.sent.borrow_mut().push(request);
            Ok(0xabu8.into())
        }
        async fn transaction_receipt(
            &self,
            _hash: Uint256,
        ) -> Result<Option<TransactionReceipt>, ClientError> {
            let polls = self.receipt_polls.get() + 1;
            self.receipt_polls.set(polls);
            if polls < 2 {
                return Ok(None);
            }
            self.block.set(10);
            Ok(Some(TransactionReceipt {
                transaction_hash: Data(vec![0xab]),
                block_number: Some(10u8.into()),
                status: Some(if self.revert { "0x0" } else { "0x1" }.to_string()),
                ..Default::default()
            }))
        }
        async fn block_number(&self) -> Result<Uint256, ClientError> {
            let block = self.block.get();
            self.block.set(block + 1);
            Ok(block.into())
        }
    }

    fn sender() -> Address {
        "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse().unwrap()
    }

    fn target() -> Address {
        "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359".parse().unwrap()
    }

    fn config(confirmations: u64) -> ScopeConfig {
        ScopeConfig {
            poll_interval: Duration::from_millis(1),
            confirmations,
            ..Default::default()
        }
    }

    async fn bound(wallet: Rc<ChainWallet>, confirmations: u64) -> BoundContract {
        let session = WalletSession::connect(wallet).await.unwrap();
        BoundContract::new(
            target(),
            ContractAbi::from_json_str(ABI).unwrap(),
            &session,
            &config(confirmations),
        )
    }

    #[test]
    fn operations_map() {
        actix_rt::System::new().block_on(async {
            let contract = bound(Rc::new(ChainWallet::default()), 1).await;
            assert!(contract.has_operation("name"));
            assert!(contract.has_operation("mint"));
            assert!(!contract.has_operation("Transfer"));
            assert_eq!(contract.operation("mint", 2).unwrap().inputs.len(), 2);
            assert!(matches!(
                contract.operation("mint", 3),
                Err(ClientError::AbiscopeError(AbiscopeError::ArgumentCount { expected: 1, got: 3 }))
            ));
            assert!(matches!(
                contract.operation("burn", 0),
                Err(ClientError::OperationNotFound(_))
            ));
            assert_eq!(contract.classify().payable.len(), 2);
        });
    }

    #[test]
    fn read_call_decodes() {
        actix_rt::System::new().block_on(async {
            let wallet = Rc::new(ChainWallet::default());
            let contract = bound(wallet.clone(), 1).await;
            assert_eq!(contract.call("name", &[]).await.unwrap(), Value::from("hi"));
            assert!(wallet.sent.borrow().is_empty());
        });
    }

    #[test]
    fn lifecycle_in_order() {
        actix_rt::System::new().block_on(async {
            let wallet = Rc::new(ChainWallet::default());
            let contract = bound(wallet.clone(), 2).await;
            let options = WriteOptions::default().with_value(1000u32.into());
            let outcome = contract
                .send("mint", &[Value::from(target().to_string())], &options)
                .outcome()
                .await;
            let receipt = outcome.result.unwrap();
            assert_eq!(receipt.block_number, Some(10u8.into()));
            assert_eq!(outcome.events.len(), 4);
            assert_eq!(outcome.events[0], TxEvent::Submitted(0xabu8.into()));
            assert!(matches!(outcome.events[1], TxEvent::Confirmed { confirmations: 1, .. }));
            assert!(matches!(outcome.events[2], TxEvent::Confirmed { confirmations: 2, .. }));
            assert_eq!(outcome.events[3], TxEvent::Receipt(receipt));

            let sent = wallet.sent.borrow();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].from, Some(sender()));
            assert_eq!(sent[0].value, Some(UnpaddedHex(1000u32.into())));
        });
    }

    #[test]
    fn zero_value_not_attached() {
        actix_rt::System::new().block_on(async {
            let wallet = Rc::new(ChainWallet::default());
            let contract = bound(wallet.clone(), 0).await;
            let outcome = contract
                .send("mint", &[Value::from(target().to_string())], &WriteOptions::default())
                .outcome()
                .await;
            assert!(outcome.result.is_ok());
            assert_eq!(outcome.events.len(), 2);
            assert_eq!(wallet.sent.borrow()[0].value, None);
        });
    }

    #[test]
    fn revert_keeps_submitted_event() {
        actix_rt::System::new().block_on(async {
            let wallet = Rc::new(ChainWallet {
                revert: true,
                ..Default::default()
            });
            let contract = bound(wallet, 1).await;
            let outcome = contract
                .send("mint", &[Value::from(target().to_string())], &WriteOptions::default())
                .outcome()
                .await;
            assert_eq!(outcome.events, vec![TxEvent::Submitted(0xabu8.into())]);
            assert!(matches!(
                outcome.result,
                Err(ClientError::TransactionReverted(_))
            ));
        });
    }

    #[test]
    fn bad_arguments_never_reach_wallet() {
        actix_rt::System::new().block_on(async {
            let wallet = Rc::new(ChainWallet::default());
            let contract = bound(wallet.clone(), 1).await;
            let outcome = contract
                .send("mint", &[Value::from("not an address")], &WriteOptions::default())
                .outcome()
                .await;
            assert!(outcome.events.is_empty());
            assert!(outcome.result.is_err());
            assert!(wallet.sent.borrow().is_empty());
        });
    }

    #[test]
    fn confirmation_count() {
        assert_eq!(confirmations_at(9u8.into(), 10u8.into()), 0);
        assert_eq!(confirmations_at(10u8.into(), 10u8.into()), 1);
        assert_eq!(confirmations_at(12u8.into(), 10u8.into()), 3);
    }
}
