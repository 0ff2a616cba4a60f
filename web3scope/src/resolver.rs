//! Where a contract's interface description comes from.
//!
//! An [`InterfaceResolver`] owns the description shown for one address on
//! one network. It fetches from the registry, degrades to an empty
//! description when the registry fails, and suggests another network when
//! the probe finds one that knows the address.

use crate::config::ScopeConfig;
use crate::contract::BoundContract;
use crate::jsonrpc::error::ClientError;
use crate::registry::{find_valid_network, AbiRegistry};
use crate::wallet::WalletSession;
use abiscope::abi::{classify, ClassifiedInterface, ContractAbi};
use abiscope::{Address, Network};
use std::cell::{Cell, RefCell};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    Idle,
    Fetching,
    Ready,
    /// The registry failed. The description is empty, `suggestion` is set
    /// once the probe found a network that knows the address.
    Degraded {
        error: String,
        suggestion: Option<Network>,
    },
}

pub struct InterfaceResolver<R> {
    registry: R,
    address: Address,
    network: Network,
    state: RefCell<ResolutionState>,
    abi: RefCell<ContractAbi>,
    // every write-back compares against this, stale results are dropped
    generation: Cell<u64>,
}

impl<R: AbiRegistry> InterfaceResolver<R> {
    pub fn new(registry: R, address: Address, network: Network) -> Self {
        InterfaceResolver {
            registry,
            address,
            network,
            state: RefCell::new(ResolutionState::Idle),
            abi: RefCell::new(ContractAbi::default()),
            generation: Cell::new(0),
        }
    }

    /// Starts out with a description supplied by the caller, the registry
    /// is only consulted on an explicit [`sync`](Self::sync)
    pub fn with_abi(registry: R, address: Address, network: Network, abi: ContractAbi) -> Self {
        let resolver = InterfaceResolver::new(registry, address, network);
        resolver.abi.replace(abi);
        resolver.state.replace(ResolutionState::Ready);
        resolver
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn state(&self) -> ResolutionState {
        self.state.borrow().clone()
    }

    pub fn abi(&self) -> ContractAbi {
        self.abi.borrow().clone()
    }

    pub fn classified(&self) -> ClassifiedInterface {
        classify(self.abi.borrow().items())
    }

    /// User facing hint produced by the probe
    pub fn suggestion(&self) -> Option<String> {
        match &*self.state.borrow() {
            ResolutionState::Degraded {
                suggestion: Some(network),
                ..
            } => Some(format!(
                "This contract has a verified interface on {}, try switching to it",
                network.display_name()
            )),
            _ => None,
        }
    }

    fn begin(&self) -> u64 {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }

    /// Fetches the description from the registry. On failure the state
    /// degrades and the probe runs before this returns.
    pub async fn sync(&self) {
        let generation = self.begin();
        self.state.replace(ResolutionState::Fetching);
        let result = self.registry.fetch_abi(self.address, self.network).await;
        if !self.is_current(generation) {
            debug!("Dropping stale interface fetch for {}", self.address);
            return;
        }
        match result {
            Ok(abi) => {
                info!(
                    "Loaded interface of {} with {} entries",
                    self.address,
                    abi.items().len()
                );
                self.abi.replace(abi);
                self.state.replace(ResolutionState::Ready);
            }
            Err(e) => {
                warn!("Failed to load interface of {}: {e}", self.address);
                self.abi.replace(ContractAbi::default());
                self.state.replace(ResolutionState::Degraded {
                    error: e.to_string(),
                    suggestion: None,
                });
                let found = find_valid_network(&self.registry, self.address, self.network).await;
                if !self.is_current(generation) {
                    debug!("Dropping stale probe result for {}", self.address);
                    return;
                }
                if let ResolutionState::Degraded { suggestion, .. } = &mut *self.state.borrow_mut()
                {
                    *suggestion = found;
                }
            }
        }
    }

    /// Replaces the description with a hand edited one. Anything that is
    /// not a JSON array of interface entries is rejected and the current
    /// description stays.
    pub fn apply_edit(&self, text: &str) -> Result<(), ClientError> {
        let abi = ContractAbi::from_json_str(text)?;
        self.begin();
        self.abi.replace(abi);
        self.state.replace(ResolutionState::Ready);
        Ok(())
    }

    /// Contract handle over the current description, which is empty while
    /// degraded
    pub fn bind(&self, session: &WalletSession, config: &ScopeConfig) -> BoundContract {
        BoundContract::new(self.address, self.abi(), session, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::future::join;
    use std::time::Duration;
    use tokio::time::sleep;

    const ABI: &str = r#"[{"type":"function","name":"name","inputs":[],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"}]"#;

    /// Answers from a per network table. Each lookup first takes its
    /// scripted delay, last entry first.
    struct TableRegistry {
        known: Vec<Network>,
        delays: RefCell<Vec<u64>>,
        fail_first: Cell<bool>,
    }

    impl TableRegistry {
        fn new(known: Vec<Network>) -> Self {
            TableRegistry {
                known,
                delays: RefCell::new(Vec::new()),
                fail_first: Cell::new(false),
            }
        }
    }

    #[async_trait(?Send)]
    impl AbiRegistry for TableRegistry {
        async fn fetch_abi(
            &self,
            _address: Address,
            network: Network,
        ) -> Result<ContractAbi, ClientError> {
            let fail = self.fail_first.replace(false);
            let delay = self.delays.borrow_mut().pop();
            if let Some(ms) = delay {
                sleep(Duration::from_millis(ms)).await;
            }
            if fail || !self.known.contains(&network) {
                return Err(ClientError::Registry {
                    network,
                    message: "NOTOK".to_string(),
                    result: "Contract source code not verified".to_string(),
                });
            }
            Ok(ContractAbi::from_json_str(ABI).unwrap())
        }
    }

    fn address() -> Address {
        "0x06012c8cf97bead5deae237070f9587f8e7a266d".parse().unwrap()
    }

    #[test]
    fn ready_after_fetch() {
        actix_rt::System::new().block_on(async {
            let resolver =
                InterfaceResolver::new(TableRegistry::new(vec![Network::Main]), address(), Network::Main);
            assert_eq!(resolver.state(), ResolutionState::Idle);
            resolver.sync().await;
            assert_eq!(resolver.state(), ResolutionState::Ready);
            assert_eq!(resolver.classified().view.len(), 1);
            assert_eq!(resolver.suggestion(), None);
        });
    }

    #[test]
    fn degraded_with_suggestion() {
        actix_rt::System::new().block_on(async {
            let resolver = InterfaceResolver::new(
                TableRegistry::new(vec![Network::Rinkeby]),
                address(),
                Network::Main,
            );
            resolver.sync().await;
            match resolver.state() {
                ResolutionState::Degraded { error, suggestion } => {
                    assert_eq!(
                        error,
                        "[main] NOTOK \u{2014} Contract source code not verified"
                    );
                    assert_eq!(suggestion, Some(Network::Rinkeby));
                }
                other => panic!("unexpected {other:?}"),
            }
            assert!(resolver.abi().is_empty());
            assert_eq!(
                resolver.suggestion().unwrap(),
                "This contract has a verified interface on Rinkeby Test Network, try switching to it"
            );
        });
    }

    #[test]
    fn resync_recovers() {
        actix_rt::System::new().block_on(async {
            let registry = TableRegistry::new(vec![Network::Main]);
            registry.fail_first.set(true);
            let resolver = InterfaceResolver::new(registry, address(), Network::Main);
            resolver.sync().await;
            assert!(matches!(resolver.state(), ResolutionState::Degraded { .. }));
            resolver.sync().await;
            assert_eq!(resolver.state(), ResolutionState::Ready);
            assert!(!resolver.abi().is_empty());
        });
    }

    #[test]
    fn stale_fetch_is_dropped() {
        actix_rt::System::new().block_on(async {
            let registry = TableRegistry::new(vec![Network::Main]);
            registry.fail_first.set(true);
            // first lookup is slow and fails, the second is quick and succeeds
            registry.delays.replace(vec![1, 50]);
            let resolver = InterfaceResolver::new(registry, address(), Network::Main);
            join(resolver.sync(), resolver.sync()).await;
            assert_eq!(resolver.state(), ResolutionState::Ready);
            assert_eq!(resolver.classified().view.len(), 1);
        });
    }

    #[test]
    fn hand_edits() {
        actix_rt::System::new().block_on(async {
            let resolver =
                InterfaceResolver::new(TableRegistry::new(vec![Network::Main]), address(), Network::Main);
            resolver.sync().await;
            assert!(resolver.apply_edit(r#"{"not": "an array"}"#).is_err());
            assert!(resolver.apply_edit("[oops").is_err());
            assert_eq!(resolver.classified().view.len(), 1);
            resolver.apply_edit("[]").unwrap();
            assert!(resolver.abi().is_empty());
            assert_eq!(resolver.state(), ResolutionState::Ready);
        });
    }

    #[test]
    fn supplied_abi_skips_registry() {
        let resolver = InterfaceResolver::with_abi(
            TableRegistry::new(vec![]),
            address(),
            Network::Main,
            ContractAbi::from_json_str(ABI).unwrap(),
        );
        assert_eq!(resolver.state(), ResolutionState::Ready);
        assert_eq!(resolver.classified().view.len(), 1);
    }
}
