//! In-memory stand-ins for the external collaborators

use crate::contract::{ContractHandle, TransactionStream};
use crate::fetch::JsonFetcher;
use crate::jsonrpc::error::ClientError;
use crate::types::{TxEvent, WriteOptions};
use abiscope::{Address, Uint256};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;

/// Contract whose operations answer from a table. An `Err` entry is an
/// operation that exists but fails when called.
#[derive(Default)]
pub struct MockHandle {
    pub address: Address,
    pub reads: HashMap<String, Result<Value, String>>,
    pub calls: RefCell<Vec<(String, Vec<Value>)>>,
    pub sends: RefCell<Vec<(String, Vec<Value>, WriteOptions)>>,
}

impl MockHandle {
    pub fn with(mut self, name: &str, result: Result<Value, &str>) -> Self {
        self.reads
            .insert(name.to_string(), result.map_err(str::to_string));
        self
    }

    pub fn called(&self, name: &str) -> usize {
        self.calls.borrow().iter().filter(|(n, _)| n == name).count()
    }
}

#[async_trait(?Send)]
impl ContractHandle for MockHandle {
    fn address(&self) -> Address {
        self.address
    }

    fn has_operation(&self, name: &str) -> bool {
        self.reads.contains_key(name)
    }

    async fn call(&self, name: &str, args: &[Value]) -> Result<Value, ClientError> {
        self.calls
            .borrow_mut()
            .push((name.to_string(), args.to_vec()));
        match self.reads.get(name) {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(message)) => Err(ClientError::ContractCallError(message.clone())),
            None => Err(ClientError::OperationNotFound(name.to_string())),
        }
    }

    fn send(&self, name: &str, args: &[Value], options: &WriteOptions) -> TransactionStream {
        self.sends
            .borrow_mut()
            .push((name.to_string(), args.to_vec(), options.clone()));
        let hash: Uint256 = 1u8.into();
        TransactionStream::new(stream::iter(vec![Ok(TxEvent::Submitted(hash))]).boxed_local())
    }
}

/// Serves canned JSON per URL and records what was asked for
#[derive(Default)]
pub struct MockFetcher {
    pub documents: HashMap<String, Value>,
    pub requested: RefCell<Vec<String>>,
}

impl MockFetcher {
    pub fn with(mut self, url: &str, doc: Value) -> Self {
        self.documents.insert(url.to_string(), doc);
        self
    }
}

#[async_trait(?Send)]
impl JsonFetcher for MockFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, ClientError> {
        self.requested.borrow_mut().push(url.to_string());
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| ClientError::BadResponse(format!("404 from {url}")))
    }
}
