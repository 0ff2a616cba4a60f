use abiscope::utils::{bytes_to_data, hex_str_to_bytes};
use abiscope::{Address, Uint256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::ops::Deref;

/// Serializes slice of data as "UNFORMATTED DATA" format required
/// by Ethereum JSONRPC API.
///
/// See more https://ethereum.org/en/developers/docs/apis/json-rpc/#hex-encoding
pub fn data_serialize<S>(x: &[u8], s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&bytes_to_data(x))
}

/// Deserializes slice of data as "UNFORMATTED DATA" format required
/// by Ethereum JSONRPC API.
pub fn data_deserialize<'de, D>(d: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    hex_str_to_bytes(&s).map_err(serde::de::Error::custom)
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Data(
    #[serde(
        serialize_with = "data_serialize",
        deserialize_with = "data_deserialize"
    )]
    pub Vec<u8>,
);

impl Deref for Data {
    type Target = Vec<u8>;
    fn deref(&self) -> &Vec<u8> {
        &self.0
    }
}

impl From<Vec<u8>> for Data {
    fn from(v: Vec<u8>) -> Self {
        Data(v)
    }
}

/// Quantities go over the wire as hex without leading zeroes
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct UnpaddedHex(pub Uint256);

impl Serialize for UnpaddedHex {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:#x}", self.0))
    }
}

impl From<Uint256> for UnpaddedHex {
    fn from(v: Uint256) -> Self {
        UnpaddedHex(v)
    }
}

/// Call object for `eth_call` and `eth_sendTransaction`. Gas and nonce are
/// left for the wallet to fill in.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<UnpaddedHex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// As received by getTransactionReceipt
///
/// See more: https://ethereum.org/en/developers/docs/apis/json-rpc/#eth_gettransactionreceipt
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionReceipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: Data,
    /// block number where this transaction was in, null when its pending
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<Uint256>,
    #[serde(default)]
    pub from: Option<Address>,
    /// null for contract deploy
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(rename = "gasUsed", default)]
    pub gas_used: Option<Uint256>,
    #[serde(rename = "contractAddress", default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub logs: Vec<Value>,
    /// either 1 (success) or 0 (failure), post Byzantium only
    #[serde(default)]
    pub status: Option<String>,
}

impl TransactionReceipt {
    /// Pre Byzantium receipts carry no status and count as success
    pub fn is_success(&self) -> bool {
        !matches!(self.status.as_deref(), Some("0x0") | Some("0x00") | Some("0"))
    }
}

/// Lifecycle of one submitted transaction, in the order the events occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxEvent {
    /// The wallet accepted the transaction and assigned this hash
    Submitted(Uint256),
    /// Repeats once for every newly observed block on top of the inclusion block
    Confirmed {
        confirmations: u64,
        receipt: TransactionReceipt,
    },
    Receipt(TransactionReceipt),
}

/// Options for a state changing invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Falls back to the session account when absent
    pub sender: Option<Address>,
    /// Payment in wei, only attached when non-zero
    pub value: Uint256,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            sender: None,
            value: 0u8.into(),
        }
    }
}

impl WriteOptions {
    pub fn sender(sender: Address) -> Self {
        WriteOptions {
            sender: Some(sender),
            ..Default::default()
        }
    }

    pub fn with_value(mut self, value: Uint256) -> Self {
        self.value = value;
        self
    }
}
