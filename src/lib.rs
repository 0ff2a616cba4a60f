//! # Introduction
//! Abiscope is the synchronous half of a contract inspection toolkit. It knows
//! how to read a contract interface description (ABI), sort its operations by
//! mutability, turn loosely typed user input into ABI encoded call data, decode
//! return data, and make token metadata URIs fetchable.
//!
//! Nothing in this crate performs I/O, see `web3scope` for the async side.
//!
//! ## Getting started
//! ```rust
//! use abiscope::abi::{classify, ContractAbi};
//! use abiscope::coerce::coerce_arguments;
//! use abiscope::metadata::normalize_uri;
//!
//! let abi = ContractAbi::from_json_str(
//!     r#"[{"type":"function","name":"mint","inputs":[{"name":"amount","type":"uint256"}],
//!          "outputs":[],"stateMutability":"payable"}]"#,
//! )
//! .unwrap();
//! let classified = classify(abi.items());
//! assert_eq!(classified.payable.len(), 1);
//!
//! let args = coerce_arguments(&["1.5eth".to_string()]).unwrap();
//! assert_eq!(args[0], "1500000000000000000");
//!
//! assert_eq!(normalize_uri("ipfs://Qm123"), "https://ipfs.io/ipfs/Qm123");
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;

pub mod abi;
pub mod address;
pub mod coerce;
pub mod error;
pub mod metadata;
pub mod network;
pub mod units;
pub mod utils;

pub use address::Address;
pub use error::Error;
pub use network::Network;
pub use num256::Uint256;
