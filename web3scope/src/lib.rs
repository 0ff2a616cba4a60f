//! Async half of the contract inspection toolkit.
//!
//! Everything here suspends: JSON-RPC traffic, the wallet capability,
//! interface and metadata registries, and the pipelines built on top of
//! them. All futures are `?Send` and expect a single threaded runtime such
//! as the one `actix-rt` provides.

#![warn(clippy::all)]
#![allow(clippy::large_enum_variant)]
#![allow(clippy::pedantic)]

#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;

pub mod config;
pub mod contract;
pub mod discovery;
pub mod fetch;
pub mod invoke;
pub mod jsonrpc;
pub mod metadata;
pub mod registry;
pub mod resolver;
#[cfg(test)]
mod testing;
pub mod types;
pub mod wallet;

pub use config::ScopeConfig;
pub use jsonrpc::error::ClientError;
