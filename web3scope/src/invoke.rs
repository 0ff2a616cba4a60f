//! Invoking operations by name with loosely typed arguments.

use crate::contract::{ContractHandle, TransactionStream};
use crate::jsonrpc::error::ClientError;
use crate::types::WriteOptions;
use abiscope::abi::{AbiItem, Category};
use abiscope::coerce::coerce_arguments;
use futures::future::join_all;
use serde_json::{Map, Value};

/// Read only call. A missing operation or any failure is logged and comes
/// back as `None`, the caller treats both as "no data".
pub async fn invoke_read<H>(handle: &H, name: &str, args: &[Value]) -> Option<Value>
where
    H: ContractHandle + ?Sized,
{
    if !handle.has_operation(name) {
        debug!("{} has no operation {name}", handle.address());
        return None;
    }
    match handle.call(name, args).await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Reading {name} from {} failed: {e}", handle.address());
            None
        }
    }
}

/// State changing submission. Raw arguments are coerced first, a bad
/// amount fails the stream before the wallet is involved.
pub fn invoke_write<H>(
    handle: &H,
    name: &str,
    raw_args: &[String],
    options: &WriteOptions,
) -> TransactionStream
where
    H: ContractHandle + ?Sized,
{
    match coerce_arguments(raw_args) {
        Ok(args) => {
            trace!("Sending {name}{args:?} with {options:?}");
            handle.send(name, &args, options)
        }
        Err(e) => TransactionStream::failed(ClientError::from(e)),
    }
}

pub enum Invocation {
    Read(Option<Value>),
    Write(TransactionStream),
}

/// Routes an operation by its category: views are read with the raw
/// arguments as typed, anything else is submitted.
pub async fn invoke<H>(
    handle: &H,
    item: &AbiItem,
    raw_args: &[String],
    options: &WriteOptions,
) -> Invocation
where
    H: ContractHandle + ?Sized,
{
    match item.category() {
        Some(Category::View) => {
            let args: Vec<Value> = raw_args.iter().cloned().map(Value::String).collect();
            Invocation::Read(invoke_read(handle, item.name(), &args).await)
        }
        Some(_) => Invocation::Write(invoke_write(handle, item.name(), raw_args, options)),
        None => {
            debug!("{:?} {} is not invocable", item.kind, item.name());
            Invocation::Read(None)
        }
    }
}

/// Reads every named view operation without inputs, concurrently. Failed
/// reads show up as `null`.
pub async fn derive_contract_metadata<H>(handle: &H, items: &[AbiItem]) -> Map<String, Value>
where
    H: ContractHandle + ?Sized,
{
    let fields: Vec<&AbiItem> = items
        .iter()
        .filter(|item| {
            item.category() == Some(Category::View)
                && item.inputs.is_empty()
                && !item.name().is_empty()
        })
        .collect();
    let values = join_all(fields.iter().map(|item| invoke_read(handle, item.name(), &[]))).await;
    fields
        .iter()
        .zip(values)
        .map(|(item, value)| (item.name().to_string(), value.unwrap_or(Value::Null)))
        .collect()
}
