//! Finding a token's metadata pointer without knowing which token standard
//! the contract follows.

use crate::contract::ContractHandle;
use crate::jsonrpc::error::ClientError;
use abiscope::abi::METADATA_OPERATION;
use futures::future::join;
use serde_json::Value;

/// Single token standard accessor
pub const SINGLE_TOKEN_URI: &str = METADATA_OPERATION;
/// Multi token standard accessor
pub const MULTI_TOKEN_URI: &str = "uri";

/// Discovers the metadata URI of `token_id`.
///
/// With both accessors present they are called concurrently, failures count
/// as no answer and the single token accessor wins when both answer. With
/// only one present its failure is returned to the caller. With neither,
/// nothing is called at all.
pub async fn discover_token_uri<H>(
    handle: &H,
    token_id: &str,
) -> Result<Option<String>, ClientError>
where
    H: ContractHandle + ?Sized,
{
    let args = [Value::String(token_id.to_string())];
    let single = handle.has_operation(SINGLE_TOKEN_URI);
    let multi = handle.has_operation(MULTI_TOKEN_URI);
    match (single, multi) {
        (true, true) => {
            let (a, b) = join(
                handle.call(SINGLE_TOKEN_URI, &args),
                handle.call(MULTI_TOKEN_URI, &args),
            )
            .await;
            Ok([a, b].into_iter().find_map(|result| match result {
                Ok(value) => as_uri(value),
                Err(e) => {
                    debug!("Token uri lookup on {} failed {e}", handle.address());
                    None
                }
            }))
        }
        // a settled value that isn't a string has no uri to offer, only
        // failures reach the caller
        (true, false) => Ok(as_uri(handle.call(SINGLE_TOKEN_URI, &args).await?)),
        (false, true) => Ok(as_uri(handle.call(MULTI_TOKEN_URI, &args).await?)),
        (false, false) => Ok(None),
    }
}

fn as_uri(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}
