//! Interface description (ABI) model.
//!
//! Loading the JSON description, sorting its functions into invocation
//! categories, and the codec used to turn loosely typed arguments into call
//! data and return data back into JSON.

mod classify;
pub mod contract;
mod decode;
mod encode;
pub mod item;
pub mod operation;
pub mod param;
pub mod param_type;
pub mod state_mutability;
pub mod token;

pub use self::classify::{
    classify, find_metadata_operation, search_operations, Category, ClassifiedInterface,
    METADATA_OPERATION,
};
pub use self::contract::ContractAbi;
pub use self::decode::decode_tokens;
pub use self::encode::{encode_call, encode_tokens};
pub use self::item::AbiItem;
pub use self::operation::ItemKind;
pub use self::param::Param;
pub use self::param_type::ParamType;
pub use self::state_mutability::StateMutability;
pub use self::token::AbiToken;

use sha3::{Digest, Keccak256};

/// First four bytes of the keccak hash of a canonical signature
pub fn derive_method_id(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut result = [0u8; 4];
    result.copy_from_slice(&digest[0..4]);
    result
}

#[test]
fn known_selectors() {
    use crate::utils::bytes_to_hex_str;
    let known = [
        ("baz(uint32,bool)", "cdcd77c0"),
        ("bar(bytes3[2])", "fce353f6"),
        ("sam(bytes,bool,uint256[])", "a5643bf2"),
        ("f(uint256,uint32[],bytes10,bytes)", "8be65246"),
        ("tokenURI(uint256)", "c87b56dd"),
        ("uri(uint256)", "0e89341c"),
    ];
    for (signature, selector) in known {
        assert_eq!(bytes_to_hex_str(&derive_method_id(signature)), selector);
    }
}
