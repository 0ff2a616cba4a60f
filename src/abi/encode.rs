use crate::abi::derive_method_id;
use crate::abi::token::AbiToken;
use crate::utils::{rpad32, zpad};
use crate::Error;

fn usize_word(value: usize) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}

/// Size of a token in the head of its enclosing encoding
fn head_size(token: &AbiToken) -> usize {
    if token.is_dynamic() {
        return 32;
    }
    match token {
        AbiToken::FixedArray(items) | AbiToken::Struct(items) => items.iter().map(head_size).sum(),
        _ => 32,
    }
}

/// The in place encoding of a static token, or the tail payload of a
/// dynamic one
fn encode_body(token: &AbiToken) -> Vec<u8> {
    match token {
        AbiToken::Uint(v) | AbiToken::Int(v) => v.to_be_bytes().to_vec(),
        AbiToken::Address(a) => zpad(a.as_bytes(), 32),
        AbiToken::Bool(b) => {
            let mut word = [0u8; 32];
            word[31] = *b as u8;
            word.to_vec()
        }
        AbiToken::String(s) => encode_length_prefixed(s.as_bytes()),
        AbiToken::UnboundedBytes(b) => encode_length_prefixed(b),
        AbiToken::Bytes(b) => rpad32(b),
        AbiToken::Dynamic(items) => {
            let mut out = usize_word(items.len()).to_vec();
            out.extend(encode_tokens(items));
            out
        }
        AbiToken::FixedArray(items) | AbiToken::Struct(items) => encode_tokens(items),
    }
}

fn encode_length_prefixed(bytes: &[u8]) -> Vec<u8> {
    let mut out = usize_word(bytes.len()).to_vec();
    out.extend(rpad32(bytes));
    out
}

/// Encodes a sequence of tokens with the standard head/tail layout:
/// static values in place, dynamic values behind an offset counted from
/// the start of this sequence.
pub fn encode_tokens(tokens: &[AbiToken]) -> Vec<u8> {
    let head_len: usize = tokens.iter().map(head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend(encode_body(token));
        } else {
            head.extend(encode_body(token));
        }
    }
    head.extend(tail);
    head
}

/// Selector of `signature` followed by the encoded arguments
pub fn encode_call(signature: &str, tokens: &[AbiToken]) -> Result<Vec<u8>, Error> {
    if !signature.ends_with(')') || !signature.contains('(') {
        return Err(Error::InvalidAbi(format!("bad function signature {signature}")));
    }
    let mut out = derive_method_id(signature).to_vec();
    out.extend(encode_tokens(tokens));
    Ok(out)
}
