use crate::abi::param_type::ParamType;
use crate::abi::token::AbiToken;
use crate::{Address, Error};
use num256::Uint256;

fn word(data: &[u8], offset: usize) -> Result<&[u8], Error> {
    offset
        .checked_add(32)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| Error::DecodeFailed(format!("no word at offset {offset}")))
}

/// Reads a length or offset word. Anything that does not fit in 64 bits
/// can not point inside a real response.
fn read_usize(data: &[u8], offset: usize) -> Result<usize, Error> {
    let w = word(data, offset)?;
    if w[..24].iter().any(|b| *b != 0) {
        return Err(Error::DecodeFailed(format!(
            "length at offset {offset} is too large"
        )));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&w[24..]);
    usize::try_from(u64::from_be_bytes(buf))
        .map_err(|_| Error::DecodeFailed(format!("length at offset {offset} is too large")))
}

fn read_length_prefixed(data: &[u8]) -> Result<&[u8], Error> {
    let len = read_usize(data, 0)?;
    len.checked_add(32)
        .and_then(|end| data.get(32..end))
        .ok_or_else(|| Error::DecodeFailed(format!("payload of {len} bytes is truncated")))
}

fn decode_sequence(types: &[ParamType], data: &[u8]) -> Result<Vec<AbiToken>, Error> {
    let mut offset = 0;
    let mut out = Vec::with_capacity(types.len());
    for kind in types {
        if kind.is_dynamic() {
            let pointer = read_usize(data, offset)?;
            let tail = data
                .get(pointer..)
                .ok_or_else(|| Error::DecodeFailed(format!("offset {pointer} out of bounds")))?;
            out.push(decode_single(kind, tail)?);
        } else {
            let head = data
                .get(offset..)
                .ok_or_else(|| Error::DecodeFailed(format!("offset {offset} out of bounds")))?;
            out.push(decode_single(kind, head)?);
        }
        offset += kind.head_size();
    }
    Ok(out)
}

fn decode_single(kind: &ParamType, data: &[u8]) -> Result<AbiToken, Error> {
    match kind {
        ParamType::Uint(_) => Ok(AbiToken::Uint(Uint256::from_be_bytes(word(data, 0)?))),
        ParamType::Int(_) => Ok(AbiToken::Int(Uint256::from_be_bytes(word(data, 0)?))),
        ParamType::Address => Ok(AbiToken::Address(Address::from_slice(
            &word(data, 0)?[12..],
        )?)),
        ParamType::Bool => Ok(AbiToken::Bool(word(data, 0)?[31] != 0)),
        ParamType::FixedBytes(size) => Ok(AbiToken::Bytes(word(data, 0)?[..*size].to_vec())),
        ParamType::String => {
            let bytes = read_length_prefixed(data)?;
            String::from_utf8(bytes.to_vec())
                .map(AbiToken::String)
                .map_err(|_| Error::DecodeFailed("string is not valid utf8".to_string()))
        }
        ParamType::Bytes => Ok(AbiToken::UnboundedBytes(
            read_length_prefixed(data)?.to_vec(),
        )),
        ParamType::Array(inner) => {
            let len = read_usize(data, 0)?;
            // every element takes at least one word, this keeps a hostile
            // length from allocating before we notice it is a lie
            if len > data.len() / 32 {
                return Err(Error::DecodeFailed(format!(
                    "array of {len} elements is truncated"
                )));
            }
            let types = vec![(**inner).clone(); len];
            Ok(AbiToken::Dynamic(decode_sequence(&types, &data[32..])?))
        }
        ParamType::FixedArray(inner, size) => {
            if *size > data.len() / 32 {
                return Err(Error::DecodeFailed(format!(
                    "array of {size} elements is truncated"
                )));
            }
            let types = vec![(**inner).clone(); *size];
            Ok(AbiToken::FixedArray(decode_sequence(&types, data)?))
        }
        ParamType::Tuple(members) => Ok(AbiToken::Struct(decode_sequence(members, data)?)),
    }
}

/// Decodes return data against the declared output types
pub fn decode_tokens(types: &[ParamType], data: &[u8]) -> Result<Vec<AbiToken>, Error> {
    decode_sequence(types, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::encode::encode_tokens;
    use crate::utils::hex_str_to_bytes;

    #[test]
    fn decode_string_return() {
        let mut data = hex_str_to_bytes(concat!(
            "0000000000000000000000000000000000000000000000000000000000000020",
            "000000000000000000000000000000000000000000000000000000000000000d",
            "697066733a2f2f516d4861736800000000000000000000000000000000000000",
        ))
        .unwrap();
        let tokens = decode_tokens(&[ParamType::String], &data).unwrap();
        assert_eq!(tokens, vec![AbiToken::String("ipfs://QmHash".to_string())]);

        // declared length now runs past the end of the data
        data[63] = 0x40;
        assert!(decode_tokens(&[ParamType::String], &data).is_err());
    }

    #[test]
    fn decode_what_we_encode() {
        let tokens = vec![
            AbiToken::String("ipfs://QmHash".to_string()),
            AbiToken::Uint(7u64.into()),
            AbiToken::Dynamic(vec![AbiToken::Bool(true), AbiToken::Bool(false)]),
        ];
        let data = encode_tokens(&tokens);
        let types = vec![
            ParamType::String,
            ParamType::Uint(256),
            ParamType::Array(Box::new(ParamType::Bool)),
        ];
        assert_eq!(decode_tokens(&types, &data).unwrap(), tokens);
    }

    #[test]
    fn decode_address() {
        let data = hex_str_to_bytes(
            "0000000000000000000000005aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
        )
        .unwrap();
        let tokens = decode_tokens(&[ParamType::Address], &data).unwrap();
        assert_eq!(
            tokens[0].to_json(),
            serde_json::json!("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")
        );
    }

    #[test]
    fn reject_truncated() {
        assert!(decode_tokens(&[ParamType::Uint(256)], &[0u8; 31]).is_err());
        let mut huge = vec![0u8; 64];
        huge[31] = 0x20;
        huge[63] = 0xff;
        assert!(decode_tokens(&[ParamType::Array(Box::new(ParamType::Uint(256)))], &huge).is_err());
    }
}
