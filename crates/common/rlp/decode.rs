use super::{
    constants::{LONG_LIST_OFFSET, LONG_STRING_OFFSET, RLP_EMPTY_LIST, RLP_NULL},
    error::RLPDecodeError,
};
use bytes::Bytes;
use ethereum_types::{Address, H160, H256, U256};

/// Upper bound on any single payload. Nothing this crate decodes comes close,
/// so larger headers are treated as corrupt input.
const MAX_RLP_BYTES: usize = 1024 * 1024 * 1024;

/// Decoding counterpart of [`RLPEncode`](crate::encode::RLPEncode).
///
/// Implementors provide [`decode_unfinished`](RLPDecode::decode_unfinished), which returns
/// the decoded value and the bytes that follow it. [`decode`](RLPDecode::decode) additionally
/// requires the whole input to be consumed.
pub trait RLPDecode: Sized {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError>;

    fn decode(rlp: &[u8]) -> Result<Self, RLPDecodeError> {
        let (decoded, remaining) = Self::decode_unfinished(rlp)?;
        if !remaining.is_empty() {
            return Err(RLPDecodeError::TrailingBytes(remaining.len(), None));
        }
        Ok(decoded)
    }
}

impl RLPDecode for bool {
    fn decode_unfinished(buf: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let first = buf.first().ok_or(RLPDecodeError::invalid_length())?;
        let value = match *first {
            RLP_NULL => false,
            0x01 => true,
            b => return Err(RLPDecodeError::MalformedBoolean(b)),
        };
        Ok((value, &buf[1..]))
    }
}

macro_rules! impl_decode_for_uint {
    ($($t:ty),*) => {
        $(
            impl RLPDecode for $t {
                fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
                    let (bytes, rest) = decode_bytes(rlp)?;
                    let padded = static_left_pad(bytes)?;
                    Ok((<$t>::from_be_bytes(padded), rest))
                }
            }
        )*
    };
}

impl_decode_for_uint!(u8, u16, u32, u64, u128, usize);

impl RLPDecode for U256 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        let padded: [u8; 32] = static_left_pad(bytes)?;
        Ok((U256::from_big_endian(&padded), rest))
    }
}

/// Fixed-size byte strings must have exactly `N` bytes.
impl<const N: usize> RLPDecode for [u8; N] {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        let value = bytes
            .try_into()
            .map_err(|_| RLPDecodeError::invalid_length())?;
        Ok((value, rest))
    }
}

impl RLPDecode for Bytes {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        Ok((Bytes::copy_from_slice(bytes), rest))
    }
}

impl RLPDecode for String {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (bytes, rest) = decode_bytes(rlp)?;
        let value = String::from_utf8(bytes.to_vec()).map_err(|_| RLPDecodeError::malformed_data())?;
        Ok((value, rest))
    }
}

impl RLPDecode for Address {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (value, rest) = RLPDecode::decode_unfinished(rlp)?;
        Ok((H160(value), rest))
    }
}

impl RLPDecode for H256 {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (value, rest) = RLPDecode::decode_unfinished(rlp)?;
        Ok((H256(value), rest))
    }
}

/// A `Vec<T>` is a list of items of the same type. Byte strings decode
/// through `Bytes` or `[u8; N]` instead.
impl<T: RLPDecode> RLPDecode for Vec<T> {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (is_list, mut payload, rest) = decode_rlp_item(rlp)?;
        if !is_list {
            return Err(RLPDecodeError::unexpected_string());
        }
        let mut items = Vec::new();
        while !payload.is_empty() {
            let (item, remaining) = T::decode_unfinished(payload)?;
            items.push(item);
            payload = remaining;
        }
        Ok((items, rest))
    }
}

impl<T1: RLPDecode, T2: RLPDecode> RLPDecode for (T1, T2) {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (is_list, payload, rest) = decode_rlp_item(rlp)?;
        if !is_list {
            return Err(RLPDecodeError::unexpected_string());
        }
        let (first, payload) = T1::decode_unfinished(payload)?;
        let (second, payload) = T2::decode_unfinished(payload)?;
        if !payload.is_empty() {
            return Err(RLPDecodeError::malformed_data());
        }
        Ok(((first, second), rest))
    }
}

impl<T1: RLPDecode, T2: RLPDecode, T3: RLPDecode> RLPDecode for (T1, T2, T3) {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (is_list, payload, rest) = decode_rlp_item(rlp)?;
        if !is_list {
            return Err(RLPDecodeError::unexpected_string());
        }
        let (first, payload) = T1::decode_unfinished(payload)?;
        let (second, payload) = T2::decode_unfinished(payload)?;
        let (third, payload) = T3::decode_unfinished(payload)?;
        if !payload.is_empty() {
            return Err(RLPDecodeError::malformed_data());
        }
        Ok(((first, second, third), rest))
    }
}

/// Reads the big-endian length that follows a long-form header.
fn read_long_length(data: &[u8], length_of_length: usize) -> Result<usize, RLPDecodeError> {
    let length_bytes = data
        .get(1..length_of_length + 1)
        .ok_or(RLPDecodeError::invalid_length())?;
    if length_bytes.first() == Some(&0) {
        return Err(RLPDecodeError::malformed_data());
    }
    let length = usize::from_be_bytes(static_left_pad(length_bytes)?);
    if length < 56 {
        // Short payloads must use the short form.
        return Err(RLPDecodeError::malformed_data());
    }
    Ok(length)
}

/// Splits off the header of the first item in `data`, returning
/// `(header_len, payload_len, is_list)`.
fn item_header(data: &[u8]) -> Result<(usize, usize, bool), RLPDecodeError> {
    let first_byte = *data.first().ok_or(RLPDecodeError::invalid_length())?;
    let (header_len, payload_len, is_list) = match first_byte {
        0..=0x7f => (0, 1, false),
        RLP_NULL..=LONG_STRING_OFFSET => (1, (first_byte - RLP_NULL) as usize, false),
        0xb8..=0xbf => {
            let length_of_length = (first_byte - LONG_STRING_OFFSET) as usize;
            let len = read_long_length(data, length_of_length)?;
            (1 + length_of_length, len, false)
        }
        RLP_EMPTY_LIST..=LONG_LIST_OFFSET => (1, (first_byte - RLP_EMPTY_LIST) as usize, true),
        0xf8..=0xff => {
            let length_of_length = (first_byte - LONG_LIST_OFFSET) as usize;
            let len = read_long_length(data, length_of_length)?;
            (1 + length_of_length, len, true)
        }
    };
    if payload_len > MAX_RLP_BYTES || data.len() < header_len + payload_len {
        return Err(RLPDecodeError::invalid_length());
    }
    Ok((header_len, payload_len, is_list))
}

/// Decodes the first item of `data`, returning whether it is a list,
/// its payload (without header) and the remaining bytes.
pub fn decode_rlp_item(data: &[u8]) -> Result<(bool, &[u8], &[u8]), RLPDecodeError> {
    let (header_len, payload_len, is_list) = item_header(data)?;
    let end = header_len + payload_len;
    let payload = &data[header_len..end];
    if !is_list && header_len == 1 && payload_len == 1 && payload[0] < RLP_NULL {
        // Single bytes below 0x80 must be encoded as themselves.
        return Err(RLPDecodeError::malformed_data());
    }
    Ok((is_list, payload, &data[end..]))
}

/// Decodes a byte string item, failing on lists.
pub fn decode_bytes(data: &[u8]) -> Result<(&[u8], &[u8]), RLPDecodeError> {
    let (is_list, payload, rest) = decode_rlp_item(data)?;
    if is_list {
        return Err(RLPDecodeError::unexpected_list());
    }
    Ok((payload, rest))
}

/// Left-pads a minimal big-endian integer to `N` bytes.
/// Leading zero bytes are rejected as non-canonical.
pub fn static_left_pad<const N: usize>(data: &[u8]) -> Result<[u8; N], RLPDecodeError> {
    let mut result = [0; N];
    if data.is_empty() {
        return Ok(result);
    }
    if data[0] == 0 {
        return Err(RLPDecodeError::LeadingZeros);
    }
    if data.len() > N {
        return Err(RLPDecodeError::IntegerOverflow {
            max: N,
            got: data.len(),
        });
    }
    result[N - data.len()..].copy_from_slice(data);
    Ok(result)
}
