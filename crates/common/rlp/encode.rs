use bytes::{BufMut, Bytes};
use ethereum_types::{Address, H256, U256};

use super::constants::{
    LONG_LIST_OFFSET, LONG_STRING_OFFSET, RLP_EMPTY_LIST, RLP_NULL, SHORT_PAYLOAD_LIMIT,
};

/// `BufMut` that only counts the bytes written to it.
#[derive(Debug, Clone, Copy, Default)]
struct ByteCounter {
    count: usize,
}

unsafe impl BufMut for ByteCounter {
    fn remaining_mut(&self) -> usize {
        usize::MAX - self.count
    }

    unsafe fn advance_mut(&mut self, cnt: usize) {
        self.count += cnt;
    }

    fn chunk_mut(&mut self) -> &mut bytes::buf::UninitSlice {
        unreachable!("every writing method used by the encoders is overridden")
    }

    fn put_u8(&mut self, _n: u8) {
        self.count += 1;
    }

    fn put_bytes(&mut self, _val: u8, cnt: usize) {
        self.count += cnt;
    }

    fn put_slice(&mut self, src: &[u8]) {
        self.count += src.len();
    }
}

pub trait RLPEncode {
    fn encode(&self, buf: &mut dyn BufMut);

    fn length(&self) -> usize {
        let mut counter = ByteCounter::default();
        self.encode(&mut counter);
        counter.count
    }

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.length());
        self.encode(&mut buf);
        buf
    }
}

/// Minimal big-endian representation of a length, without leading zeros.
fn be_length_bytes(len: usize) -> ([u8; 8], usize) {
    let bytes = (len as u64).to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    (bytes, start)
}

/// Writes the header of a byte string of `len` bytes.
fn encode_string_header(len: usize, buf: &mut dyn BufMut) {
    if len < SHORT_PAYLOAD_LIMIT {
        buf.put_u8(RLP_NULL + len as u8);
    } else {
        let (bytes, start) = be_length_bytes(len);
        buf.put_u8(LONG_STRING_OFFSET + (bytes.len() - start) as u8);
        buf.put_slice(&bytes[start..]);
    }
}

/// Writes the header of a list whose items take `payload_len` bytes.
pub fn encode_length(payload_len: usize, buf: &mut dyn BufMut) {
    if payload_len < SHORT_PAYLOAD_LIMIT {
        buf.put_u8(RLP_EMPTY_LIST + payload_len as u8);
    } else {
        let (bytes, start) = be_length_bytes(payload_len);
        buf.put_u8(LONG_LIST_OFFSET + (bytes.len() - start) as u8);
        buf.put_slice(&bytes[start..]);
    }
}

/// Total encoded size of a list with the given payload length.
pub const fn list_length(payload_len: usize) -> usize {
    if payload_len < SHORT_PAYLOAD_LIMIT {
        1 + payload_len
    } else {
        1 + (payload_len.ilog2() / 8 + 1) as usize + payload_len
    }
}

/// Encodes an integer given as big-endian bytes, stripping its leading zeros.
fn encode_be_integer(value_be: &[u8], buf: &mut dyn BufMut) {
    let start = value_be
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(value_be.len());
    value_be[start..].encode(buf);
}

impl RLPEncode for bool {
    fn encode(&self, buf: &mut dyn BufMut) {
        buf.put_u8(if *self { 0x01 } else { RLP_NULL });
    }

    fn length(&self) -> usize {
        1
    }
}

macro_rules! impl_encode_for_uint {
    ($($t:ty),*) => {
        $(
            impl RLPEncode for $t {
                fn encode(&self, buf: &mut dyn BufMut) {
                    encode_be_integer(&self.to_be_bytes(), buf);
                }
            }
        )*
    };
}

impl_encode_for_uint!(u8, u16, u32, u64, u128, usize);

impl RLPEncode for U256 {
    fn encode(&self, buf: &mut dyn BufMut) {
        encode_be_integer(&self.to_big_endian(), buf);
    }
}

impl RLPEncode for [u8] {
    fn encode(&self, buf: &mut dyn BufMut) {
        if self.len() == 1 && self[0] < RLP_NULL {
            buf.put_u8(self[0]);
        } else {
            encode_string_header(self.len(), buf);
            buf.put_slice(self);
        }
    }
}

impl<const N: usize> RLPEncode for [u8; N] {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_slice().encode(buf)
    }
}

impl RLPEncode for str {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl RLPEncode for String {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl RLPEncode for Bytes {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_ref().encode(buf)
    }
}

impl RLPEncode for Address {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl RLPEncode for H256 {
    fn encode(&self, buf: &mut dyn BufMut) {
        self.as_bytes().encode(buf)
    }
}

impl<T: RLPEncode> RLPEncode for Vec<T> {
    fn encode(&self, buf: &mut dyn BufMut) {
        let payload_len: usize = self.iter().map(RLPEncode::length).sum();
        encode_length(payload_len, buf);
        for item in self {
            item.encode(buf);
        }
    }

    fn length(&self) -> usize {
        list_length(self.iter().map(RLPEncode::length).sum())
    }
}

impl<T: RLPEncode + ?Sized> RLPEncode for &T {
    fn encode(&self, buf: &mut dyn BufMut) {
        (*self).encode(buf)
    }
}

impl<S: RLPEncode, T: RLPEncode> RLPEncode for (S, T) {
    fn encode(&self, buf: &mut dyn BufMut) {
        super::structs::Encoder::new(buf)
            .encode_field(&self.0)
            .encode_field(&self.1)
            .finish();
    }
}

impl<S: RLPEncode, T: RLPEncode, U: RLPEncode> RLPEncode for (S, T, U) {
    fn encode(&self, buf: &mut dyn BufMut) {
        super::structs::Encoder::new(buf)
            .encode_field(&self.0)
            .encode_field(&self.1)
            .encode_field(&self.2)
            .finish();
    }
}
