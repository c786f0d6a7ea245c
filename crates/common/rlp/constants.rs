/// Encoding of the empty byte string (and of the integer zero).
pub const RLP_NULL: u8 = 0x80;
/// Encoding of the empty list.
pub const RLP_EMPTY_LIST: u8 = 0xc0;

/// Payloads shorter than this use a single-byte header.
pub const SHORT_PAYLOAD_LIMIT: usize = 56;

pub(crate) const LONG_STRING_OFFSET: u8 = 0xb7;
pub(crate) const LONG_LIST_OFFSET: u8 = 0xf7;
