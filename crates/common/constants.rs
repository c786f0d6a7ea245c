use ethereum_types::{Address, H160};
use hex_literal::hex;

// === Transaction defaults ===

/// Secret key of the well-known test account `0xa94f5374fce5edbc8e2a8697c15331677e6ebf0b`.
/// Used to sign transactions that carry no explicit signature.
pub const TEST_PRIVATE_KEY: [u8; 32] =
    hex!("45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8");

pub const TEST_SENDER: Address = H160(hex!("a94f5374fce5edbc8e2a8697c15331677e6ebf0b"));

/// Recipient used when a transaction does not name one.
pub const DEFAULT_RECIPIENT: Address = H160(hex!("00000000000000000000000000000000000000aa"));

pub const DEFAULT_CHAIN_ID: u64 = 1;
pub const DEFAULT_GAS_LIMIT: u64 = 21_000;
pub const DEFAULT_GAS_PRICE: u64 = 10;
pub const DEFAULT_MAX_FEE_PER_GAS: u64 = 7;
pub const DEFAULT_MAX_FEE_PER_BLOB_GAS: u64 = 1;

// === EIP-4788 ===

pub const BEACON_ROOTS_ADDRESS: Address = H160(hex!("000f3df6d732807ef1319fb7b8bb8522d0beac02"));

pub const BEACON_ROOTS_CODE: [u8; 97] = hex!(
    "3373fffffffffffffffffffffffffffffffffffffffe14604d57602036146024575f5ffd5b5f35801560495762001fff810690815414603c575f5ffd5b62001fff01545f5260205ff35b5f5ffd5b62001fff42064281555f359062001fff015500"
);

// === EIP-7702 ===

/// Prefix byte of an authorization tuple signing payload.
pub const AUTHORIZATION_MAGIC: u8 = 0x05;
