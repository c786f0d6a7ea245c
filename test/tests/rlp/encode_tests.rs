use ethereum_types::{Address, U256};
use forkline_rlp::{
    constants::{RLP_EMPTY_LIST, RLP_NULL},
    encode::RLPEncode,
    structs::Encoder,
};
use forkline_rlp::decode::RLPDecode;
use hex_literal::hex;
use proptest::prelude::*;

#[test]
fn encode_small_integers() {
    assert_eq!(0u64.encode_to_vec(), vec![RLP_NULL]);
    assert_eq!(15u8.encode_to_vec(), vec![0x0f]);
    assert_eq!(127u32.encode_to_vec(), vec![0x7f]);
    assert_eq!(128u32.encode_to_vec(), vec![0x81, 0x80]);
    assert_eq!(1024u64.encode_to_vec(), hex!("820400").to_vec());
}

#[test]
fn encode_u256_is_minimal() {
    assert_eq!(U256::zero().encode_to_vec(), vec![RLP_NULL]);
    assert_eq!(U256::from(0x0100).encode_to_vec(), hex!("820100").to_vec());
    let max = U256::MAX.encode_to_vec();
    assert_eq!(max.len(), 33);
    assert_eq!(max[0], 0xa0);
}

#[test]
fn encode_strings() {
    assert_eq!("dog".encode_to_vec(), hex!("83646f67").to_vec());
    assert_eq!("".encode_to_vec(), vec![RLP_NULL]);
    let long = "Lorem ipsum dolor sit amet, consectetur adipisicing elit";
    let encoded = long.encode_to_vec();
    assert_eq!(&encoded[..2], &[0xb8, 0x38]);
    assert_eq!(&encoded[2..], long.as_bytes());
}

#[test]
fn encode_lists() {
    let empty: Vec<u8> = vec![];
    assert_eq!(empty.encode_to_vec(), vec![RLP_EMPTY_LIST]);
    assert_eq!(
        vec!["cat".to_string(), "dog".to_string()].encode_to_vec(),
        hex!("c88363617483646f67").to_vec()
    );
}

#[test]
fn encode_address_keeps_leading_zeros() {
    let address = Address::from_low_u64_be(0xaa);
    let encoded = address.encode_to_vec();
    assert_eq!(encoded[0], 0x94);
    assert_eq!(encoded.len(), 21);
}

#[test]
fn encoder_builds_a_list() {
    let mut buf = Vec::new();
    Encoder::new(&mut buf)
        .encode_field(&1u8)
        .encode_field("dog")
        .encode_bytes(&[])
        .finish();
    assert_eq!(buf, hex!("c6018364 6f6780").to_vec());
}

proptest! {
    #[test]
    fn integers_encode_minimally(value in any::<u64>()) {
        let encoded = value.encode_to_vec();
        let significant = 8 - value.leading_zeros() as usize / 8;
        match value {
            0 => prop_assert_eq!(&encoded, &vec![RLP_NULL]),
            1..=0x7f => prop_assert_eq!(&encoded, &vec![value as u8]),
            _ => {
                prop_assert_eq!(encoded[0] as usize, RLP_NULL as usize + significant);
                prop_assert_ne!(encoded[1], 0);
            }
        }
        prop_assert_eq!(u64::decode(&encoded).unwrap(), value);
    }
}
