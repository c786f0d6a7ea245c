use ethereum_types::{H256, U256};
use forkline_common::types::{Storage, StorageError};
use proptest::prelude::*;

#[test]
fn store_next_assigns_consecutive_slots() {
    let mut storage = Storage::new();
    let mut word = [0u8; 32];
    word[30] = 0x03;
    assert_eq!(storage.store_next(0x100u64).unwrap(), U256::zero());
    assert_eq!(storage.store_next("0x200").unwrap(), U256::one());
    assert_eq!(storage.store_next(H256(word)).unwrap(), U256::from(2));
    assert_eq!(
        serde_json::to_string(&storage).unwrap(),
        r#"{"0x00":"0x0100","0x01":"0x0200","0x02":"0x0300"}"#
    );
}

#[test]
fn keys_of_every_shape_address_the_same_slot() {
    let mut storage = Storage::new();
    storage.set(1u8, 7u64).unwrap();
    assert_eq!(storage.get("0x01").unwrap(), Some(U256::from(7)));
    assert_eq!(storage.get("1").unwrap(), Some(U256::from(7)));
    assert_eq!(storage.get(vec![0u8, 1]).unwrap(), Some(U256::from(7)));
    assert_eq!(storage.get(U256::one()).unwrap(), Some(U256::from(7)));
}

#[test]
fn negative_values_are_twos_complement() {
    let mut storage = Storage::new();
    storage.set(0u64, -1i32).unwrap();
    assert_eq!(storage.get(0u64).unwrap(), Some(U256::MAX));
}

#[test]
fn invalid_text_is_rejected() {
    let mut storage = Storage::new();
    assert!(matches!(
        storage.set("0xzz", 1u64),
        Err(StorageError::KeyOutOfRange(_))
    ));
    assert!(matches!(
        storage.set(1u64, "twelve"),
        Err(StorageError::ValueOutOfRange(_))
    ));
}

#[test]
fn remove_and_contains() {
    let mut storage = Storage::from([(1, 2)]);
    assert!(storage.contains(1u64).unwrap());
    assert_eq!(storage.remove(1u64).unwrap(), Some(U256::from(2)));
    assert!(!storage.contains(1u64).unwrap());
    assert!(storage.is_empty());
}

#[test]
fn json_accepts_numbers_and_strings() {
    let storage: Storage =
        serde_json::from_str(r#"{"0x01": 2, "3": "0x04", "0x05": "-1"}"#).unwrap();
    assert_eq!(storage.get(1u64).unwrap(), Some(U256::from(2)));
    assert_eq!(storage.get(3u64).unwrap(), Some(U256::from(4)));
    assert_eq!(storage.get(5u64).unwrap(), Some(U256::MAX));
}

#[test]
fn appended_storage_survives_json() {
    let mut storage = Storage::new();
    storage.store_next(5u64).unwrap();
    storage.set(9u64, 3u64).unwrap();
    let json = serde_json::to_string(&storage).unwrap();
    let decoded: Storage = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, storage);
    assert_eq!(decoded.peek_slot(), U256::zero());
}

#[test]
fn non_zero_drops_empty_slots() {
    let storage = Storage::from([(0, 0), (1, 5)]);
    assert_eq!(storage.non_zero().len(), 1);
    assert!(!storage.is_all_zero());
    assert!(Storage::from([(0, 0)]).is_all_zero());
}

proptest! {
    #[test]
    fn negative_numbers_wrap_to_the_top_of_the_word(n in i64::MIN..0) {
        let wrapped = U256::MAX - U256::from(n.unsigned_abs() - 1);
        let mut signed = Storage::new();
        signed.set(n, n).unwrap();
        let mut text = Storage::new();
        text.set(n.to_string(), n.to_string()).unwrap();
        let mut unsigned = Storage::new();
        unsigned.set(wrapped, wrapped).unwrap();
        prop_assert_eq!(&signed, &unsigned);
        prop_assert_eq!(&text, &unsigned);
    }
}
