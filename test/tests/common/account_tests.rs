use ethereum_types::{Address, H256, U256};
use forkline_common::types::{Account, AccountField, AllocMismatchError, Storage};
use forkline_crypto::keccak::keccak_hash;
use forkline_trie::EMPTY_TRIE_HASH;

fn address() -> Address {
    Address::from_low_u64_be(0x1234)
}

#[test]
fn json_uses_padded_hex() {
    let account = Account::default()
        .with_nonce(1)
        .with_balance(2)
        .with_code(vec![0x12, 0x34])
        .with_storage(Storage::from([(0, 0), (1, 1)]));
    assert_eq!(
        serde_json::to_string(&account).unwrap(),
        r#"{"nonce":"0x01","balance":"0x02","code":"0x1234","storage":{"0x00":"0x00","0x01":"0x01"}}"#
    );
    let parsed: Account = serde_json::from_str(
        r#"{"nonce":"0x01","balance":"0x02","code":"0x1234","storage":{"0x00":"0x00","0x01":"0x01"}}"#,
    )
    .unwrap();
    assert_eq!(parsed, account);
}

#[test]
fn absent_fields_are_omitted() {
    let account = Account::default().with_balance(10);
    assert_eq!(
        serde_json::to_string(&account).unwrap(),
        r#"{"balance":"0x0a"}"#
    );
}

#[test]
fn check_alloc_reports_first_mismatch() {
    let expected = Account::default().with_nonce(1).with_balance(5);
    let observed = Account::default().with_nonce(2).with_balance(5);
    let err = expected.check_alloc(address(), &observed).unwrap_err();
    assert_eq!(err.field(), AccountField::Nonce);
    assert_eq!(err.address(), address());
    assert!(expected
        .check_alloc(address(), &Account::default().with_nonce(1).with_balance(5))
        .is_ok());
}

#[test]
fn check_alloc_treats_missing_as_zero() {
    let expected = Account::default()
        .with_nonce(0)
        .with_storage(Storage::from([(1, 0)]));
    assert!(expected.check_alloc(address(), &Account::default()).is_ok());
}

#[test]
fn check_alloc_reads_odd_length_code() {
    let expected: Account = serde_json::from_str(r#"{"code":"0x123"}"#).unwrap();
    let observed = Account::default().with_code(vec![0x01, 0x23]);
    assert!(expected.check_alloc(address(), &observed).is_ok());
}

#[test]
fn check_alloc_flags_unexpected_storage() {
    let expected = Account::default().with_storage(Storage::from([(1, 1)]));
    let observed = Account::default().with_storage(Storage::from([(1, 1), (2, 9)]));
    assert_eq!(
        expected.check_alloc(address(), &observed),
        Err(AllocMismatchError::StorageValue {
            address: address(),
            key: U256::from(2),
            expected: U256::zero(),
            got: U256::from(9),
        })
    );
}

#[test]
fn unset_fields_are_not_checked() {
    let expected = Account::default().with_balance(1);
    let observed = Account::default()
        .with_balance(1)
        .with_nonce(42)
        .with_code(vec![0x00]);
    assert!(expected.check_alloc(address(), &observed).is_ok());
}

#[test]
fn merge_overlays_present_fields() {
    let mut base = Account::default()
        .with_nonce(1)
        .with_storage(Storage::from([(0, 1)]));
    base.merge(
        &Account::default()
            .with_balance(3)
            .with_storage(Storage::from([(1, 2)])),
    );
    assert_eq!(base.nonce, Some(1));
    assert_eq!(base.balance, Some(U256::from(3)));
    assert_eq!(base.storage, Some(Storage::from([(0, 1), (1, 2)])));
}

#[test]
fn hashes_of_empty_account() {
    let account = Account::default();
    assert_eq!(account.code_hash(), H256(keccak_hash([])));
    assert_eq!(account.storage_root(), *EMPTY_TRIE_HASH);
    assert_eq!(
        Account::default()
            .with_storage(Storage::from([(5, 0)]))
            .storage_root(),
        *EMPTY_TRIE_HASH
    );
}
