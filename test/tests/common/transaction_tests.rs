use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use forkline_common::{
    constants::{DEFAULT_RECIPIENT, TEST_PRIVATE_KEY, TEST_SENDER},
    forks::{ForkPoint, ForkRegistry},
    types::{
        AccessListItem, AuthorizationTuple, Transaction, TransactionError, TxKind, TxType,
    },
};
use forkline_crypto::keccak::keccak_hash;
use hex_literal::hex;
use proptest::prelude::*;

const LEGACY: [u8; 97] = hex!(
    "f85f800a8252089400000000000000000000000000000000000000aa808026a0cc61d852649c34cc0b71803115f38036ace257d2914f087bf885e6806a664fbda02020cb35f5d7731ab540d62614503a7f2344301a86342f67daf011c1341551ff"
);
const ACCESS_LIST: [u8; 192] = hex!(
    "01f8bd01800a8252089400000000000000000000000000000000000000aa8080f85bf859940000000000000000000000000000000000000000f842a00000000000000000000000000000000000000000000000000000000000000000a0000000000000000000000000000000000000000000000000000000000000000180a0d48930fdc0183ff3e5f5a6d87cbdb8a719bfcd0396d22ef360166fb4cc35e42ea063aba729e7a5f7b55c41b68dc6250769c98a25b5d21f5649576c5e79aa71a90e"
);
const FEE_MARKET: [u8; 193] = hex!(
    "02f8be0180050a8252089400000000000000000000000000000000000000aa8080f85bf859940000000000000000000000000000000000000000f842a00000000000000000000000000000000000000000000000000000000000000000a0000000000000000000000000000000000000000000000000000000000000000180a0759123c15b9b06a9a063c9e9568e52631e8161cf663a5035505896070f67c321a0562291c94c89b5ab380c68fb8e254d34e373f4cd546a0ca3f40e455ce7072575"
);
const BLOB: [u8; 263] = hex!(
    "03f901030180050a8252089400000000000000000000000000000000000000aa8080f85bf859940000000000000000000000000000000000000001f842a00000000000000000000000000000000000000000000000000000000000000002a0000000000000000000000000000000000000000000000000000000000000000314f842a00000000000000000000000000000000000000000000000000000000000000000a0000000000000000000000000000000000000000000000000000000000000000101a0cfdf45e03bb79a725059abfdff26243794e4f2cedc31cb951bae0064cb0d18ffa07af8ae0e4eb39dad4f8210c49e3c81f4d2c50d0d94987122b788d17efa623de1"
);
const SET_CODE: [u8; 288] = hex!(
    "04f9011c0180050a8252089400000000000000000000000000000000000000aa8080f85bf859940000000000000000000000000000000000000000f842a00000000000000000000000000000000000000000000000000000000000000000a00000000000000000000000000000000000000000000000000000000000000001f85cf85a809400000000000000000000000000000000000000008080a0def12aa13571bba668b619dc7523da4a44b4373f26ff19356a6b58a66217839fa0130454fb52ed23b604de189d89b7b119698408a1cd80995959c8e3560aabb8ca80a051b5d457dfc118d4b0793c83c728c1eeb9890ee98391493e8bb1c31855bcf3eca05d1d0c49babee471a39d63c9d5ca15f8e71051cc87335f16d9bc7e4d56de278e"
);

fn key(n: u64) -> H256 {
    H256::from_low_u64_be(n)
}

fn access_list(address: u64, keys: &[u64]) -> Vec<AccessListItem> {
    vec![AccessListItem::new(
        Address::from_low_u64_be(address),
        keys.iter().copied().map(key).collect(),
    )]
}

fn without_keys(mut tx: Transaction) -> Transaction {
    tx.sender = None;
    tx.secret_key = None;
    tx
}

#[test]
fn legacy_default_encoding() {
    let tx = Transaction::builder().build().unwrap();
    assert_eq!(tx.encode_canonical(), LEGACY.to_vec());
    assert_eq!(tx.v, U256::from(0x26));
    assert_eq!(tx.hash(), H256(keccak_hash(LEGACY)));
}

#[test]
fn legacy_contract_creation_signature() {
    let tx = Transaction::builder().create().build().unwrap();
    assert_eq!(tx.to, TxKind::Create);
    assert_eq!(tx.v, U256::from(0x25));
    assert_eq!(
        tx.r,
        U256::from_big_endian(&hex!(
            "1cfe2cbb0c3577f74d9ae192a7f1ee2d670fe806a040f427af9cb768be3d07ce"
        ))
    );
    assert_eq!(
        tx.s,
        U256::from_big_endian(&hex!(
            "0cbe2d029f52dbf93ade486625bed0603945d2c7358b31de99fe8786c00f13da"
        ))
    );
}

#[test]
fn access_list_encoding() {
    let tx = Transaction::builder()
        .access_list(access_list(0, &[0, 1]))
        .build()
        .unwrap();
    assert_eq!(tx.tx_type, TxType::AccessList);
    assert_eq!(tx.encode_canonical(), ACCESS_LIST.to_vec());
}

#[test]
fn fee_market_encoding() {
    let tx = Transaction::builder()
        .max_fee_per_gas(10u64)
        .max_priority_fee_per_gas(5u64)
        .access_list(access_list(0, &[0, 1]))
        .build()
        .unwrap();
    assert_eq!(tx.tx_type, TxType::FeeMarket);
    assert_eq!(tx.encode_canonical(), FEE_MARKET.to_vec());
}

#[test]
fn blob_encoding() {
    let tx = Transaction::builder()
        .max_fee_per_gas(10u64)
        .max_priority_fee_per_gas(5u64)
        .max_fee_per_blob_gas(20u64)
        .blob_versioned_hashes(vec![key(0), key(1)])
        .access_list(access_list(1, &[2, 3]))
        .build()
        .unwrap();
    assert_eq!(tx.tx_type, TxType::Blob);
    assert_eq!(tx.encode_canonical(), BLOB.to_vec());
}

#[test]
fn set_code_encoding_signs_authorizations() {
    let mut authorization = AuthorizationTuple::new(0u64, Address::zero(), 0);
    authorization.secret_key = Some(H256(TEST_PRIVATE_KEY));
    let tx = Transaction::builder()
        .max_fee_per_gas(10u64)
        .max_priority_fee_per_gas(5u64)
        .access_list(access_list(0, &[0, 1]))
        .authorization_list(vec![authorization])
        .build()
        .unwrap();
    assert_eq!(tx.tx_type, TxType::SetCode);
    assert_eq!(tx.encode_canonical(), SET_CODE.to_vec());
    let authorizations = tx.authorization_list.as_ref().unwrap();
    assert_eq!(authorizations[0].recover_signer().unwrap(), TEST_SENDER);
}

#[test]
fn authorization_key_must_match_signature() {
    let mut signed = AuthorizationTuple::new(0u64, Address::zero(), 0);
    signed.sign(&TEST_PRIVATE_KEY).unwrap();
    let build = |authorization: AuthorizationTuple| {
        Transaction::builder()
            .max_fee_per_gas(10u64)
            .max_priority_fee_per_gas(5u64)
            .authorization_list(vec![authorization])
            .build()
    };
    let tx = build(signed.clone()).unwrap();
    assert_eq!(tx.authorization_list.unwrap()[0], signed);

    let mut unrelated = signed;
    unrelated.r = U256::one();
    assert_eq!(
        build(unrelated).unwrap_err(),
        TransactionError::InvalidSignaturePrivateKey
    );
}

#[test]
fn canonical_vectors_decode() {
    for encoded in [
        LEGACY.as_slice(),
        ACCESS_LIST.as_slice(),
        FEE_MARKET.as_slice(),
        BLOB.as_slice(),
        SET_CODE.as_slice(),
    ] {
        let tx = Transaction::decode_canonical(encoded).unwrap();
        assert_eq!(tx.encode_canonical(), encoded.to_vec());
        assert_eq!(tx.recover_sender().unwrap(), TEST_SENDER);
        assert_eq!(tx.sender, None);
    }
}

#[test]
fn decode_rejects_unknown_type() {
    assert_eq!(
        Transaction::decode_canonical(&[0x05, 0xc0]),
        Err(TransactionError::UnsupportedType(5))
    );
    assert!(Transaction::decode_canonical(&[]).is_err());
}

#[test]
fn explicit_signature_is_kept() {
    let reference = Transaction::builder().build().unwrap();
    let tx = Transaction::builder()
        .signature(reference.v, reference.r, reference.s)
        .build()
        .unwrap();
    assert_eq!(tx.sender, None);
    assert_eq!(tx.encode_canonical(), LEGACY.to_vec());
    assert_eq!(tx.recover_sender().unwrap(), TEST_SENDER);
}

#[test]
fn signature_and_key_are_exclusive() {
    let reference = Transaction::builder().build().unwrap();
    let err = Transaction::builder()
        .signature(reference.v, reference.r, reference.s)
        .secret_key(TEST_PRIVATE_KEY)
        .build()
        .unwrap_err();
    assert_eq!(err, TransactionError::InvalidSignaturePrivateKey);
}

#[test]
fn json_key_must_match_signature() {
    let reference = Transaction::builder().build().unwrap();
    let json = serde_json::to_value(&reference).unwrap();
    assert!(json.get("secretKey").is_some());
    assert_eq!(serde_json::from_value::<Transaction>(json.clone()).unwrap(), reference);

    let mut tampered = json;
    tampered["r"] = serde_json::Value::String("0x1".into());
    assert!(serde_json::from_value::<Transaction>(tampered).is_err());
}

#[test]
fn gas_price_cannot_mix_with_fee_market_fields() {
    let err = Transaction::builder()
        .gas_price(1u64)
        .max_priority_fee_per_gas(1u64)
        .max_fee_per_blob_gas(1u64)
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        TransactionError::InvalidFeePayment {
            fields: vec![
                "gas_price",
                "max_priority_fee_per_gas",
                "max_fee_per_blob_gas"
            ]
        }
    );
}

#[test]
fn explicit_type_must_match_fields() {
    assert!(matches!(
        Transaction::builder().ty(0).max_fee_per_gas(1u64).build(),
        Err(TransactionError::FieldNotSupported { tx_type: 0, .. })
    ));
    assert!(matches!(
        Transaction::builder().ty(2).gas_price(1u64).build(),
        Err(TransactionError::InvalidFeePayment { .. })
    ));
    assert_eq!(
        Transaction::builder().ty(9).build(),
        Err(TransactionError::UnsupportedType(9))
    );
}

#[test]
fn json_output() {
    let tx = Transaction::builder().data(vec![0x01]).build().unwrap();
    let json = serde_json::to_value(&tx).unwrap();
    assert_eq!(json["type"], "0x0");
    assert_eq!(json["chainId"], "0x1");
    assert_eq!(json["gas"], "0x5208");
    assert_eq!(json["gasPrice"], "0xa");
    assert_eq!(json["input"], "0x01");
    assert_eq!(json["to"], "0x00000000000000000000000000000000000000aa");
    assert_eq!(json["sender"], "0xa94f5374fce5edbc8e2a8697c15331677e6ebf0b");
    assert!(json.get("maxFeePerGas").is_none());
    assert!(json.get("accessList").is_none());

    let parsed: Transaction = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, tx);
}

#[test]
fn json_null_recipient_creates() {
    let tx: Transaction = serde_json::from_str(r#"{"to": null}"#).unwrap();
    assert!(tx.to.is_create());
    assert_eq!(serde_json::to_value(&tx).unwrap()["to"], serde_json::Value::Null);

    let tx: Transaction = serde_json::from_str("{}").unwrap();
    assert_eq!(tx.to, TxKind::Call(DEFAULT_RECIPIENT));
}

#[test]
fn json_blob_transaction() {
    let tx: Transaction = serde_json::from_str(
        r#"{
            "to": "0x0000000000000000000000000000000000001234",
            "data": "0x0100",
            "accessList": [{
                "address": "0x0000000000000000000000000000000000001234",
                "storageKeys": [
                    "0x0000000000000000000000000000000000000000000000000000000000000000",
                    "0x0000000000000000000000000000000000000000000000000000000000000001"
                ]
            }],
            "maxPriorityFeePerGas": 10,
            "maxFeePerGas": 20,
            "maxFeePerBlobGas": 30,
            "blobVersionedHashes": [
                "0x0000000000000000000000000000000000000000000000000000000000000000",
                "0x0000000000000000000000000000000000000000000000000000000000000001"
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(tx.tx_type, TxType::Blob);
    assert_eq!(tx.data, Bytes::from_static(&[0x01, 0x00]));
    assert_eq!(tx.v, U256::zero());
    assert_eq!(
        tx.r,
        U256::from_big_endian(&hex!(
            "418bb557c43262375f80556cb09dac5e67396acf0eaaf2c2540523d1ce54b280"
        ))
    );
    assert_eq!(
        tx.s,
        U256::from_big_endian(&hex!(
            "4fa36090ea68a1138043d943ced123c0b0807d82ff3342a6977cbc09230e927c"
        ))
    );
}

#[test]
fn json_conflicting_fees() {
    let err = serde_json::from_str::<Transaction>(r#"{"gasPrice": 1, "maxFeePerGas": 2}"#)
        .unwrap_err();
    assert!(err.to_string().contains("only one type of fee payment field"));
}

#[test]
fn intrinsic_gas_follows_the_fork() {
    let registry = ForkRegistry::mainline();
    let frontier = registry.fork("Frontier").unwrap();
    let homestead = registry.fork("Homestead").unwrap();
    let istanbul = registry.fork("Istanbul").unwrap();
    let prague = registry.fork("Prague").unwrap();

    let call = Transaction::builder().data(vec![0x00, 0x01]).build().unwrap();
    assert_eq!(call.intrinsic_gas(&frontier, None).unwrap(), 21_072);
    assert_eq!(call.intrinsic_gas(&istanbul, None).unwrap(), 21_020);

    let create = Transaction::builder().create().build().unwrap();
    assert_eq!(create.intrinsic_gas(&frontier, None).unwrap(), 21_000);
    assert_eq!(create.intrinsic_gas(&homestead, None).unwrap(), 53_000);

    let set_code = Transaction::decode_canonical(&SET_CODE).unwrap();
    assert_eq!(set_code.intrinsic_gas(&prague, None).unwrap(), 52_200);
}

#[test]
fn fork_validation() {
    let registry = ForkRegistry::mainline();
    let berlin = registry.fork("Berlin").unwrap();
    let cancun = registry.fork("Cancun").unwrap();

    let fee_market = Transaction::decode_canonical(&FEE_MARKET).unwrap();
    assert_eq!(
        fee_market.validate_for_fork(&berlin, None),
        Err(TransactionError::TypeNotSupportedByFork {
            tx_type: 2,
            fork: "Berlin".to_string()
        })
    );
    assert!(fee_market.validate_for_fork(&cancun, None).is_ok());

    let blob_create = Transaction::builder()
        .max_fee_per_blob_gas(1u64)
        .create()
        .build()
        .unwrap();
    assert_eq!(
        blob_create.validate_for_fork(&cancun, None),
        Err(TransactionError::ContractCreationNotAllowed { tx_type: 3 })
    );
    let legacy_create = Transaction::builder().create().build().unwrap();
    assert!(legacy_create.validate_for_fork(&cancun, None).is_ok());
}

#[test]
fn fork_validation_across_a_transition() {
    let transition = ForkRegistry::mainline()
        .transition("ShanghaiToCancunAtTime15k")
        .unwrap();
    let blob = Transaction::decode_canonical(&BLOB).unwrap();
    assert!(matches!(
        blob.validate_for_fork(&transition, Some(ForkPoint::at_timestamp(14_999))),
        Err(TransactionError::TypeNotSupportedByFork { fork, .. }) if fork == "Shanghai"
    ));
    assert!(blob
        .validate_for_fork(&transition, Some(ForkPoint::at_timestamp(15_000)))
        .is_ok());
    assert!(blob.validate_for_fork(&transition, None).is_ok());
}

fn arb_transaction() -> impl Strategy<Value = Transaction> {
    (
        0u8..=3,
        any::<u64>(),
        any::<u64>(),
        any::<u128>(),
        proptest::collection::vec(any::<u8>(), 0..64),
        any::<bool>(),
    )
        .prop_map(|(ty, chain_id, nonce, value, data, create)| {
            let builder = Transaction::builder()
                .ty(ty)
                .chain_id(chain_id % 1_000_000 + 1)
                .nonce(nonce)
                .value(value)
                .data(data);
            let builder = if create && ty < 3 { builder.create() } else { builder };
            builder.build().unwrap()
        })
}

proptest! {
    #[test]
    fn decode_recovers_encoded_transaction(tx in arb_transaction()) {
        let decoded = Transaction::decode_canonical(&tx.encode_canonical()).unwrap();
        prop_assert_eq!(decoded.recover_sender().unwrap(), TEST_SENDER);
        prop_assert_eq!(decoded, without_keys(tx));
    }
}
