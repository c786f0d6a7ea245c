use forkline_crypto::{Crypto, CryptoError, NativeCrypto, keccak::keccak_hash};
use hex_literal::hex;

const SECRET_KEY: [u8; 32] =
    hex!("45a915e4d060149eb4365960e6a7a45f334393093061116b197e3240065ff2d8");

#[test]
fn known_key_address() {
    let address = NativeCrypto.address_from_secret_key(&SECRET_KEY).unwrap();
    assert_eq!(
        address.as_bytes(),
        hex!("a94f5374fce5edbc8e2a8697c15331677e6ebf0b")
    );
}

#[test]
fn signature_recovers_to_signer() {
    let digest = keccak_hash(b"forkline");
    let signature = NativeCrypto.sign_recoverable(&SECRET_KEY, &digest).unwrap();
    assert!(signature.recovery_id <= 1);
    let signer = NativeCrypto
        .recover_signer(&signature.to_bytes(), &digest)
        .unwrap();
    assert_eq!(
        signer,
        NativeCrypto.address_from_secret_key(&SECRET_KEY).unwrap()
    );
}

#[test]
fn other_message_recovers_other_address() {
    let signature = NativeCrypto
        .sign_recoverable(&SECRET_KEY, &keccak_hash(b"one"))
        .unwrap();
    let signer = NativeCrypto
        .recover_signer(&signature.to_bytes(), &keccak_hash(b"two"))
        .unwrap_or_default();
    assert_ne!(
        signer,
        NativeCrypto.address_from_secret_key(&SECRET_KEY).unwrap()
    );
}

#[test]
fn invalid_recovery_id() {
    let digest = keccak_hash(b"forkline");
    let mut bytes = NativeCrypto
        .sign_recoverable(&SECRET_KEY, &digest)
        .unwrap()
        .to_bytes();
    bytes[64] = 4;
    assert_eq!(
        NativeCrypto.recover_signer(&bytes, &digest),
        Err(CryptoError::InvalidRecoveryId)
    );
}
