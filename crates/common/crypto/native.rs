use ethereum_types::Address;
use secp256k1::{
    Message, PublicKey, SECP256K1, SecretKey,
    ecdsa::{self, RecoveryId},
};

use crate::keccak::keccak_hash;
use crate::provider::{Crypto, CryptoError, RecoverableSignature};

/// secp256k1 order divided by two. Signatures with a larger `s` are malleable.
const SECP256K1_N_HALF: [u8; 32] =
    hex_literal::hex!("7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0");

/// [`Crypto`] backed by libsecp256k1.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCrypto;

fn address_from_public_key(public_key: &PublicKey) -> Address {
    let hash = keccak_hash(&public_key.serialize_uncompressed()[1..]);
    Address::from_slice(&hash[12..])
}

impl Crypto for NativeCrypto {
    fn sign_recoverable(
        &self,
        secret_key: &[u8; 32],
        msg: &[u8; 32],
    ) -> Result<RecoverableSignature, CryptoError> {
        let key = SecretKey::from_slice(secret_key).map_err(|_| CryptoError::InvalidSecretKey)?;
        let (recovery_id, compact) = SECP256K1
            .sign_ecdsa_recoverable(&Message::from_digest(*msg), &key)
            .serialize_compact();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);
        Ok(RecoverableSignature {
            r,
            s,
            recovery_id: recovery_id.to_i32() as u8,
        })
    }

    fn recover_signer(&self, sig: &[u8; 65], msg: &[u8; 32]) -> Result<Address, CryptoError> {
        if sig[32..64] > SECP256K1_N_HALF[..] {
            return Err(CryptoError::InvalidSignature);
        }

        let recovery_id =
            RecoveryId::from_i32(sig[64] as i32).map_err(|_| CryptoError::InvalidRecoveryId)?;
        let signature = ecdsa::RecoverableSignature::from_compact(&sig[..64], recovery_id)
            .map_err(|_| CryptoError::InvalidSignature)?;

        let public_key = SECP256K1
            .recover_ecdsa(&Message::from_digest(*msg), &signature)
            .map_err(|_| CryptoError::RecoveryFailed)?;
        Ok(address_from_public_key(&public_key))
    }

    fn address_from_secret_key(&self, secret_key: &[u8; 32]) -> Result<Address, CryptoError> {
        let key = SecretKey::from_slice(secret_key).map_err(|_| CryptoError::InvalidSecretKey)?;
        Ok(address_from_public_key(&key.public_key(SECP256K1)))
    }
}
