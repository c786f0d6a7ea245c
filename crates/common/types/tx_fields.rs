use bytes::BufMut;
use ethereum_types::{Address, H256, U256};
use forkline_crypto::{Crypto, CryptoError, NativeCrypto, keccak::Keccak256};
use forkline_rlp::{
    decode::RLPDecode,
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};
use serde::{Deserialize, Serialize};

use crate::constants::AUTHORIZATION_MAGIC;
use crate::types::transaction::TransactionError;

pub type AccessList = Vec<AccessListItem>;
pub type AuthorizationList = Vec<AuthorizationTuple>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<H256>,
}

impl AccessListItem {
    pub fn new(address: Address, storage_keys: Vec<H256>) -> Self {
        Self {
            address,
            storage_keys,
        }
    }
}

impl RLPEncode for AccessListItem {
    fn encode(&self, buf: &mut dyn BufMut) {
        Encoder::new(buf)
            .encode_field(&self.address)
            .encode_field(&self.storage_keys)
            .finish();
    }
}

impl RLPDecode for AccessListItem {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (address, decoder) = decoder.decode_field("address")?;
        let (storage_keys, decoder) = decoder.decode_field("storage_keys")?;
        Ok((
            AccessListItem {
                address,
                storage_keys,
            },
            decoder.finish()?,
        ))
    }
}

/// EIP-7702 authorization.
///
/// Besides the signed fields it may carry the secret key used to sign it and
/// the recovered signer. Neither is part of the canonical encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationTuple {
    #[serde(with = "crate::serde_utils::u256::hex_str")]
    pub chain_id: U256,
    pub address: Address,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub nonce: u64,
    #[serde(with = "crate::serde_utils::u256::hex_str")]
    pub v: U256,
    #[serde(with = "crate::serde_utils::u256::hex_str")]
    pub r: U256,
    #[serde(with = "crate::serde_utils::u256::hex_str")]
    pub s: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<H256>,
}

impl AuthorizationTuple {
    /// Unsigned authorization of `address` on `chain_id`.
    pub fn new(chain_id: impl Into<U256>, address: Address, nonce: u64) -> Self {
        Self {
            chain_id: chain_id.into(),
            address,
            nonce,
            ..Default::default()
        }
    }

    /// `keccak(0x05 || rlp([chain_id, address, nonce]))`
    pub fn signing_hash(&self) -> H256 {
        let mut payload = Vec::new();
        Encoder::new(&mut payload)
            .encode_field(&self.chain_id)
            .encode_field(&self.address)
            .encode_field(&self.nonce)
            .finish();
        H256(
            Keccak256::new()
                .update([AUTHORIZATION_MAGIC])
                .update(payload)
                .finalize(),
        )
    }

    /// Signs with `secret_key`, filling `v`, `r`, `s` and the signer.
    pub fn sign(&mut self, secret_key: &[u8; 32]) -> Result<(), CryptoError> {
        let crypto = NativeCrypto;
        let signature = crypto.sign_recoverable(secret_key, &self.signing_hash().0)?;
        self.v = U256::from(signature.recovery_id);
        self.r = U256::from_big_endian(&signature.r);
        self.s = U256::from_big_endian(&signature.s);
        self.signer = Some(crypto.address_from_secret_key(secret_key)?);
        self.secret_key = Some(H256(*secret_key));
        Ok(())
    }

    /// Signs with the attached secret key, if any. An already signed tuple
    /// keeps its signature only if the attached key reproduces it.
    pub fn ensure_signed(&mut self) -> Result<(), TransactionError> {
        let Some(key) = self.secret_key else {
            return Ok(());
        };
        if self.r.is_zero() && self.s.is_zero() {
            return Ok(self.sign(&key.0)?);
        }
        let mut signed = self.clone();
        signed.sign(&key.0)?;
        if (signed.v, signed.r, signed.s) != (self.v, self.r, self.s) {
            return Err(TransactionError::InvalidSignaturePrivateKey);
        }
        *self = signed;
        Ok(())
    }

    pub fn recover_signer(&self) -> Result<Address, CryptoError> {
        if self.v > U256::one() {
            return Err(CryptoError::InvalidRecoveryId);
        }
        let mut signature = [0u8; 65];
        signature[..32].copy_from_slice(&self.r.to_big_endian());
        signature[32..64].copy_from_slice(&self.s.to_big_endian());
        signature[64] = self.v.low_u32() as u8;
        NativeCrypto.recover_signer(&signature, &self.signing_hash().0)
    }
}

impl RLPEncode for AuthorizationTuple {
    fn encode(&self, buf: &mut dyn BufMut) {
        Encoder::new(buf)
            .encode_field(&self.chain_id)
            .encode_field(&self.address)
            .encode_field(&self.nonce)
            .encode_field(&self.v)
            .encode_field(&self.r)
            .encode_field(&self.s)
            .finish();
    }
}

impl RLPDecode for AuthorizationTuple {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (chain_id, decoder) = decoder.decode_field("chain_id")?;
        let (address, decoder) = decoder.decode_field("address")?;
        let (nonce, decoder) = decoder.decode_field("nonce")?;
        let (v, decoder) = decoder.decode_field("y_parity")?;
        let (r, decoder) = decoder.decode_field("r")?;
        let (s, decoder) = decoder.decode_field("s")?;
        let rest = decoder.finish()?;
        Ok((
            AuthorizationTuple {
                chain_id,
                address,
                nonce,
                v,
                r,
                s,
                signer: None,
                secret_key: None,
            },
            rest,
        ))
    }
}
