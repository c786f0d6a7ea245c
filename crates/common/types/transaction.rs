use std::fmt;

use bytes::{BufMut, Bytes};
use ethereum_types::{Address, H256, U256};
use forkline_crypto::{Crypto, CryptoError, NativeCrypto, keccak::keccak_hash};
use forkline_rlp::{
    decode::{RLPDecode, decode_bytes},
    encode::RLPEncode,
    error::RLPDecodeError,
    constants::RLP_NULL,
    structs::{Decoder, Encoder},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;

use crate::{
    constants::{
        DEFAULT_CHAIN_ID, DEFAULT_GAS_LIMIT, DEFAULT_GAS_PRICE, DEFAULT_MAX_FEE_PER_BLOB_GAS,
        DEFAULT_MAX_FEE_PER_GAS, DEFAULT_RECIPIENT, TEST_PRIVATE_KEY,
    },
    forks::{ForkError, ForkPoint, ForkRules, IntrinsicCostInput},
};

use super::tx_fields::{AccessList, AuthorizationList};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("only one type of fee payment field can be used in a single tx: {}", .fields.join(", "))]
    InvalidFeePayment { fields: Vec<&'static str> },
    #[error("can't define both 'signature' and 'private_key'")]
    InvalidSignaturePrivateKey,
    #[error("Unsupported transaction type: {0}")]
    UnsupportedType(u8),
    #[error("Field {field} is not part of type {tx_type} transactions")]
    FieldNotSupported { tx_type: u8, field: &'static str },
    #[error("Transaction type {tx_type} is not supported by fork {fork}")]
    TypeNotSupportedByFork { tx_type: u8, fork: String },
    #[error("Type {tx_type} transactions cannot create contracts")]
    ContractCreationNotAllowed { tx_type: u8 },
    #[error("Transaction is not signed")]
    MissingSignature,
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Decode(#[from] RLPDecodeError),
    #[error(transparent)]
    Fork(#[from] ForkError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TxType {
    #[default]
    Legacy = 0x00,
    /// EIP-2930
    AccessList = 0x01,
    /// EIP-1559
    FeeMarket = 0x02,
    /// EIP-4844
    Blob = 0x03,
    /// EIP-7702
    SetCode = 0x04,
}

impl TryFrom<u8> for TxType {
    type Error = TransactionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(TxType::Legacy),
            0x01 => Ok(TxType::AccessList),
            0x02 => Ok(TxType::FeeMarket),
            0x03 => Ok(TxType::Blob),
            0x04 => Ok(TxType::SetCode),
            other => Err(TransactionError::UnsupportedType(other)),
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

impl Serialize for TxType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        crate::serde_utils::u8::hex_str::serialize(&(*self as u8), serializer)
    }
}

impl<'de> Deserialize<'de> for TxType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = crate::serde_utils::u8::hex_str::deserialize(deserializer)?;
        TxType::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Recipient of a transaction. An empty `to` creates a contract.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TxKind {
    Call(Address),
    #[default]
    Create,
}

impl TxKind {
    pub fn is_create(&self) -> bool {
        matches!(self, TxKind::Create)
    }

    pub fn address(&self) -> Option<Address> {
        match self {
            TxKind::Call(address) => Some(*address),
            TxKind::Create => None,
        }
    }
}

impl From<Option<Address>> for TxKind {
    fn from(to: Option<Address>) -> Self {
        to.map_or(TxKind::Create, TxKind::Call)
    }
}

impl RLPEncode for TxKind {
    fn encode(&self, buf: &mut dyn BufMut) {
        match self {
            TxKind::Call(address) => address.encode(buf),
            TxKind::Create => buf.put_u8(RLP_NULL),
        }
    }
}

impl RLPDecode for TxKind {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let (payload, rest) = decode_bytes(rlp)?;
        if payload.is_empty() {
            return Ok((TxKind::Create, rest));
        }
        let (address, rest) = Address::decode_unfinished(rlp)?;
        Ok((TxKind::Call(address), rest))
    }
}

impl Serialize for TxKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.address().serialize(serializer)
    }
}

/// A signed transaction of any type.
///
/// Built through [`TransactionBuilder`], which fills defaults, infers the type
/// from the fields present and signs with the test key when no signature is
/// given. Fields that the type does not carry are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SerializedTransaction")]
pub struct Transaction {
    #[serde(rename = "type")]
    pub tx_type: TxType,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub chain_id: u64,
    #[serde(with = "crate::serde_utils::u64::hex_str")]
    pub nonce: u64,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "crate::serde_utils::u256::hex_str_opt"
    )]
    pub gas_price: Option<U256>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "crate::serde_utils::u256::hex_str_opt"
    )]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "crate::serde_utils::u256::hex_str_opt"
    )]
    pub max_fee_per_gas: Option<U256>,
    #[serde(rename = "gas", with = "crate::serde_utils::u64::hex_str")]
    pub gas_limit: u64,
    pub to: TxKind,
    #[serde(with = "crate::serde_utils::u256::hex_str")]
    pub value: U256,
    #[serde(rename = "input", with = "crate::serde_utils::bytes")]
    pub data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_list: Option<AccessList>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "crate::serde_utils::u256::hex_str_opt"
    )]
    pub max_fee_per_blob_gas: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_versioned_hashes: Option<Vec<H256>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_list: Option<AuthorizationList>,
    #[serde(with = "crate::serde_utils::u256::hex_str")]
    pub v: U256,
    #[serde(with = "crate::serde_utils::u256::hex_str")]
    pub r: U256,
    #[serde(with = "crate::serde_utils::u256::hex_str")]
    pub s: U256,
    /// EIP-155 replay protection, legacy transactions only.
    pub protected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<H256>,
}

impl Transaction {
    pub fn builder() -> TransactionBuilder {
        TransactionBuilder::default()
    }

    /// Hash the sender signs.
    ///
    /// Legacy transactions hash the RLP list of their fields, with
    /// `chain_id, 0, 0` appended when protected. Typed transactions hash the
    /// type byte followed by the RLP list of their fields.
    pub fn signing_hash(&self) -> H256 {
        let mut buf = Vec::new();
        if self.tx_type != TxType::Legacy {
            buf.push(self.tx_type as u8);
        }
        self.encode_fields(&mut buf, false);
        H256(keccak_hash(buf))
    }

    /// Canonical encoding: the RLP list for legacy transactions,
    /// `type || rlp(fields)` for typed ones.
    pub fn encode_canonical(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        if self.tx_type != TxType::Legacy {
            buf.push(self.tx_type as u8);
        }
        self.encode_fields(&mut buf, true);
        buf
    }

    pub fn rlp(&self) -> Bytes {
        Bytes::from(self.encode_canonical())
    }

    pub fn hash(&self) -> H256 {
        H256(keccak_hash(self.encode_canonical()))
    }

    pub fn decode_canonical(bytes: &[u8]) -> Result<Transaction, TransactionError> {
        let first = *bytes
            .first()
            .ok_or(RLPDecodeError::InvalidLength(Some("empty transaction")))?;
        if first >= 0xc0 {
            return Self::decode_legacy(bytes)
                .map_err(|e| e.decoding("legacy transaction").into());
        }
        let tx_type = TxType::try_from(first)?;
        if tx_type == TxType::Legacy {
            return Err(TransactionError::UnsupportedType(first));
        }
        Self::decode_typed(tx_type, &bytes[1..])
            .map_err(|e| e.decoding("typed transaction").into())
    }

    fn encode_fields(&self, buf: &mut dyn BufMut, signed: bool) {
        let zero = U256::zero();
        let mut encoder = Encoder::new(buf);
        if self.tx_type != TxType::Legacy {
            encoder = encoder.encode_field(&self.chain_id);
        }
        encoder = encoder.encode_field(&self.nonce);
        encoder = match self.tx_type {
            TxType::Legacy | TxType::AccessList => {
                encoder.encode_field(&self.gas_price.unwrap_or(zero))
            }
            _ => encoder
                .encode_field(&self.max_priority_fee_per_gas.unwrap_or(zero))
                .encode_field(&self.max_fee_per_gas.unwrap_or(zero)),
        };
        encoder = encoder
            .encode_field(&self.gas_limit)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data);
        if self.tx_type != TxType::Legacy {
            encoder = encoder.encode_field(self.access_list.as_ref().unwrap_or(&Vec::new()));
        }
        if self.tx_type == TxType::Blob {
            encoder = encoder
                .encode_field(&self.max_fee_per_blob_gas.unwrap_or(zero))
                .encode_field(self.blob_versioned_hashes.as_ref().unwrap_or(&Vec::new()));
        }
        if self.tx_type == TxType::SetCode {
            encoder = encoder.encode_field(self.authorization_list.as_ref().unwrap_or(&Vec::new()));
        }
        encoder = if signed {
            encoder
                .encode_field(&self.v)
                .encode_field(&self.r)
                .encode_field(&self.s)
        } else if self.tx_type == TxType::Legacy && self.protected {
            encoder
                .encode_field(&self.chain_id)
                .encode_field(&0u8)
                .encode_field(&0u8)
        } else {
            encoder
        };
        encoder.finish();
    }

    fn decode_legacy(rlp: &[u8]) -> Result<Transaction, RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (nonce, decoder) = decoder.decode_field("nonce")?;
        let (gas_price, decoder) = decoder.decode_field("gas_price")?;
        let (gas_limit, decoder) = decoder.decode_field("gas_limit")?;
        let (to, decoder) = decoder.decode_field("to")?;
        let (value, decoder) = decoder.decode_field("value")?;
        let (data, decoder) = decoder.decode_field("data")?;
        let (v, decoder) = decoder.decode_field::<U256>("v")?;
        let (r, decoder) = decoder.decode_field("r")?;
        let (s, decoder) = decoder.decode_field("s")?;
        let rest = decoder.finish()?;
        if !rest.is_empty() {
            return Err(RLPDecodeError::TrailingBytes(rest.len(), None));
        }
        let (protected, chain_id) = if v == U256::from(27) || v == U256::from(28) {
            (false, DEFAULT_CHAIN_ID)
        } else if v >= U256::from(35) && (v - U256::from(35)).bits() <= 64 {
            (true, ((v - U256::from(35)) / U256::from(2)).as_u64())
        } else {
            return Err(RLPDecodeError::MalformedData(Some("legacy v value")));
        };
        Ok(Transaction {
            tx_type: TxType::Legacy,
            chain_id,
            nonce,
            gas_price: Some(gas_price),
            max_priority_fee_per_gas: None,
            max_fee_per_gas: None,
            gas_limit,
            to,
            value,
            data,
            access_list: None,
            max_fee_per_blob_gas: None,
            blob_versioned_hashes: None,
            authorization_list: None,
            v,
            r,
            s,
            protected,
            sender: None,
            secret_key: None,
        })
    }

    fn decode_typed(tx_type: TxType, rlp: &[u8]) -> Result<Transaction, RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (chain_id, decoder) = decoder.decode_field("chain_id")?;
        let (nonce, decoder) = decoder.decode_field("nonce")?;
        let (gas_price, max_priority_fee_per_gas, max_fee_per_gas, decoder) =
            if tx_type == TxType::AccessList {
                let (gas_price, decoder) = decoder.decode_field("gas_price")?;
                (Some(gas_price), None, None, decoder)
            } else {
                let (priority, decoder) = decoder.decode_field("max_priority_fee_per_gas")?;
                let (max_fee, decoder) = decoder.decode_field("max_fee_per_gas")?;
                (None, Some(priority), Some(max_fee), decoder)
            };
        let (gas_limit, decoder) = decoder.decode_field("gas_limit")?;
        let (to, decoder) = decoder.decode_field("to")?;
        let (value, decoder) = decoder.decode_field("value")?;
        let (data, decoder) = decoder.decode_field("data")?;
        let (access_list, decoder) = decoder.decode_field("access_list")?;
        let (max_fee_per_blob_gas, blob_versioned_hashes, decoder) = if tx_type == TxType::Blob {
            let (max_fee, decoder) = decoder.decode_field("max_fee_per_blob_gas")?;
            let (hashes, decoder) = decoder.decode_field("blob_versioned_hashes")?;
            (Some(max_fee), Some(hashes), decoder)
        } else {
            (None, None, decoder)
        };
        let (authorization_list, decoder) = if tx_type == TxType::SetCode {
            let (list, decoder) = decoder.decode_field("authorization_list")?;
            (Some(list), decoder)
        } else {
            (None, decoder)
        };
        let (v, decoder) = decoder.decode_field("y_parity")?;
        let (r, decoder) = decoder.decode_field("r")?;
        let (s, decoder) = decoder.decode_field("s")?;
        let rest = decoder.finish()?;
        if !rest.is_empty() {
            return Err(RLPDecodeError::TrailingBytes(rest.len(), None));
        }
        Ok(Transaction {
            tx_type,
            chain_id,
            nonce,
            gas_price,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit,
            to,
            value,
            data,
            access_list: Some(access_list),
            max_fee_per_blob_gas,
            blob_versioned_hashes,
            authorization_list,
            v,
            r,
            s,
            protected: true,
            sender: None,
            secret_key: None,
        })
    }

    /// Signs with `secret_key`, replacing any existing signature.
    pub fn sign(&mut self, secret_key: &[u8; 32]) -> Result<(), TransactionError> {
        let crypto = NativeCrypto;
        let signature = crypto.sign_recoverable(secret_key, &self.signing_hash().0)?;
        let recovery_id = U256::from(signature.recovery_id);
        self.v = match self.tx_type {
            TxType::Legacy if self.protected => {
                recovery_id + U256::from(self.chain_id) * U256::from(2) + U256::from(35)
            }
            TxType::Legacy => recovery_id + U256::from(27),
            _ => recovery_id,
        };
        self.r = U256::from_big_endian(&signature.r);
        self.s = U256::from_big_endian(&signature.s);
        let sender = crypto.address_from_secret_key(secret_key)?;
        self.sender = Some(sender);
        self.secret_key = Some(H256(*secret_key));
        debug!(tx_type = %self.tx_type, sender = ?sender, "transaction signed");
        Ok(())
    }

    fn recovery_id(&self) -> Result<u8, TransactionError> {
        let recovery_id = match self.tx_type {
            TxType::Legacy if self.protected => {
                let offset = U256::from(self.chain_id) * U256::from(2) + U256::from(35);
                self.v.checked_sub(offset)
            }
            TxType::Legacy => self.v.checked_sub(U256::from(27)),
            _ => Some(self.v),
        };
        match recovery_id {
            Some(id) if id <= U256::one() => Ok(id.low_u32() as u8),
            _ => Err(CryptoError::InvalidRecoveryId.into()),
        }
    }

    /// Address that signed this transaction.
    pub fn recover_sender(&self) -> Result<Address, TransactionError> {
        if self.r.is_zero() && self.s.is_zero() {
            return Err(TransactionError::MissingSignature);
        }
        let mut signature = [0u8; 65];
        signature[..32].copy_from_slice(&self.r.to_big_endian());
        signature[32..64].copy_from_slice(&self.s.to_big_endian());
        signature[64] = self.recovery_id()?;
        Ok(NativeCrypto.recover_signer(&signature, &self.signing_hash().0)?)
    }

    /// Intrinsic gas under `fork`, without the EIP-7623 floor.
    pub fn intrinsic_gas(
        &self,
        fork: &(impl ForkRules + ?Sized),
        point: Option<ForkPoint>,
    ) -> Result<u64, TransactionError> {
        let input = IntrinsicCostInput {
            calldata: &self.data,
            contract_creation: self.to.is_create(),
            access_list: self.access_list.as_deref().unwrap_or_default(),
            authorization_count: self.authorization_list.as_ref().map_or(0, Vec::len),
        };
        Ok(fork.transaction_intrinsic_cost(&input, point)?)
    }

    /// Checks that `fork` accepts this transaction type and, for creations,
    /// that the type may create contracts.
    pub fn validate_for_fork(
        &self,
        fork: &(impl ForkRules + ?Sized),
        point: Option<ForkPoint>,
    ) -> Result<(), TransactionError> {
        let tx_type = self.tx_type as u8;
        if !fork.tx_types(point)?.contains(&tx_type) {
            let (resolved, _) = fork.resolve(point);
            return Err(TransactionError::TypeNotSupportedByFork {
                tx_type,
                fork: resolved.name().to_string(),
            });
        }
        if self.to.is_create() && !fork.contract_creating_tx_types(point)?.contains(&tx_type) {
            return Err(TransactionError::ContractCreationNotAllowed { tx_type });
        }
        Ok(())
    }
}

impl RLPEncode for Transaction {
    fn encode(&self, buf: &mut dyn BufMut) {
        buf.put_slice(&self.encode_canonical());
    }
}

fn deserialize_some<'de, T: Deserialize<'de>, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<T>, D::Error> {
    T::deserialize(deserializer).map(Some)
}

/// Unvalidated transaction fields. Unset fields are defaulted by [`build`](Self::build).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBuilder {
    #[serde(default, rename = "type", alias = "ty", with = "crate::serde_utils::u64::hex_str_opt")]
    ty: Option<u64>,
    #[serde(default, with = "crate::serde_utils::u64::hex_str_opt")]
    chain_id: Option<u64>,
    #[serde(default, with = "crate::serde_utils::u64::hex_str_opt")]
    nonce: Option<u64>,
    #[serde(default, with = "crate::serde_utils::u256::hex_str_opt")]
    gas_price: Option<U256>,
    #[serde(default, with = "crate::serde_utils::u256::hex_str_opt")]
    max_priority_fee_per_gas: Option<U256>,
    #[serde(default, with = "crate::serde_utils::u256::hex_str_opt")]
    max_fee_per_gas: Option<U256>,
    #[serde(default, rename = "gas", alias = "gasLimit", with = "crate::serde_utils::u64::hex_str_opt")]
    gas_limit: Option<u64>,
    /// `Some(None)` is an explicit contract creation.
    #[serde(default, deserialize_with = "deserialize_some")]
    to: Option<Option<Address>>,
    #[serde(default, with = "crate::serde_utils::u256::hex_str_opt")]
    value: Option<U256>,
    #[serde(default, rename = "input", alias = "data", with = "crate::serde_utils::bytes::opt")]
    data: Option<Bytes>,
    #[serde(default)]
    access_list: Option<AccessList>,
    #[serde(default, with = "crate::serde_utils::u256::hex_str_opt")]
    max_fee_per_blob_gas: Option<U256>,
    #[serde(default)]
    blob_versioned_hashes: Option<Vec<H256>>,
    #[serde(default)]
    authorization_list: Option<AuthorizationList>,
    #[serde(default, with = "crate::serde_utils::u256::hex_str_opt")]
    v: Option<U256>,
    #[serde(default, with = "crate::serde_utils::u256::hex_str_opt")]
    r: Option<U256>,
    #[serde(default, with = "crate::serde_utils::u256::hex_str_opt")]
    s: Option<U256>,
    #[serde(default)]
    secret_key: Option<H256>,
    #[serde(default)]
    protected: Option<bool>,
}

impl TransactionBuilder {
    pub fn ty(mut self, ty: u8) -> Self {
        self.ty = Some(ty.into());
        self
    }

    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn gas_price(mut self, gas_price: impl Into<U256>) -> Self {
        self.gas_price = Some(gas_price.into());
        self
    }

    pub fn max_priority_fee_per_gas(mut self, fee: impl Into<U256>) -> Self {
        self.max_priority_fee_per_gas = Some(fee.into());
        self
    }

    pub fn max_fee_per_gas(mut self, fee: impl Into<U256>) -> Self {
        self.max_fee_per_gas = Some(fee.into());
        self
    }

    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(Some(to));
        self
    }

    /// Makes this a contract creation.
    pub fn create(mut self) -> Self {
        self.to = Some(None);
        self
    }

    pub fn value(mut self, value: impl Into<U256>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn access_list(mut self, access_list: AccessList) -> Self {
        self.access_list = Some(access_list);
        self
    }

    pub fn max_fee_per_blob_gas(mut self, fee: impl Into<U256>) -> Self {
        self.max_fee_per_blob_gas = Some(fee.into());
        self
    }

    pub fn blob_versioned_hashes(mut self, hashes: Vec<H256>) -> Self {
        self.blob_versioned_hashes = Some(hashes);
        self
    }

    pub fn authorization_list(mut self, authorizations: AuthorizationList) -> Self {
        self.authorization_list = Some(authorizations);
        self
    }

    pub fn signature(mut self, v: impl Into<U256>, r: impl Into<U256>, s: impl Into<U256>) -> Self {
        self.v = Some(v.into());
        self.r = Some(r.into());
        self.s = Some(s.into());
        self
    }

    pub fn secret_key(mut self, secret_key: [u8; 32]) -> Self {
        self.secret_key = Some(H256(secret_key));
        self
    }

    /// Disables EIP-155 replay protection of legacy transactions.
    pub fn protected(mut self, protected: bool) -> Self {
        self.protected = Some(protected);
        self
    }

    fn has_signature(&self) -> bool {
        self.v.is_some() || self.r.is_some() || self.s.is_some()
    }

    fn check_fee_fields(&self) -> Result<(), TransactionError> {
        let mut conflicting = Vec::new();
        if self.gas_price.is_some() {
            if self.max_fee_per_gas.is_some() {
                conflicting.push("max_fee_per_gas");
            }
            if self.max_priority_fee_per_gas.is_some() {
                conflicting.push("max_priority_fee_per_gas");
            }
            if self.max_fee_per_blob_gas.is_some() {
                conflicting.push("max_fee_per_blob_gas");
            }
        }
        if conflicting.is_empty() {
            return Ok(());
        }
        conflicting.insert(0, "gas_price");
        Err(TransactionError::InvalidFeePayment {
            fields: conflicting,
        })
    }

    fn infer_type(&self) -> Result<TxType, TransactionError> {
        if let Some(ty) = self.ty {
            let ty = u8::try_from(ty).map_err(|_| TransactionError::UnsupportedType(u8::MAX))?;
            return TxType::try_from(ty);
        }
        Ok(
            if self.max_fee_per_blob_gas.is_some() || self.blob_versioned_hashes.is_some() {
                TxType::Blob
            } else if self.authorization_list.is_some() {
                TxType::SetCode
            } else if self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some() {
                TxType::FeeMarket
            } else if self.access_list.is_some() {
                TxType::AccessList
            } else {
                TxType::Legacy
            },
        )
    }

    fn check_fields_for(&self, tx_type: TxType) -> Result<(), TransactionError> {
        let unsupported = |field| TransactionError::FieldNotSupported {
            tx_type: tx_type as u8,
            field,
        };
        if tx_type < TxType::FeeMarket {
            if self.max_fee_per_gas.is_some() {
                return Err(unsupported("max_fee_per_gas"));
            }
            if self.max_priority_fee_per_gas.is_some() {
                return Err(unsupported("max_priority_fee_per_gas"));
            }
        } else if self.gas_price.is_some() {
            return Err(TransactionError::InvalidFeePayment {
                fields: vec!["gas_price", "type"],
            });
        }
        if tx_type == TxType::Legacy && self.access_list.is_some() {
            return Err(unsupported("access_list"));
        }
        if tx_type != TxType::Blob {
            if self.max_fee_per_blob_gas.is_some() {
                return Err(unsupported("max_fee_per_blob_gas"));
            }
            if self.blob_versioned_hashes.is_some() {
                return Err(unsupported("blob_versioned_hashes"));
            }
        }
        if tx_type != TxType::SetCode && self.authorization_list.is_some() {
            return Err(unsupported("authorization_list"));
        }
        Ok(())
    }

    /// Validates the fields, fills in defaults and signs.
    pub fn build(self) -> Result<Transaction, TransactionError> {
        self.check_fee_fields()?;
        let tx_type = self.infer_type()?;
        self.check_fields_for(tx_type)?;
        let has_signature = self.has_signature();

        let (gas_price, max_priority_fee_per_gas, max_fee_per_gas) = match tx_type {
            TxType::Legacy | TxType::AccessList => (
                Some(self.gas_price.unwrap_or(U256::from(DEFAULT_GAS_PRICE))),
                None,
                None,
            ),
            _ => (
                None,
                Some(self.max_priority_fee_per_gas.unwrap_or_default()),
                Some(self.max_fee_per_gas.unwrap_or(U256::from(DEFAULT_MAX_FEE_PER_GAS))),
            ),
        };
        let (max_fee_per_blob_gas, blob_versioned_hashes) = match tx_type {
            TxType::Blob => (
                Some(
                    self.max_fee_per_blob_gas
                        .unwrap_or(U256::from(DEFAULT_MAX_FEE_PER_BLOB_GAS)),
                ),
                Some(self.blob_versioned_hashes.unwrap_or_default()),
            ),
            _ => (None, None),
        };
        let authorization_list = match tx_type {
            TxType::SetCode => {
                let mut list = self.authorization_list.unwrap_or_default();
                for authorization in &mut list {
                    authorization.ensure_signed()?;
                }
                Some(list)
            }
            _ => None,
        };
        let access_list = match tx_type {
            TxType::Legacy => None,
            _ => Some(self.access_list.unwrap_or_default()),
        };

        let mut tx = Transaction {
            tx_type,
            chain_id: self.chain_id.unwrap_or(DEFAULT_CHAIN_ID),
            nonce: self.nonce.unwrap_or_default(),
            gas_price,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit: self.gas_limit.unwrap_or(DEFAULT_GAS_LIMIT),
            to: self.to.unwrap_or(Some(DEFAULT_RECIPIENT)).into(),
            value: self.value.unwrap_or_default(),
            data: self.data.unwrap_or_default(),
            access_list,
            max_fee_per_blob_gas,
            blob_versioned_hashes,
            authorization_list,
            v: self.v.unwrap_or_default(),
            r: self.r.unwrap_or_default(),
            s: self.s.unwrap_or_default(),
            protected: self.protected.unwrap_or(true),
            sender: None,
            secret_key: None,
        };

        match (has_signature, self.secret_key) {
            (false, secret_key) => tx.sign(&secret_key.map_or(TEST_PRIVATE_KEY, |k| k.0))?,
            (true, None) => {}
            (true, Some(_)) => return Err(TransactionError::InvalidSignaturePrivateKey),
        }
        Ok(tx)
    }
}

/// JSON form of a transaction. A signed transaction may carry the key it was
/// signed with, which must reproduce the signature.
#[derive(Deserialize)]
#[serde(transparent)]
struct SerializedTransaction(TransactionBuilder);

impl TryFrom<SerializedTransaction> for Transaction {
    type Error = TransactionError;

    fn try_from(serialized: SerializedTransaction) -> Result<Self, Self::Error> {
        let SerializedTransaction(mut builder) = serialized;
        let secret_key = if builder.has_signature() {
            builder.secret_key.take()
        } else {
            None
        };
        let tx = builder.build()?;
        let Some(secret_key) = secret_key else {
            return Ok(tx);
        };
        let mut signed = tx.clone();
        signed.sign(&secret_key.0)?;
        if (signed.v, signed.r, signed.s) != (tx.v, tx.r, tx.s) {
            return Err(TransactionError::InvalidSignaturePrivateKey);
        }
        Ok(signed)
    }
}

impl TryFrom<TransactionBuilder> for Transaction {
    type Error = TransactionError;

    fn try_from(builder: TransactionBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}
