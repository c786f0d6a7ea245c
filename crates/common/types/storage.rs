use std::collections::BTreeMap;
use std::fmt;

use ethereum_types::{H256, U256};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use thiserror::Error;

use crate::serde_utils::{parse_u256, to_padded_hex};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage key out of range: {0}")]
    KeyOutOfRange(String),
    #[error("Storage value out of range: {0}")]
    ValueOutOfRange(String),
    #[error("Invalid storage number: {0}")]
    InvalidNumber(String),
}

/// A value usable as a storage key or value.
///
/// Everything is reduced to a 256-bit word. Negative integers are taken as
/// their two's complement within 256 bits, so `-1` is `2^256 - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageWord {
    Word(U256),
    Signed(i128),
    Text(String),
    Bytes(Vec<u8>),
}

impl StorageWord {
    pub fn to_u256(&self) -> Result<U256, StorageError> {
        match self {
            StorageWord::Word(value) => Ok(*value),
            StorageWord::Signed(value) => Ok(signed_to_u256(*value)),
            StorageWord::Text(text) => parse_signed_text(text),
            StorageWord::Bytes(bytes) => {
                if bytes.len() > 32 {
                    return Err(StorageError::InvalidNumber(format!(
                        "{} bytes do not fit in a storage word",
                        bytes.len()
                    )));
                }
                Ok(U256::from_big_endian(bytes))
            }
        }
    }
}

fn signed_to_u256(value: i128) -> U256 {
    if value >= 0 {
        U256::from(value as u128)
    } else {
        // Two's complement: 2^256 - |value|
        U256::zero().overflowing_sub(U256::from(value.unsigned_abs())).0
    }
}

fn parse_signed_text(text: &str) -> Result<U256, StorageError> {
    let text = text.trim();
    let (negative, magnitude) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = parse_u256(magnitude).map_err(StorageError::InvalidNumber)?;
    Ok(if negative {
        U256::zero().overflowing_sub(value).0
    } else {
        value
    })
}

macro_rules! impl_storage_word_from {
    ($variant:ident: $($t:ty),*) => {
        $(
            impl From<$t> for StorageWord {
                fn from(value: $t) -> Self {
                    StorageWord::$variant(value.into())
                }
            }
        )*
    };
}

impl_storage_word_from!(Word: U256, u64, u32, u8);
impl_storage_word_from!(Signed: i128, i64, i32);
impl_storage_word_from!(Text: String, &str);
impl_storage_word_from!(Bytes: Vec<u8>, &[u8]);

impl From<H256> for StorageWord {
    fn from(value: H256) -> Self {
        StorageWord::Word(U256::from_big_endian(value.as_bytes()))
    }
}

/// Sparse account storage.
///
/// Besides explicit keys it keeps a "next slot" counter so values can be
/// appended with [`Storage::store_next`] without choosing a key. Equality
/// compares the slots only; the counter is not part of the stored state.
#[derive(Debug, Clone, Default)]
pub struct Storage {
    slots: BTreeMap<U256, U256>,
    current_slot: U256,
}

impl PartialEq for Storage {
    fn eq(&self, other: &Self) -> bool {
        self.slots == other.slots
    }
}

impl Eq for Storage {}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(
        &mut self,
        key: impl Into<StorageWord>,
        value: impl Into<StorageWord>,
    ) -> Result<(), StorageError> {
        let key = key
            .into()
            .to_u256()
            .map_err(|e| StorageError::KeyOutOfRange(e.to_string()))?;
        let value = value
            .into()
            .to_u256()
            .map_err(|e| StorageError::ValueOutOfRange(e.to_string()))?;
        self.slots.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: impl Into<StorageWord>) -> Result<Option<U256>, StorageError> {
        let key = key
            .into()
            .to_u256()
            .map_err(|e| StorageError::KeyOutOfRange(e.to_string()))?;
        Ok(self.slots.get(&key).copied())
    }

    pub fn contains(&self, key: impl Into<StorageWord>) -> Result<bool, StorageError> {
        Ok(self.get(key)?.is_some())
    }

    pub fn remove(&mut self, key: impl Into<StorageWord>) -> Result<Option<U256>, StorageError> {
        let key = key
            .into()
            .to_u256()
            .map_err(|e| StorageError::KeyOutOfRange(e.to_string()))?;
        Ok(self.slots.remove(&key))
    }

    /// Stores `value` at the next free slot and returns the slot used.
    pub fn store_next(&mut self, value: impl Into<StorageWord>) -> Result<U256, StorageError> {
        let slot = self.current_slot;
        self.set(slot, value)?;
        self.current_slot = slot.overflowing_add(U256::one()).0;
        Ok(slot)
    }

    /// Slot the next [`store_next`](Self::store_next) call will use.
    pub fn peek_slot(&self) -> U256 {
        self.current_slot
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&U256, &U256)> {
        self.slots.iter()
    }

    /// Entries with a non-zero value.
    pub fn non_zero(&self) -> BTreeMap<U256, U256> {
        self.slots
            .iter()
            .filter(|(_, value)| !value.is_zero())
            .map(|(k, v)| (*k, *v))
            .collect()
    }

    /// True when every stored value is zero.
    pub fn is_all_zero(&self) -> bool {
        self.slots.values().all(U256::is_zero)
    }

    /// Key-wise merge, `other` wins on conflicts.
    pub fn merge(&mut self, other: &Storage) {
        self.slots
            .extend(other.slots.iter().map(|(k, v)| (*k, *v)));
    }
}

impl FromIterator<(U256, U256)> for Storage {
    fn from_iter<I: IntoIterator<Item = (U256, U256)>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
            current_slot: U256::zero(),
        }
    }
}

impl<const N: usize> From<[(u64, u64); N]> for Storage {
    fn from(entries: [(u64, u64); N]) -> Self {
        entries
            .into_iter()
            .map(|(k, v)| (U256::from(k), U256::from(v)))
            .collect()
    }
}

impl Serialize for Storage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.slots.len()))?;
        for (key, value) in &self.slots {
            map.serialize_entry(&to_padded_hex(*key), &to_padded_hex(*value))?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonWord {
    Number(u64),
    Signed(i64),
    Text(String),
}

impl From<JsonWord> for StorageWord {
    fn from(value: JsonWord) -> Self {
        match value {
            JsonWord::Number(n) => n.into(),
            JsonWord::Signed(n) => n.into(),
            JsonWord::Text(s) => s.into(),
        }
    }
}

impl<'de> Deserialize<'de> for Storage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StorageVisitor;

        impl<'de> Visitor<'de> for StorageVisitor {
            type Value = Storage;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of storage keys to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Storage, A::Error> {
                let mut storage = Storage::new();
                while let Some((key, value)) = access.next_entry::<String, JsonWord>()? {
                    storage
                        .set(key, value)
                        .map_err(serde::de::Error::custom)?;
                }
                Ok(storage)
            }
        }

        deserializer.deserialize_map(StorageVisitor)
    }
}
