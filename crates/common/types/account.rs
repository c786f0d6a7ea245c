use std::fmt;

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use forkline_crypto::keccak::keccak_hash;
use forkline_rlp::encode::RLPEncode;
use forkline_trie::Trie;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::storage::Storage;

/// Account field named by an [`AllocMismatchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountField {
    Nonce,
    Balance,
    Code,
    Storage,
}

impl fmt::Display for AccountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccountField::Nonce => "nonce",
            AccountField::Balance => "balance",
            AccountField::Code => "code",
            AccountField::Storage => "storage",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AllocMismatchError {
    #[error("unexpected {field} for account {address:#x}: want {expected}, got {got}")]
    Field {
        address: Address,
        field: AccountField,
        expected: String,
        got: String,
    },
    #[error(
        "incorrect value in storage key {key:#x} of account {address:#x}: want {expected:#x}, got {got:#x}"
    )]
    StorageValue {
        address: Address,
        key: U256,
        expected: U256,
        got: U256,
    },
}

impl AllocMismatchError {
    pub fn address(&self) -> Address {
        match self {
            AllocMismatchError::Field { address, .. }
            | AllocMismatchError::StorageValue { address, .. } => *address,
        }
    }

    pub fn field(&self) -> AccountField {
        match self {
            AllocMismatchError::Field { field, .. } => *field,
            AllocMismatchError::StorageValue { .. } => AccountField::Storage,
        }
    }
}

/// Account state where every field is optional.
///
/// The same type describes genesis accounts and expectations over a
/// post-state, where an absent field means "anything goes".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::serde_utils::u64::padded_hex_str_opt"
    )]
    pub nonce: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::serde_utils::u256::padded_hex_str_opt"
    )]
    pub balance: Option<U256>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::serde_utils::bytes::opt"
    )]
    pub code: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
}

impl Account {
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_balance(mut self, balance: impl Into<U256>) -> Self {
        self.balance = Some(balance.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<Bytes>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// True when every present field holds its zero value.
    pub fn is_empty(&self) -> bool {
        self.nonce.is_none_or(|n| n == 0)
            && self.balance.is_none_or(|b| b.is_zero())
            && self.code.as_ref().is_none_or(Bytes::is_empty)
            && self.storage.as_ref().is_none_or(Storage::is_all_zero)
    }

    /// Overlays `other` on top of `self`. Present fields of `other` win and
    /// storage is merged key by key.
    pub fn merge(&mut self, other: &Account) {
        if other.nonce.is_some() {
            self.nonce = other.nonce;
        }
        if other.balance.is_some() {
            self.balance = other.balance;
        }
        if other.code.is_some() {
            self.code.clone_from(&other.code);
        }
        if let Some(other_storage) = &other.storage {
            match &mut self.storage {
                Some(storage) => storage.merge(other_storage),
                None => self.storage = Some(other_storage.clone()),
            }
        }
    }

    /// Checks `observed` against the fields this account sets.
    ///
    /// Missing observed fields count as their zero value. Storage is compared
    /// after dropping zero-valued slots from both sides.
    pub fn check_alloc(&self, address: Address, observed: &Account) -> Result<(), AllocMismatchError> {
        let field_mismatch = |field, expected: String, got: String| AllocMismatchError::Field {
            address,
            field,
            expected,
            got,
        };

        if let Some(expected) = self.nonce {
            let got = observed.nonce.unwrap_or_default();
            if expected != got {
                return Err(field_mismatch(
                    AccountField::Nonce,
                    expected.to_string(),
                    got.to_string(),
                ));
            }
        }
        if let Some(expected) = self.balance {
            let got = observed.balance.unwrap_or_default();
            if expected != got {
                return Err(field_mismatch(
                    AccountField::Balance,
                    expected.to_string(),
                    got.to_string(),
                ));
            }
        }
        if let Some(expected) = &self.code {
            let got = observed.code.clone().unwrap_or_default();
            if *expected != got {
                return Err(field_mismatch(
                    AccountField::Code,
                    format!("0x{}", hex::encode(expected)),
                    format!("0x{}", hex::encode(&got)),
                ));
            }
        }
        if let Some(expected) = &self.storage {
            let expected = expected.non_zero();
            let got = observed
                .storage
                .as_ref()
                .map(Storage::non_zero)
                .unwrap_or_default();
            for (key, value) in &expected {
                let observed_value = got.get(key).copied().unwrap_or_default();
                if observed_value != *value {
                    return Err(AllocMismatchError::StorageValue {
                        address,
                        key: *key,
                        expected: *value,
                        got: observed_value,
                    });
                }
            }
            if let Some((key, value)) = got.iter().find(|(key, _)| !expected.contains_key(key)) {
                return Err(AllocMismatchError::StorageValue {
                    address,
                    key: *key,
                    expected: U256::zero(),
                    got: *value,
                });
            }
        }
        Ok(())
    }

    pub fn code_hash(&self) -> H256 {
        H256(keccak_hash(self.code.as_deref().unwrap_or_default()))
    }

    /// Root of the storage trie. Zero-valued slots are not part of the trie.
    pub fn storage_root(&self) -> H256 {
        let entries = self
            .storage
            .as_ref()
            .map(Storage::non_zero)
            .unwrap_or_default();
        Trie::compute_hash_from_unsorted_iter(entries.into_iter().map(|(key, value)| {
            (
                keccak_hash(key.to_big_endian()).to_vec(),
                value.encode_to_vec(),
            )
        }))
    }
}
