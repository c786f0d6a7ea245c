use std::collections::BTreeMap;
use std::collections::btree_map;

use ethereum_types::{Address, H256, U256};
use forkline_crypto::keccak::keccak_hash;
use forkline_rlp::structs::Encoder;
use forkline_trie::Trie;
use serde::{Deserialize, Serialize};

use super::account::{Account, AllocMismatchError};

/// Pre-state (or expected post-state) keyed by address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alloc(BTreeMap<Address, Account>);

impl Alloc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: Address, account: Account) -> Option<Account> {
        self.0.insert(address, account)
    }

    pub fn get(&self, address: &Address) -> Option<&Account> {
        self.0.get(address)
    }

    pub fn remove(&mut self, address: &Address) -> Option<Account> {
        self.0.remove(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.0.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Address, Account> {
        self.0.iter()
    }

    /// Merges `other` into `self` account by account, see [`Account::merge`].
    pub fn merge(&mut self, other: &Alloc) {
        for (address, account) in &other.0 {
            self.0
                .entry(*address)
                .and_modify(|existing| existing.merge(account))
                .or_insert_with(|| account.clone());
        }
    }

    /// Non-consuming variant of [`merge`](Self::merge).
    pub fn merged(&self, other: &Alloc) -> Alloc {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    /// Checks every account listed here against `observed`.
    /// Accounts missing from `observed` are checked against an empty account.
    pub fn check(&self, observed: &Alloc) -> Result<(), AllocMismatchError> {
        let missing = Account::default();
        for (address, expected) in &self.0 {
            expected.check_alloc(*address, observed.get(address).unwrap_or(&missing))?;
        }
        Ok(())
    }

    /// Root of the state trie built from these accounts. Absent fields are zero.
    pub fn state_root(&self) -> H256 {
        Trie::compute_hash_from_unsorted_iter(self.0.iter().map(|(address, account)| {
            let mut encoded = Vec::new();
            Encoder::new(&mut encoded)
                .encode_field(&account.nonce.unwrap_or_default())
                .encode_field(&account.balance.unwrap_or(U256::zero()))
                .encode_field(&account.storage_root())
                .encode_field(&account.code_hash())
                .finish();
            (keccak_hash(address).to_vec(), encoded)
        }))
    }
}

impl FromIterator<(Address, Account)> for Alloc {
    fn from_iter<I: IntoIterator<Item = (Address, Account)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Alloc {
    type Item = (Address, Account);
    type IntoIter = btree_map::IntoIter<Address, Account>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Alloc {
    type Item = (&'a Address, &'a Account);
    type IntoIter = btree_map::Iter<'a, Address, Account>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
