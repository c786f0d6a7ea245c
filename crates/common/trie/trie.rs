//! In-memory Merkle Patricia Trie.
//!
//! Only what is needed to compute canonical roots is supported: building a trie
//! from key/value pairs, point lookups and hashing. Nodes are kept in memory and
//! hashed on demand.
mod error;
mod nibbles;
mod node;

use ethereum_types::H256;
use forkline_crypto::keccak::keccak_hash;
use forkline_rlp::{constants::RLP_NULL, decode::RLPDecode, encode::RLPEncode};
use lazy_static::lazy_static;

pub use self::error::TrieError;
pub use self::nibbles::Nibbles;
pub use self::node::{BranchNode, ExtensionNode, LeafNode, Node, NodeHash};

lazy_static! {
    // Hash value for an empty trie, equal to keccak(RLP_NULL)
    pub static ref EMPTY_TRIE_HASH: H256 = H256(keccak_hash([RLP_NULL]));
}

/// RLP-encoded trie path
pub type PathRLP = Vec<u8>;
/// RLP-encoded trie value
pub type ValueRLP = Vec<u8>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trie {
    root: Option<Node>,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value. Empty values are rejected, since an empty value is how
    /// the trie encodes absence.
    pub fn insert(&mut self, path: PathRLP, value: ValueRLP) -> Result<(), TrieError> {
        if value.is_empty() {
            return Err(TrieError::InvalidInput("empty value"));
        }
        let path = Nibbles::from_bytes(&path);
        self.root = Some(match self.root.take() {
            Some(root) => root.insert(path, value),
            None => Node::leaf(path, value),
        });
        Ok(())
    }

    pub fn get(&self, path: &[u8]) -> Option<&ValueRLP> {
        self.root.as_ref()?.get(Nibbles::from_bytes(path))
    }

    /// Looks up a value and decodes it from its RLP encoding.
    pub fn get_decoded<T: RLPDecode>(&self, path: &[u8]) -> Result<Option<T>, TrieError> {
        self.get(path)
            .map(|encoded| T::decode(encoded))
            .transpose()
            .map_err(TrieError::from)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Root hash. The root is always hashed, even when its encoding is short.
    pub fn hash(&self) -> H256 {
        match &self.root {
            Some(root) => H256(keccak_hash(root.encode_raw())),
            None => *EMPTY_TRIE_HASH,
        }
    }

    /// Root of the trie holding every `(path, value)` pair, in any order.
    /// Pairs with an empty value are skipped.
    pub fn compute_hash_from_unsorted_iter(
        iter: impl IntoIterator<Item = (PathRLP, ValueRLP)>,
    ) -> H256 {
        let mut trie = Trie::new();
        for (path, value) in iter {
            if value.is_empty() {
                tracing::trace!("skipping empty trie value");
                continue;
            }
            // Non-empty values cannot fail to insert.
            let _ = trie.insert(path, value);
        }
        trie.hash()
    }

    /// Root of an ordered list: item `i` is stored under the canonical encoding of `i`.
    pub fn compute_hash_from_ordered_list(items: impl IntoIterator<Item = ValueRLP>) -> H256 {
        Self::compute_hash_from_unsorted_iter(
            items
                .into_iter()
                .enumerate()
                .map(|(index, value)| (index.encode_to_vec(), value)),
        )
    }
}
