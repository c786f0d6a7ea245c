use forkline_rlp::error::RLPDecodeError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrieError {
    #[error("Invalid trie input: {0}")]
    InvalidInput(&'static str),
    #[error(transparent)]
    RLPDecode(#[from] RLPDecodeError),
}
