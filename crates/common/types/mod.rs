mod account;
mod alloc;
mod storage;
mod transaction;
mod tx_fields;
mod withdrawal;

pub use account::{Account, AccountField, AllocMismatchError};
pub use alloc::Alloc;
pub use storage::{Storage, StorageError, StorageWord};
pub use transaction::{Transaction, TransactionBuilder, TransactionError, TxKind, TxType};
pub use tx_fields::{AccessList, AccessListItem, AuthorizationList, AuthorizationTuple};
pub use withdrawal::Withdrawal;
