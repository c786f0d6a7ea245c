//! # forkline-crypto
//!
//! Hashing and secp256k1 primitives needed to sign and verify typed transactions
//! and authorization tuples.
//!
//! - [`keccak`]: Keccak-256, one-shot and streaming.
//! - [`provider`]: the [`Crypto`](provider::Crypto) trait and its error type.
//! - [`native`]: [`NativeCrypto`](native::NativeCrypto), backed by libsecp256k1.
//!
//! ```rust
//! use forkline_crypto::keccak::keccak_hash;
//! use forkline_crypto::{Crypto, NativeCrypto};
//!
//! let digest = keccak_hash(b"hello");
//! let key = [0x11; 32];
//! let sig = NativeCrypto.sign_recoverable(&key, &digest).unwrap();
//! let signer = NativeCrypto.recover_signer(&sig.to_bytes(), &digest).unwrap();
//! assert_eq!(signer, NativeCrypto.address_from_secret_key(&key).unwrap());
//! ```

pub mod keccak;
pub mod native;
pub mod provider;

pub use native::NativeCrypto;
pub use provider::{Crypto, CryptoError, RecoverableSignature};
