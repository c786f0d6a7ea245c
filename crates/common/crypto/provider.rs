use ethereum_types::Address;

/// Errors from crypto operations. Does not leak library-specific types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid secret key")]
    InvalidSecretKey,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid recovery id")]
    InvalidRecoveryId,
    #[error("recovery failed")]
    RecoveryFailed,
}

/// A recoverable secp256k1 signature split into its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Recovery id, 0 or 1.
    pub recovery_id: u8,
}

impl RecoverableSignature {
    /// `r || s || recovery_id`, the layout [`Crypto::recover_signer`] takes.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.recovery_id;
        out
    }
}

/// Signing and recovery operations used when building and checking transactions.
///
/// Methods take `&self` so callers can hold a `&dyn Crypto`.
pub trait Crypto: Send + Sync + core::fmt::Debug {
    /// Deterministic (RFC 6979) recoverable signature over a 32-byte digest.
    fn sign_recoverable(
        &self,
        secret_key: &[u8; 32],
        msg: &[u8; 32],
    ) -> Result<RecoverableSignature, CryptoError>;

    /// Recovers the signer from a 65-byte `r || s || recovery_id` signature.
    /// High-s signatures are rejected.
    fn recover_signer(&self, sig: &[u8; 65], msg: &[u8; 32]) -> Result<Address, CryptoError>;

    /// Address controlled by the given secret key.
    fn address_from_secret_key(&self, secret_key: &[u8; 32]) -> Result<Address, CryptoError>;

    fn keccak256(&self, input: &[u8]) -> [u8; 32] {
        crate::keccak::keccak_hash(input)
    }
}
