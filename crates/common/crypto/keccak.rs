use sha3::{Digest, Keccak256 as Sha3Keccak256};

/// One-shot Keccak-256.
pub fn keccak_hash(data: impl AsRef<[u8]>) -> [u8; 32] {
    Sha3Keccak256::digest(data.as_ref()).into()
}

/// Streaming Keccak-256 hasher.
#[derive(Clone, Default)]
pub struct Keccak256(Sha3Keccak256);

impl Keccak256 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(mut self, data: impl AsRef<[u8]>) -> Self {
        self.0.update(data.as_ref());
        self
    }

    pub fn finalize(self) -> [u8; 32] {
        self.0.finalize().into()
    }
}

impl core::fmt::Debug for Keccak256 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Keccak256")
    }
}
