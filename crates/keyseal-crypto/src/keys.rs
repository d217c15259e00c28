//! Keypair and symmetric key generation.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey as X25519Public, StaticSecret};

/// An X25519 keypair used as a wrapping target (device, group epoch or
/// provisional identity encryption key).
#[derive(Clone)]
pub struct EncryptionKeyPair {
    secret: StaticSecret,
    public: X25519Public,
}

impl EncryptionKeyPair {
    /// Generate a keypair from the system CSPRNG.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = X25519Public::from(&secret);
        Self { secret, public }
    }

    /// Reconstruct a keypair from secret bytes (deterministic).
    pub fn from_secret_bytes(secret: [u8; 32]) -> Self {
        let secret = StaticSecret::from(secret);
        let public = X25519Public::from(&secret);
        Self { secret, public }
    }

    /// Public key bytes.
    pub fn public_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    /// Secret key bytes.
    ///
    /// Only used to wrap the secret for a recipient or to open a sealed box;
    /// never serialized into protocol payloads.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }
}

impl std::fmt::Debug for EncryptionKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secret half is intentionally not printed.
        f.debug_struct("EncryptionKeyPair")
            .field("public", &hex_preview(self.public.as_bytes()))
            .finish_non_exhaustive()
    }
}

/// A 32-byte symmetric resource key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SymmetricKey(pub [u8; 32]);

impl SymmetricKey {
    /// Generate a fresh key from the system CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// View the key as raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// Truncated SHA-256 fingerprint of a public key.
///
/// Used to derive stable 16-byte identifiers (group ids) from key material.
pub fn key_fingerprint(public_key: &[u8; 32]) -> [u8; 16] {
    let digest = Sha256::digest(public_key);
    let mut out = [0u8; 16];
    out.copy_from_slice(&digest[..16]);
    out
}

fn hex_preview(bytes: &[u8; 32]) -> String {
    bytes[..4].iter().map(|b| format!("{b:02x}")).collect()
}
