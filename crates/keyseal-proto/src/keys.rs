//! Key material newtypes carried on the wire.
//!
//! These are raw byte containers. All cryptographic interpretation lives in
//! the crypto crate; the protocol layer only moves the bytes around.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ed25519 public key used to verify block authorship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PublicSignatureKey(pub [u8; 32]);

impl PublicSignatureKey {
    /// View the key as raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for PublicSignatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// X25519 public key used as a wrapping target.
///
/// Device encryption keys, group epoch keys and provisional identity keys
/// are all of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PublicEncryptionKey(pub [u8; 32]);

impl PublicEncryptionKey {
    /// View the key as raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for PublicEncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Ed25519 signature over a block payload's CBOR encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    /// View the signature as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A secret key sealed under some recipient's public key.
///
/// Opaque ciphertext; only the holder of the matching secret key can
/// recover the content. Never aliased, never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedKey(pub Vec<u8>);

impl WrappedKey {
    /// View the wrapped key as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Public half of a provisional identity.
///
/// A provisional identity is an email-bound pair of X25519 keypairs usable
/// as a sharing target before its owner has registered a device. Wrapping to
/// a provisional target seals under the app key, then seals the result under
/// the outer key, so claiming requires both secret halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicProvisionalIdentity {
    /// App-layer encryption key (inner seal).
    pub app_encryption_key: PublicEncryptionKey,
    /// Outer-layer encryption key (outer seal).
    pub outer_encryption_key: PublicEncryptionKey,
}
