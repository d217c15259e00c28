//! Crypto error types.

use thiserror::Error;

/// Errors from cryptographic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Key bytes have the wrong length or are otherwise malformed.
    #[error("invalid key material")]
    InvalidKey,

    /// A signature did not verify against the given public key.
    #[error("signature verification failed")]
    InvalidSignature,

    /// A sealed box is too short to contain an ephemeral key and a tag.
    #[error("sealed data is truncated")]
    TruncatedSeal,

    /// AEAD encryption failed.
    #[error("encryption failed")]
    EncryptionFailed,

    /// AEAD authentication failed: wrong key or tampered ciphertext.
    #[error("decryption failed: authentication check failed")]
    DecryptionFailed,

    /// Recovered plaintext does not have the expected key length.
    #[error("unwrapped key has unexpected length")]
    InvalidUnwrappedLength,
}
