//! Two-layer provisional identity scheme.
//!
//! A provisional identity is an email-bound pair of X25519 keypairs. The
//! app layer belongs to the application embedding the SDK, the outer layer
//! to the key-distribution service, so neither party alone can open a
//! pending share. Wrapping seals under the app public key first, then seals
//! the result under the outer public key; claiming opens in reverse order.

use crate::error::CryptoError;
use crate::keys::EncryptionKeyPair;
use crate::seal;

/// A provisional identity with both secret halves.
///
/// Held by the future claimer (decoded from its identity string); only the
/// public halves ever appear in protocol payloads.
#[derive(Debug, Clone)]
pub struct ProvisionalIdentity {
    /// The contact method the identity is bound to.
    pub email: String,
    app: EncryptionKeyPair,
    outer: EncryptionKeyPair,
}

impl ProvisionalIdentity {
    /// Generate a fresh identity bound to `email`.
    pub fn generate(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            app: EncryptionKeyPair::generate(),
            outer: EncryptionKeyPair::generate(),
        }
    }

    /// App-layer public key bytes.
    pub fn app_public_bytes(&self) -> [u8; 32] {
        self.app.public_bytes()
    }

    /// Outer-layer public key bytes.
    pub fn outer_public_bytes(&self) -> [u8; 32] {
        self.outer.public_bytes()
    }

    /// Open a two-layer sealed box addressed to this identity.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let inner = seal::open(sealed, &self.outer.secret_bytes())?;
        seal::open(&inner, &self.app.secret_bytes())
    }
}

/// Seal `plaintext` for a provisional identity's public halves.
pub fn seal_to_provisional(
    plaintext: &[u8],
    app_public: &[u8; 32],
    outer_public: &[u8; 32],
) -> Result<Vec<u8>, CryptoError> {
    let inner = seal::seal(plaintext, app_public)?;
    seal::seal(&inner, outer_public)
}

/// Open a two-layer sealed box given both secret halves.
pub fn open_from_provisional(
    sealed: &[u8],
    app_secret: &[u8; 32],
    outer_secret: &[u8; 32],
) -> Result<Vec<u8>, CryptoError> {
    let inner = seal::open(sealed, outer_secret)?;
    seal::open(&inner, app_secret)
}
