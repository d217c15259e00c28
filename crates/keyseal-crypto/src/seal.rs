//! X25519 sealed boxes for key wrapping.
//!
//! Wrapping a secret for a recipient works with nothing but the recipient's
//! public key: a fresh ephemeral X25519 keypair is generated per seal, the
//! DH shared secret is expanded with HKDF-SHA256, and the payload is
//! encrypted with ChaCha20-Poly1305. The nonce is derived from the ephemeral
//! public key, which is unique per seal because the ephemeral key is fresh.
//!
//! Output layout: `ephemeral_public(32) || ciphertext(len + 16)`.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use sha2::Sha256;
use x25519_dalek::{PublicKey as X25519Public, StaticSecret};

use crate::error::CryptoError;

/// Domain separation for the HKDF expansion.
const SEAL_INFO: &[u8] = b"keyseal-sealed-box-v1";

/// Bytes added to the plaintext by one seal layer.
pub const SEAL_OVERHEAD: usize = 32 + 16;

/// Seal `plaintext` so only the holder of the secret half of
/// `recipient_public` can recover it.
pub fn seal(plaintext: &[u8], recipient_public: &[u8; 32]) -> Result<Vec<u8>, CryptoError> {
    let ephemeral = StaticSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519Public::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(&X25519Public::from(*recipient_public));

    let cipher = cipher_for(shared.as_bytes())?;
    let nonce = nonce_from(ephemeral_public.as_bytes());

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut sealed = Vec::with_capacity(32 + ciphertext.len());
    sealed.extend_from_slice(ephemeral_public.as_bytes());
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Open a sealed box with the recipient's secret key.
pub fn open(sealed: &[u8], recipient_secret: &[u8; 32]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < SEAL_OVERHEAD {
        return Err(CryptoError::TruncatedSeal);
    }

    let mut ephemeral_public = [0u8; 32];
    ephemeral_public.copy_from_slice(&sealed[..32]);

    let secret = StaticSecret::from(*recipient_secret);
    let shared = secret.diffie_hellman(&X25519Public::from(ephemeral_public));

    let cipher = cipher_for(shared.as_bytes())?;
    let nonce = nonce_from(&ephemeral_public);

    cipher
        .decrypt(&nonce, &sealed[32..])
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Open a sealed box expected to contain exactly a 32-byte key.
pub fn open_key(sealed: &[u8], recipient_secret: &[u8; 32]) -> Result<[u8; 32], CryptoError> {
    let plaintext = open(sealed, recipient_secret)?;
    if plaintext.len() != 32 {
        return Err(CryptoError::InvalidUnwrappedLength);
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&plaintext);
    Ok(key)
}

fn cipher_for(shared_secret: &[u8; 32]) -> Result<ChaCha20Poly1305, CryptoError> {
    let hkdf = Hkdf::<Sha256>::new(None, shared_secret);
    let mut sym_key = [0u8; 32];
    hkdf.expand(SEAL_INFO, &mut sym_key)
        .map_err(|_| CryptoError::InvalidKey)?;
    ChaCha20Poly1305::new_from_slice(&sym_key).map_err(|_| CryptoError::InvalidKey)
}

fn nonce_from(ephemeral_public: &[u8; 32]) -> Nonce {
    let mut nonce_bytes = [0u8; 12];
    nonce_bytes.copy_from_slice(&ephemeral_public[..12]);
    Nonce::from(nonce_bytes)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::keys::EncryptionKeyPair;

    #[test]
    fn seal_open_roundtrip() {
        let recipient = EncryptionKeyPair::generate();
        let secret = [42u8; 32];

        let sealed = seal(&secret, &recipient.public_bytes()).unwrap();
        assert_eq!(sealed.len(), 32 + SEAL_OVERHEAD);
        assert_ne!(&sealed[32..64], secret.as_slice());

        let opened = open_key(&sealed, &recipient.secret_bytes()).unwrap();
        assert_eq!(opened, secret);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let recipient = EncryptionKeyPair::generate();
        let other = EncryptionKeyPair::generate();

        let sealed = seal(&[42u8; 32], &recipient.public_bytes()).unwrap();
        let result = open(&sealed, &other.secret_bytes());

        assert_eq!(result, Err(CryptoError::DecryptionFailed));
    }

    #[test]
    fn tampered_ciphertext_fails_authentication() {
        let recipient = EncryptionKeyPair::generate();

        let mut sealed = seal(&[42u8; 32], &recipient.public_bytes()).unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xff;

        assert_eq!(
            open(&sealed, &recipient.secret_bytes()),
            Err(CryptoError::DecryptionFailed)
        );
    }

    #[test]
    fn truncated_input_is_rejected() {
        let recipient = EncryptionKeyPair::generate();
        assert_eq!(
            open(&[0u8; 47], &recipient.secret_bytes()),
            Err(CryptoError::TruncatedSeal)
        );
    }

    #[test]
    fn open_key_rejects_wrong_length_plaintext() {
        let recipient = EncryptionKeyPair::generate();
        let sealed = seal(b"short", &recipient.public_bytes()).unwrap();
        assert_eq!(
            open_key(&sealed, &recipient.secret_bytes()),
            Err(CryptoError::InvalidUnwrappedLength)
        );
    }

    proptest! {
        #[test]
        fn roundtrip_preserves_arbitrary_payloads(
            payload in proptest::collection::vec(any::<u8>(), 0..256),
            secret in any::<[u8; 32]>(),
        ) {
            let recipient = EncryptionKeyPair::from_secret_bytes(secret);
            let sealed = seal(&payload, &recipient.public_bytes()).unwrap();
            let opened = open(&sealed, &recipient.secret_bytes()).unwrap();
            prop_assert_eq!(payload, opened);
        }
    }
}
