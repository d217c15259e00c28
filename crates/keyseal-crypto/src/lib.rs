//! Cryptographic primitives orchestration for keyseal.
//!
//! The trustchain core never touches primitives directly; everything it
//! needs is expressed here as four small surfaces:
//!
//! - [`sign`]: Ed25519 block authorship (sign/verify)
//! - [`seal`]: X25519 sealed boxes for key wrapping
//! - [`keys`]: keypair and symmetric key generation
//! - [`provisional`]: the two-layer provisional identity scheme
//!
//! # Security
//!
//! Sealed boxes use a fresh ephemeral X25519 keypair per seal, HKDF-SHA256
//! for symmetric key derivation and ChaCha20-Poly1305 for authenticated
//! encryption. The AEAD tag makes tampering and wrong-key opens fail loudly.
//! Secrets recovered from a sealed box are returned by value and never
//! cached here.

pub mod error;
pub mod keys;
pub mod provisional;
pub mod seal;
pub mod sign;

pub use error::CryptoError;
pub use keys::{key_fingerprint, EncryptionKeyPair, SymmetricKey};
pub use provisional::{open_from_provisional, seal_to_provisional, ProvisionalIdentity};
pub use seal::{open, open_key, seal, SEAL_OVERHEAD};
pub use sign::{verify_signature, SigningKeyPair, SIGNATURE_LEN};
