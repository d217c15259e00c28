//! Provisional identity claim bookkeeping.
//!
//! The registry pins each claimed provisional identity (by app-layer public
//! key) to the user that claimed it. A second claim by a different user is a
//! correctness violation, not a benign race; a replay of the same claim is a
//! no-op.

use std::collections::HashMap;

use keyseal_proto::{PublicEncryptionKey, UserId};

use crate::error::{Error, Result};

/// Opaque proof of ownership of a provisional identity's contact method.
///
/// Typically a verification code delivered by email. Issuance and delivery
/// are outside this core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationProof(pub String);

/// Collaborator that checks a [`VerificationProof`] against the contact
/// method a provisional identity is bound to.
pub trait ClaimVerifier {
    /// Whether `proof` demonstrates ownership of `email`.
    fn verify(&self, email: &str, proof: &VerificationProof) -> bool;
}

/// Tracks which provisional identities have been claimed, and by whom.
#[derive(Debug, Default)]
pub struct ClaimRegistry {
    claimed_by: HashMap<PublicEncryptionKey, UserId>,
}

impl ClaimRegistry {
    /// The user a provisional identity is attached to, if any.
    pub fn claimed_by(&self, app_key: &PublicEncryptionKey) -> Option<UserId> {
        self.claimed_by.get(app_key).copied()
    }

    /// Whether the identity has been claimed by anyone.
    pub fn is_claimed(&self, app_key: &PublicEncryptionKey) -> bool {
        self.claimed_by.contains_key(app_key)
    }

    /// Record a claim. Replays by the same user are accepted; a claim by a
    /// different user is rejected.
    pub fn record(&mut self, app_key: PublicEncryptionKey, user_id: UserId) -> Result<()> {
        match self.claimed_by.get(&app_key) {
            Some(existing) if *existing == user_id => Ok(()),
            Some(_) => Err(Error::AlreadyClaimed),
            None => {
                self.claimed_by.insert(app_key, user_id);
                Ok(())
            }
        }
    }
}
