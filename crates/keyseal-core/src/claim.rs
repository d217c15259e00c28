//! Claiming a provisional identity.
//!
//! The claimer proves ownership of the contact method, opens every pending
//! wrapped entry addressed to the identity (group epoch secrets and resource
//! keys), re-wraps each one under its own device key, and publishes the
//! result as a claim block. After the block is applied the provisional
//! entries are gone and the claimer reads the re-wrapped copies like any
//! other member.

use keyseal_crypto::ProvisionalIdentity;
use keyseal_proto::{
    Block, ClaimGroupEntry, ClaimResourceEntry, Payload, ProvisionalIdentityClaim,
    PublicEncryptionKey, WrappedKey,
};
use tracing::info;

use crate::claims::{ClaimVerifier, VerificationProof};
use crate::error::{Error, Result};
use crate::session::Session;
use crate::storage::Storage;

impl<S: Storage> Session<S> {
    /// Claim a provisional identity for the local user.
    ///
    /// `identity` carries both secret halves; `proof` must satisfy the
    /// `verifier` for the identity's contact method. Fails with
    /// [`Error::AlreadyClaimed`] if any user has already claimed it.
    pub fn claim_provisional_identity(
        &mut self,
        identity: &ProvisionalIdentity,
        proof: &VerificationProof,
        verifier: &dyn ClaimVerifier,
    ) -> Result<Block> {
        if !verifier.verify(&identity.email, proof) {
            return Err(Error::InvalidVerification);
        }

        let app_key = PublicEncryptionKey(identity.app_public_bytes());
        let outer_key = PublicEncryptionKey(identity.outer_public_bytes());
        if self.processor().claims().is_claimed(&app_key) {
            return Err(Error::AlreadyClaimed);
        }

        let device_key = self.device().encryption_key();
        let mut group_entries = Vec::new();
        for group in self.processor().groups().iter() {
            for epoch in group.epochs() {
                let Some(wrapped) = epoch.wrapped_for_provisional(&app_key) else {
                    continue;
                };
                let secret = identity.open(wrapped.as_bytes())?;
                group_entries.push(ClaimGroupEntry {
                    group_id: group.id(),
                    epoch_public_key: epoch.public_key,
                    wrapped_group_key: WrappedKey(keyseal_crypto::seal(
                        &secret,
                        device_key.as_bytes(),
                    )?),
                });
            }
        }

        let mut resource_entries = Vec::new();
        for pending in self.processor().shares().pending_for(&app_key) {
            let key = identity.open(pending.wrapped_key.as_bytes())?;
            resource_entries.push(ClaimResourceEntry {
                resource_id: pending.resource_id,
                wrapped_key: WrappedKey(keyseal_crypto::seal(&key, device_key.as_bytes())?),
            });
        }

        let payload = Payload::ProvisionalIdentityClaim(ProvisionalIdentityClaim {
            user_id: self.user_id(),
            app_encryption_key: app_key,
            outer_encryption_key: outer_key,
            device_encryption_key: device_key,
            group_entries,
            resource_entries,
        });
        let block = self.emit(payload)?;

        info!(user = %self.user_id(), "provisional identity claimed");
        Ok(block)
    }
}
