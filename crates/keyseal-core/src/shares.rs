//! Resource share store.
//!
//! Records every wrapped resource-key entry seen in key-publish blocks:
//! direct entries keyed by device encryption key, group entries keyed by the
//! epoch public key current at share time, and a pending queue for entries
//! addressed to provisional identities. The pending queue is drained exactly
//! once, when the identity is claimed.
//!
//! Wrapping is append-only; nothing here revokes access.

use std::collections::HashMap;

use keyseal_proto::{
    KeyPublishToGroup, KeyPublishToProvisionalUser, KeyPublishToUser, ProvisionalIdentityClaim,
    PublicEncryptionKey, ResourceId, WrappedKey,
};

/// A resource key wrapped under a provisional identity, awaiting a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingShare {
    /// The resource the share is for.
    pub resource_id: ResourceId,
    /// The resource key, double-sealed for the provisional identity.
    pub wrapped_key: WrappedKey,
}

/// Wrapped resource-key entries, replayed from key-publish blocks.
#[derive(Debug, Default)]
pub struct ResourceShareStore {
    /// resource id -> (target device key, wrapped resource key)
    direct: HashMap<ResourceId, Vec<(PublicEncryptionKey, WrappedKey)>>,
    /// resource id -> (group epoch key, wrapped resource key)
    group: HashMap<ResourceId, Vec<(PublicEncryptionKey, WrappedKey)>>,
    /// provisional app key -> pending shares
    pending: HashMap<PublicEncryptionKey, Vec<PendingShare>>,
}

impl ResourceShareStore {
    /// Apply a user-targeted key publish.
    pub fn apply_user_publish(&mut self, publish: &KeyPublishToUser) {
        let entries = self.direct.entry(publish.resource_id).or_default();
        for entry in &publish.entries {
            let record = (entry.device_encryption_key, entry.wrapped_key.clone());
            // Replay safety: skip entries already recorded.
            if !entries.contains(&record) {
                entries.push(record);
            }
        }
    }

    /// Apply a group-targeted key publish.
    pub fn apply_group_publish(&mut self, publish: &KeyPublishToGroup) {
        let entries = self.group.entry(publish.resource_id).or_default();
        for entry in &publish.entries {
            let record = (entry.group_public_key, entry.wrapped_key.clone());
            if !entries.contains(&record) {
                entries.push(record);
            }
        }
    }

    /// Apply a provisional-targeted key publish, queueing pending shares.
    pub fn apply_provisional_publish(&mut self, publish: &KeyPublishToProvisionalUser) {
        for entry in &publish.entries {
            let queue = self.pending.entry(entry.app_encryption_key).or_default();
            let share = PendingShare {
                resource_id: publish.resource_id,
                wrapped_key: entry.wrapped_key.clone(),
            };
            if !queue.contains(&share) {
                queue.push(share);
            }
        }
    }

    /// Apply the share side of a claim: attach the re-wrapped entries to the
    /// claimer's device and drop the pending queue for that identity.
    pub fn apply_claim(&mut self, claim: &ProvisionalIdentityClaim) {
        for entry in &claim.resource_entries {
            let entries = self.direct.entry(entry.resource_id).or_default();
            let record = (claim.device_encryption_key, entry.wrapped_key.clone());
            if !entries.contains(&record) {
                entries.push(record);
            }
        }
        self.pending.remove(&claim.app_encryption_key);
    }

    /// Direct entries for a resource.
    pub fn direct_entries(&self, resource_id: &ResourceId) -> &[(PublicEncryptionKey, WrappedKey)] {
        self.direct.get(resource_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Group entries for a resource.
    pub fn group_entries(&self, resource_id: &ResourceId) -> &[(PublicEncryptionKey, WrappedKey)] {
        self.group.get(resource_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Pending shares addressed to a provisional identity's app key.
    pub fn pending_for(&self, app_key: &PublicEncryptionKey) -> &[PendingShare] {
        self.pending.get(app_key).map(Vec::as_slice).unwrap_or_default()
    }
}
