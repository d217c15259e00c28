//! Resource key sharing: wrapping for targets and unwrapping for the caller.
//!
//! Sharing wraps a resource's symmetric key under each target's public key
//! and emits one key-publish block per target class. Sharing to a group only
//! needs the group's current public half; the sharer does not have to be a
//! member. Unwrapping tries the caller's own device entries first, then
//! every group epoch the caller's device can open.

use keyseal_crypto::{EncryptionKeyPair, SymmetricKey};
use keyseal_proto::{
    Block, GroupId, GroupShareEntry, KeyPublishToGroup, KeyPublishToProvisionalUser,
    KeyPublishToUser, Payload, ProvisionalShareEntry, PublicEncryptionKey,
    PublicProvisionalIdentity, ResourceId, UserId, UserShareEntry, WrappedKey,
};
use tracing::debug;

use crate::error::{Error, RecipientId, Result};
use crate::session::Session;
use crate::storage::Storage;

/// The recipients of one share operation.
#[derive(Debug, Clone, Default)]
pub struct ShareTargets {
    /// Registered users, wrapped per device.
    pub users: Vec<UserId>,
    /// Groups, wrapped under their current epoch key.
    pub groups: Vec<GroupId>,
    /// Provisional identities, queued until claimed.
    pub provisional_users: Vec<PublicProvisionalIdentity>,
}

impl ShareTargets {
    fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty() && self.provisional_users.is_empty()
    }
}

impl<S: Storage> Session<S> {
    /// Wrap `resource_key` for every target and emit the key-publish blocks.
    ///
    /// All targets are resolved before any block is emitted; an unresolvable
    /// subset fails the whole operation with exactly that subset reported.
    pub fn share_resource_key(
        &mut self,
        resource_id: ResourceId,
        resource_key: &SymmetricKey,
        targets: &ShareTargets,
    ) -> Result<Vec<Block>> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        self.reject_claimed(&targets.provisional_users)?;

        let user_devices = self.resolve_members(&targets.users)?;
        let group_keys = self.resolve_groups(&targets.groups)?;

        let mut payloads = Vec::new();
        if !user_devices.is_empty() {
            let mut entries = Vec::new();
            for (user_id, devices) in &user_devices {
                for device in devices {
                    entries.push(UserShareEntry {
                        user_id: *user_id,
                        device_encryption_key: device.encryption_key,
                        wrapped_key: WrappedKey(keyseal_crypto::seal(
                            resource_key.as_bytes(),
                            device.encryption_key.as_bytes(),
                        )?),
                    });
                }
            }
            payloads.push(Payload::KeyPublishToUser(KeyPublishToUser { resource_id, entries }));
        }
        if !group_keys.is_empty() {
            let entries = group_keys
                .iter()
                .map(|(group_id, public_key)| {
                    Ok(GroupShareEntry {
                        group_id: *group_id,
                        group_public_key: *public_key,
                        wrapped_key: WrappedKey(keyseal_crypto::seal(
                            resource_key.as_bytes(),
                            public_key.as_bytes(),
                        )?),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            payloads.push(Payload::KeyPublishToGroup(KeyPublishToGroup { resource_id, entries }));
        }
        if !targets.provisional_users.is_empty() {
            let entries = targets
                .provisional_users
                .iter()
                .map(|identity| {
                    Ok(ProvisionalShareEntry {
                        app_encryption_key: identity.app_encryption_key,
                        outer_encryption_key: identity.outer_encryption_key,
                        wrapped_key: WrappedKey(keyseal_crypto::seal_to_provisional(
                            resource_key.as_bytes(),
                            identity.app_encryption_key.as_bytes(),
                            identity.outer_encryption_key.as_bytes(),
                        )?),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            payloads.push(Payload::KeyPublishToProvisionalUser(KeyPublishToProvisionalUser {
                resource_id,
                entries,
            }));
        }

        let mut blocks = Vec::with_capacity(payloads.len());
        for payload in payloads {
            blocks.push(self.emit(payload)?);
        }
        debug!(resource = %resource_id, blocks = blocks.len(), "resource key shared");
        Ok(blocks)
    }

    /// Recover a resource key shared with the local device or with a group
    /// the local device can read.
    ///
    /// `ResourceNotFound` is the expected state for a share made under a
    /// group epoch from before the caller joined; it resolves once the
    /// resource is re-shared under the current epoch.
    pub fn unwrap_resource_key(&self, resource_id: ResourceId) -> Result<SymmetricKey> {
        let device_key = self.device().encryption_key();
        let device_secret = self.device().encryption.secret_bytes();

        for (target, wrapped) in self.processor().shares().direct_entries(&resource_id) {
            if *target == device_key {
                let key = keyseal_crypto::open_key(wrapped.as_bytes(), &device_secret)?;
                return Ok(SymmetricKey(key));
            }
        }

        for (epoch_key, wrapped) in self.processor().shares().group_entries(&resource_id) {
            if let Some(epoch_secret) = self.group_epoch_secret(epoch_key)? {
                let key = keyseal_crypto::open_key(wrapped.as_bytes(), &epoch_secret)?;
                return Ok(SymmetricKey(key));
            }
        }

        Err(Error::ResourceNotFound(resource_id))
    }

    /// Unwrap every epoch keypair of a group reachable from the local
    /// device, oldest first.
    ///
    /// Fails with [`Error::NotAGroupMember`] when no epoch is wrapped for
    /// this device, which also covers groups this session has never seen.
    pub fn group_private_keys(&self, group_id: GroupId) -> Result<Vec<EncryptionKeyPair>> {
        let group = self
            .processor()
            .groups()
            .group(&group_id)
            .ok_or(Error::NotAGroupMember(group_id))?;

        let device_key = self.device().encryption_key();
        let device_secret = self.device().encryption.secret_bytes();
        let mut keys = Vec::new();
        for epoch in group.epochs() {
            if let Some(wrapped) = epoch.wrapped_for_device(&device_key) {
                let secret = keyseal_crypto::open_key(wrapped.as_bytes(), &device_secret)?;
                keys.push(EncryptionKeyPair::from_secret_bytes(secret));
            }
        }
        if keys.is_empty() {
            return Err(Error::NotAGroupMember(group_id));
        }
        Ok(keys)
    }

    /// Resolve group ids to their current epoch public keys, reporting
    /// exactly the unresolvable subset.
    fn resolve_groups(
        &self,
        group_ids: &[GroupId],
    ) -> Result<Vec<(GroupId, PublicEncryptionKey)>> {
        let mut resolved = Vec::with_capacity(group_ids.len());
        let mut missing = Vec::new();
        for group_id in group_ids {
            match self.processor().groups().group(group_id) {
                Some(group) => resolved.push((*group_id, group.current_public_key())),
                None => missing.push(RecipientId::Group(*group_id)),
            }
        }
        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(Error::RecipientsNotFound { recipient_ids: missing })
        }
    }

    /// Unwrap a group epoch secret if the local device holds an entry for
    /// that epoch. `Ok(None)` when the epoch is unknown or not wrapped for
    /// this device.
    fn group_epoch_secret(&self, epoch_key: &PublicEncryptionKey) -> Result<Option<[u8; 32]>> {
        let Some(group) = self.processor().groups().group_of_epoch_key(epoch_key) else {
            return Ok(None);
        };
        let device_key = self.device().encryption_key();
        for epoch in group.epochs() {
            if epoch.public_key != *epoch_key {
                continue;
            }
            if let Some(wrapped) = epoch.wrapped_for_device(&device_key) {
                let secret = keyseal_crypto::open_key(
                    wrapped.as_bytes(),
                    &self.device().encryption.secret_bytes(),
                )?;
                return Ok(Some(secret));
            }
        }
        Ok(None)
    }
}
