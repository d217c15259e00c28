//! Group lifecycle operations: creation and membership updates.
//!
//! Both operations validate before any cryptographic work, wrap the epoch
//! secret for every target, and commit through a single emit step — a
//! failure anywhere before that leaves the group directory unmodified.

use keyseal_crypto::{key_fingerprint, EncryptionKeyPair};
use keyseal_proto::{
    Block, GroupCreation, GroupId, GroupMemberEntry, GroupMembersAdded, Payload,
    ProvisionalMemberEntry, PublicEncryptionKey, PublicProvisionalIdentity, UserId, WrappedKey,
};
use tracing::info;

use crate::error::{Error, RecipientId, Result};
use crate::session::Session;
use crate::storage::Storage;
use crate::users::Device;

impl<S: Storage> Session<S> {
    /// Create a group with the given members and provisional members.
    ///
    /// Generates a fresh epoch-0 keypair, wraps its secret for every member
    /// device and provisional identity, and emits a GroupCreation block. The
    /// group id is derived from the epoch-0 public key. The caller is a
    /// member only if listed.
    pub fn create_group(
        &mut self,
        members: &[UserId],
        provisional_members: &[PublicProvisionalIdentity],
    ) -> Result<(GroupId, Block)> {
        if members.is_empty() && provisional_members.is_empty() {
            return Err(Error::InvalidGroupSize);
        }
        self.reject_claimed(provisional_members)?;
        let member_devices = self.resolve_members(members)?;

        let group_key = EncryptionKeyPair::generate();
        let group_id = GroupId(key_fingerprint(&group_key.public_bytes()));
        let secret = group_key.secret_bytes();

        let payload = Payload::GroupCreation(GroupCreation {
            group_id,
            public_key: PublicEncryptionKey(group_key.public_bytes()),
            members: wrap_member_entries(&secret, &member_devices)?,
            provisional_members: wrap_new_provisional_entries(&secret, provisional_members)?,
        });
        let block = self.emit(payload)?;

        info!(group = %group_id, members = members.len(), "group created");
        Ok((group_id, block))
    }

    /// Add members and provisional members to a group.
    ///
    /// Rotates the group key: the fresh epoch secret is wrapped for every
    /// current member device, every added member device and every pending
    /// provisional identity. Members added here cannot read epochs from
    /// before the addition. Adding a user who is already a member succeeds
    /// silently.
    pub fn update_members(
        &mut self,
        group_id: GroupId,
        users_to_add: &[UserId],
        provisional_to_add: &[PublicProvisionalIdentity],
    ) -> Result<Block> {
        if users_to_add.is_empty() && provisional_to_add.is_empty() {
            return Err(Error::InvalidGroupSize);
        }
        self.reject_claimed(provisional_to_add)?;

        let (current_members, mut pending) = {
            let group = self
                .processor()
                .groups()
                .group(&group_id)
                .ok_or_else(|| Error::InvalidArgument("unknown group".into()))?;
            if !group.is_member(&self.user_id()) {
                return Err(Error::InvalidArgument(
                    "cannot update members of a group you are not in".into(),
                ));
            }
            let members: Vec<UserId> = group.members().copied().collect();
            let pending: Vec<(PublicEncryptionKey, PublicEncryptionKey)> =
                group.pending_provisionals().map(|(app, outer)| (*app, *outer)).collect();
            (members, pending)
        };

        let added_devices = self.resolve_members(users_to_add)?;
        // Current members resolve from the directory; they were all resolved
        // when they joined, so failure here means directory corruption.
        let mut targets = self.resolve_members(&current_members)?;
        for target in added_devices {
            if !targets.iter().any(|(user, _)| *user == target.0) {
                targets.push(target);
            }
        }

        for identity in provisional_to_add {
            let pair = (identity.app_encryption_key, identity.outer_encryption_key);
            if !pending.contains(&pair) {
                pending.push(pair);
            }
        }

        let epoch_key = EncryptionKeyPair::generate();
        let secret = epoch_key.secret_bytes();

        let payload = Payload::GroupMembersAdded(GroupMembersAdded {
            group_id,
            new_public_key: PublicEncryptionKey(epoch_key.public_bytes()),
            members: wrap_member_entries(&secret, &targets)?,
            provisional_members: wrap_pending_provisional_entries(&secret, &pending)?,
        });
        let block = self.emit(payload)?;

        info!(group = %group_id, added = users_to_add.len(), "group members updated");
        Ok(block)
    }

    /// Resolve user ids to their devices, reporting exactly the subset that
    /// cannot be resolved.
    pub(crate) fn resolve_members(
        &self,
        user_ids: &[UserId],
    ) -> Result<Vec<(UserId, Vec<Device>)>> {
        let mut resolved = Vec::with_capacity(user_ids.len());
        let mut missing = Vec::new();
        for user_id in user_ids {
            match self.processor().users().device_keys(user_id) {
                Ok(devices) => resolved.push((*user_id, devices.to_vec())),
                Err(_) => missing.push(RecipientId::User(*user_id)),
            }
        }
        if missing.is_empty() {
            Ok(resolved)
        } else {
            Err(Error::RecipientsNotFound { recipient_ids: missing })
        }
    }

    /// Reject provisional targets that were already claimed; sharing to them
    /// can never be delivered.
    pub(crate) fn reject_claimed(
        &self,
        provisionals: &[PublicProvisionalIdentity],
    ) -> Result<()> {
        for identity in provisionals {
            if self.processor().claims().is_claimed(&identity.app_encryption_key) {
                return Err(Error::AlreadyClaimed);
            }
        }
        Ok(())
    }
}

fn wrap_member_entries(
    secret: &[u8; 32],
    targets: &[(UserId, Vec<Device>)],
) -> Result<Vec<GroupMemberEntry>> {
    let mut entries = Vec::new();
    for (user_id, devices) in targets {
        for device in devices {
            entries.push(GroupMemberEntry {
                user_id: *user_id,
                device_encryption_key: device.encryption_key,
                wrapped_group_key: WrappedKey(keyseal_crypto::seal(
                    secret,
                    device.encryption_key.as_bytes(),
                )?),
            });
        }
    }
    Ok(entries)
}

fn wrap_new_provisional_entries(
    secret: &[u8; 32],
    identities: &[PublicProvisionalIdentity],
) -> Result<Vec<ProvisionalMemberEntry>> {
    let pairs: Vec<(PublicEncryptionKey, PublicEncryptionKey)> = identities
        .iter()
        .map(|identity| (identity.app_encryption_key, identity.outer_encryption_key))
        .collect();
    wrap_pending_provisional_entries(secret, &pairs)
}

fn wrap_pending_provisional_entries(
    secret: &[u8; 32],
    pairs: &[(PublicEncryptionKey, PublicEncryptionKey)],
) -> Result<Vec<ProvisionalMemberEntry>> {
    pairs
        .iter()
        .map(|(app, outer)| {
            Ok(ProvisionalMemberEntry {
                app_encryption_key: *app,
                outer_encryption_key: *outer,
                wrapped_group_key: WrappedKey(
                    keyseal_crypto::seal_to_provisional(
                        secret,
                        app.as_bytes(),
                        outer.as_bytes(),
                    )?,
                ),
            })
        })
        .collect()
}
