//! Group directory: group state built from trustchain blocks.
//!
//! A group is a list of key epochs plus an append-only membership set.
//! Every membership change rotates the group key: the new epoch secret is
//! wrapped for every current member device, while older epochs keep their
//! original wrapped entries. A member can read exactly the epochs that were
//! wrapped for one of its devices, which scopes late joiners forward —
//! resources shared under a pre-addition epoch stay out of their reach.
//!
//! Epoch secrets are never stored in plaintext; the directory only holds
//! wrapped blobs keyed by target public key.

use std::collections::{BTreeSet, HashMap};

use keyseal_proto::{
    GroupCreation, GroupId, GroupMemberEntry, GroupMembersAdded, ProvisionalIdentityClaim,
    ProvisionalMemberEntry, PublicEncryptionKey, UserId, WrappedKey,
};

use crate::error::{Error, Result};

/// One key epoch of a group.
#[derive(Debug, Clone)]
pub struct GroupEpoch {
    /// The epoch's public encryption key (wrapping target for shares).
    pub public_key: PublicEncryptionKey,
    /// Epoch secret wrapped per member device encryption key.
    wrapped_for_devices: HashMap<PublicEncryptionKey, WrappedKey>,
    /// Epoch secret double-sealed per pending provisional app key.
    wrapped_for_provisionals: HashMap<PublicEncryptionKey, WrappedKey>,
}

impl GroupEpoch {
    fn from_entries(
        public_key: PublicEncryptionKey,
        members: &[GroupMemberEntry],
        provisionals: &[ProvisionalMemberEntry],
    ) -> Self {
        let wrapped_for_devices = members
            .iter()
            .map(|entry| (entry.device_encryption_key, entry.wrapped_group_key.clone()))
            .collect();
        let wrapped_for_provisionals = provisionals
            .iter()
            .map(|entry| (entry.app_encryption_key, entry.wrapped_group_key.clone()))
            .collect();
        Self { public_key, wrapped_for_devices, wrapped_for_provisionals }
    }

    /// The wrapped epoch secret for a device, if that device was a target.
    pub fn wrapped_for_device(&self, device_key: &PublicEncryptionKey) -> Option<&WrappedKey> {
        self.wrapped_for_devices.get(device_key)
    }

    /// The pending wrapped epoch secret for a provisional app key.
    pub fn wrapped_for_provisional(&self, app_key: &PublicEncryptionKey) -> Option<&WrappedKey> {
        self.wrapped_for_provisionals.get(app_key)
    }
}

/// One group's replayed state.
#[derive(Debug, Clone)]
pub struct Group {
    id: GroupId,
    members: BTreeSet<UserId>,
    /// Pending provisional members: app key to outer key.
    pending_provisionals: HashMap<PublicEncryptionKey, PublicEncryptionKey>,
    epochs: Vec<GroupEpoch>,
}

impl Group {
    /// The group identifier.
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Current members, in stable order.
    pub fn members(&self) -> impl Iterator<Item = &UserId> {
        self.members.iter()
    }

    /// Whether a user is currently a member.
    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.members.contains(user_id)
    }

    /// Pending provisional members as (app key, outer key) pairs.
    pub fn pending_provisionals(
        &self,
    ) -> impl Iterator<Item = (&PublicEncryptionKey, &PublicEncryptionKey)> {
        self.pending_provisionals.iter()
    }

    /// All key epochs, oldest first.
    pub fn epochs(&self) -> &[GroupEpoch] {
        &self.epochs
    }

    /// The current epoch's public key, the wrapping target for new shares.
    pub fn current_public_key(&self) -> PublicEncryptionKey {
        match self.epochs.last() {
            Some(epoch) => epoch.public_key,
            // Groups are only constructed with a creation epoch.
            None => unreachable!("group without a creation epoch"),
        }
    }

    /// Whether any epoch is wrapped for the given device key.
    pub fn has_device_entry(&self, device_key: &PublicEncryptionKey) -> bool {
        self.epochs.iter().any(|epoch| epoch.wrapped_for_device(device_key).is_some())
    }
}

/// Maps group identifiers to group state. Mutated only by block processing.
#[derive(Debug, Default)]
pub struct GroupDirectory {
    groups: HashMap<GroupId, Group>,
    group_by_epoch_key: HashMap<PublicEncryptionKey, GroupId>,
}

impl GroupDirectory {
    /// Look up a group.
    pub fn group(&self, group_id: &GroupId) -> Option<&Group> {
        self.groups.get(group_id)
    }

    /// Whether the group exists.
    pub fn contains(&self, group_id: &GroupId) -> bool {
        self.groups.contains_key(group_id)
    }

    /// All known groups, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.values()
    }

    /// The group owning an epoch public key, for resolving group shares.
    pub fn group_of_epoch_key(&self, epoch_key: &PublicEncryptionKey) -> Option<&Group> {
        self.group_by_epoch_key.get(epoch_key).and_then(|id| self.groups.get(id))
    }

    /// Apply a group creation payload.
    ///
    /// An exact replay (same epoch-0 key) is a no-op; a different payload
    /// under an existing id is a divergence and is rejected.
    pub fn apply_group_creation(&mut self, creation: &GroupCreation) -> Result<()> {
        if let Some(existing) = self.groups.get(&creation.group_id) {
            if existing.epochs[0].public_key == creation.public_key {
                return Ok(());
            }
            return Err(Error::DuplicateGroup(creation.group_id));
        }

        let epoch = GroupEpoch::from_entries(
            creation.public_key,
            &creation.members,
            &creation.provisional_members,
        );
        let group = Group {
            id: creation.group_id,
            members: creation.members.iter().map(|entry| entry.user_id).collect(),
            pending_provisionals: creation
                .provisional_members
                .iter()
                .map(|entry| (entry.app_encryption_key, entry.outer_encryption_key))
                .collect(),
            epochs: vec![epoch],
        };

        self.group_by_epoch_key.insert(creation.public_key, creation.group_id);
        self.groups.insert(creation.group_id, group);
        Ok(())
    }

    /// Apply a membership change payload, appending a key epoch.
    ///
    /// Users already in the member set stay members (a repeated add is a
    /// silent no-op from the membership perspective); replaying the exact
    /// block (same new epoch key) changes nothing.
    pub fn apply_members_added(&mut self, added: &GroupMembersAdded) -> Result<()> {
        let group = self
            .groups
            .get_mut(&added.group_id)
            .ok_or_else(|| Error::InvalidArgument("members added to unknown group".into()))?;

        if group.epochs.iter().any(|epoch| epoch.public_key == added.new_public_key) {
            return Ok(());
        }

        let epoch = GroupEpoch::from_entries(
            added.new_public_key,
            &added.members,
            &added.provisional_members,
        );
        group.epochs.push(epoch);
        group.members.extend(added.members.iter().map(|entry| entry.user_id));
        // The emitter lists every still-pending provisional, so the entry
        // set is authoritative for the pending map.
        group.pending_provisionals = added
            .provisional_members
            .iter()
            .map(|entry| (entry.app_encryption_key, entry.outer_encryption_key))
            .collect();

        self.group_by_epoch_key.insert(added.new_public_key, added.group_id);
        Ok(())
    }

    /// Apply the group side of a provisional identity claim: promote the
    /// pending membership to a real one, attaching the re-wrapped epoch
    /// secrets to the claimer's device and dropping the pending entries.
    pub fn apply_claim(&mut self, claim: &ProvisionalIdentityClaim) -> Result<()> {
        for entry in &claim.group_entries {
            let group = self
                .groups
                .get_mut(&entry.group_id)
                .ok_or_else(|| Error::InvalidArgument("claim references unknown group".into()))?;
            let epoch = group
                .epochs
                .iter_mut()
                .find(|epoch| epoch.public_key == entry.epoch_public_key)
                .ok_or_else(|| {
                    Error::InvalidArgument("claim references unknown group epoch".into())
                })?;

            epoch
                .wrapped_for_devices
                .insert(claim.device_encryption_key, entry.wrapped_group_key.clone());
            epoch.wrapped_for_provisionals.remove(&claim.app_encryption_key);
            group.pending_provisionals.remove(&claim.app_encryption_key);
            group.members.insert(claim.user_id);
        }
        Ok(())
    }
}
