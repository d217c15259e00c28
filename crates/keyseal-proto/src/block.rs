//! Trustchain blocks and their payload variants.
//!
//! A block is one signed entry in the trustchain. The payload is a tagged
//! variant; each variant is applied by exactly one directory on the consumer
//! side (user directory, group directory or resource share store).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ids::{GroupId, ResourceId, UserId};
use crate::keys::{PublicEncryptionKey, PublicSignatureKey, Signature, WrappedKey};

/// One signed entry in the trustchain.
///
/// Blocks are immutable once accepted. The `index` is assigned by the log
/// and must be exactly one past the consumer's watermark; `signature` covers
/// the CBOR encoding of `payload` and verifies against `author`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the trustchain, strictly increasing, no gaps.
    pub index: u64,
    /// Signature public key of the block author.
    pub author: PublicSignatureKey,
    /// Ed25519 signature over the payload's signing bytes.
    pub signature: Signature,
    /// The operation this block carries.
    pub payload: Payload,
}

/// Tagged block payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// A device was added to a user.
    DeviceCreation(DeviceCreation),
    /// A group was created.
    GroupCreation(GroupCreation),
    /// Members were added to a group, rotating its key.
    GroupMembersAdded(GroupMembersAdded),
    /// A resource key was published to user devices.
    KeyPublishToUser(KeyPublishToUser),
    /// A resource key was published to group epochs.
    KeyPublishToGroup(KeyPublishToGroup),
    /// A resource key was published to provisional identities.
    KeyPublishToProvisionalUser(KeyPublishToProvisionalUser),
    /// A provisional identity was claimed by a registered user.
    ProvisionalIdentityClaim(ProvisionalIdentityClaim),
}

impl Payload {
    /// CBOR encoding of the payload, used as signature coverage.
    pub fn signing_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(self, &mut bytes)?;
        Ok(bytes)
    }
}

/// Device creation payload.
///
/// # Protocol flow
///
/// The first device of a user is authored by the trustchain root (the server
/// certifies the registration); later devices are authored by an existing
/// device of the same user. Device addition is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCreation {
    /// User the device belongs to.
    pub user_id: UserId,
    /// The device's signature public key (block authorship).
    pub signature_key: PublicSignatureKey,
    /// The device's encryption public key (wrapping target).
    pub encryption_key: PublicEncryptionKey,
}

/// One member's wrapped access to a group epoch key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMemberEntry {
    /// The member.
    pub user_id: UserId,
    /// The device encryption key the epoch secret is wrapped under.
    pub device_encryption_key: PublicEncryptionKey,
    /// The epoch secret, sealed under that device key.
    pub wrapped_group_key: WrappedKey,
}

/// A pending provisional membership in a group epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionalMemberEntry {
    /// App-layer key of the provisional identity.
    pub app_encryption_key: PublicEncryptionKey,
    /// Outer-layer key of the provisional identity.
    pub outer_encryption_key: PublicEncryptionKey,
    /// The epoch secret, sealed under the app key then the outer key.
    pub wrapped_group_key: WrappedKey,
}

/// Group creation payload.
///
/// Carries the epoch-0 public key and the epoch secret wrapped for every
/// founding member device and every provisional member. The creator is a
/// member only if listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCreation {
    /// Identifier of the new group.
    pub group_id: GroupId,
    /// Epoch-0 public encryption key.
    pub public_key: PublicEncryptionKey,
    /// Wrapped epoch secret per founding member device.
    pub members: Vec<GroupMemberEntry>,
    /// Wrapped epoch secret per provisional member.
    pub provisional_members: Vec<ProvisionalMemberEntry>,
}

/// Group membership change payload.
///
/// # Protocol flow
///
/// Adding members rotates the group key: a fresh epoch keypair is generated
/// and wrapped for every current member device, every new member device and
/// every still-pending provisional identity. New members never receive
/// pre-addition epochs, so resources shared under an older epoch stay
/// unreadable to them until re-shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembersAdded {
    /// The group being extended.
    pub group_id: GroupId,
    /// Public key of the new epoch.
    pub new_public_key: PublicEncryptionKey,
    /// Wrapped new-epoch secret for all member devices, old and new.
    pub members: Vec<GroupMemberEntry>,
    /// Wrapped new-epoch secret for all pending provisionals, old and new.
    pub provisional_members: Vec<ProvisionalMemberEntry>,
}

/// A resource key wrapped for one user device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserShareEntry {
    /// Target user.
    pub user_id: UserId,
    /// Target device encryption key.
    pub device_encryption_key: PublicEncryptionKey,
    /// The resource key, sealed under that device key.
    pub wrapped_key: WrappedKey,
}

/// A resource key wrapped for one group epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupShareEntry {
    /// Target group.
    pub group_id: GroupId,
    /// The epoch public key current at share time.
    pub group_public_key: PublicEncryptionKey,
    /// The resource key, sealed under that epoch key.
    pub wrapped_key: WrappedKey,
}

/// A resource key wrapped for one provisional identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionalShareEntry {
    /// App-layer key of the target.
    pub app_encryption_key: PublicEncryptionKey,
    /// Outer-layer key of the target.
    pub outer_encryption_key: PublicEncryptionKey,
    /// The resource key, sealed under the app key then the outer key.
    pub wrapped_key: WrappedKey,
}

/// Resource key publication to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPublishToUser {
    /// The resource whose key is being distributed.
    pub resource_id: ResourceId,
    /// One entry per target device.
    pub entries: Vec<UserShareEntry>,
}

/// Resource key publication to groups.
///
/// Sharing to a group only needs the group's public half; the author does
/// not have to be a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPublishToGroup {
    /// The resource whose key is being distributed.
    pub resource_id: ResourceId,
    /// One entry per target group.
    pub entries: Vec<GroupShareEntry>,
}

/// Resource key publication to provisional identities.
///
/// These entries stay pending until the identity is claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPublishToProvisionalUser {
    /// The resource whose key is being distributed.
    pub resource_id: ResourceId,
    /// One entry per target identity.
    pub entries: Vec<ProvisionalShareEntry>,
}

/// A group epoch secret re-wrapped at claim time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimGroupEntry {
    /// Group the pending membership belonged to.
    pub group_id: GroupId,
    /// Which epoch the re-wrapped secret opens.
    pub epoch_public_key: PublicEncryptionKey,
    /// The epoch secret, sealed under the claimer's device key.
    pub wrapped_group_key: WrappedKey,
}

/// A direct resource share re-wrapped at claim time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimResourceEntry {
    /// The resource the pending share was for.
    pub resource_id: ResourceId,
    /// The resource key, sealed under the claimer's device key.
    pub wrapped_key: WrappedKey,
}

/// Provisional identity claim payload.
///
/// # Protocol flow
///
/// After proving ownership of the bound contact method, the claiming user
/// re-wraps every pending group epoch secret and every pending direct share
/// under its own device key and publishes them in a single block. Consumers
/// promote the pending membership to a real one, attach the re-wrapped
/// shares to the claimer and drop the pending entries. A provisional
/// identity can be claimed by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionalIdentityClaim {
    /// The claiming user.
    pub user_id: UserId,
    /// App-layer key of the claimed identity.
    pub app_encryption_key: PublicEncryptionKey,
    /// Outer-layer key of the claimed identity.
    pub outer_encryption_key: PublicEncryptionKey,
    /// The claimer's device encryption key the re-wraps target.
    pub device_encryption_key: PublicEncryptionKey,
    /// Re-wrapped pending group memberships.
    pub group_entries: Vec<ClaimGroupEntry>,
    /// Re-wrapped pending direct shares.
    pub resource_entries: Vec<ClaimResourceEntry>,
}
