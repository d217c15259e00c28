//! Block processor: the serialized trustchain state machine.
//!
//! The processor is always "synchronized at index N". A candidate block is
//! accepted only if its index is exactly N + 1, its signature verifies
//! against its author, and its author is authorized for the operation (the
//! trustchain root for root-level blocks, a known device otherwise). On
//! success the payload is dispatched to the owning directory and the
//! watermark advances to N + 1.
//!
//! Application is serialized through `&mut self`: no reader can observe a
//! directory mutation without the matching index bump or the reverse. The
//! processor does not buffer or reorder; on a gap the caller must refetch.
//!
//! Every directory apply is idempotent on exact replay, so re-processing a
//! block after a crash between dispatch and watermark persistence converges
//! to the same state.

use keyseal_proto::{Block, Payload, PublicSignatureKey};
use tracing::{debug, warn};

use crate::claims::ClaimRegistry;
use crate::error::{Error, Result};
use crate::groups::GroupDirectory;
use crate::metadata::TrustchainMetadata;
use crate::shares::ResourceShareStore;
use crate::storage::Storage;
use crate::users::UserDirectory;

/// Replayed trustchain state: metadata watermark plus the directories every
/// block payload dispatches into.
pub struct TrustchainProcessor<S: Storage> {
    metadata: TrustchainMetadata<S>,
    users: UserDirectory,
    groups: GroupDirectory,
    shares: ResourceShareStore,
    claims: ClaimRegistry,
}

impl<S: Storage> TrustchainProcessor<S> {
    /// Open the processor over a storage backend.
    pub fn open(storage: S) -> Result<Self> {
        Ok(Self {
            metadata: TrustchainMetadata::open(storage)?,
            users: UserDirectory::default(),
            groups: GroupDirectory::default(),
            shares: ResourceShareStore::default(),
            claims: ClaimRegistry::default(),
        })
    }

    /// Pin the trustchain root public key.
    pub fn set_trustchain_public_key(&mut self, key: PublicSignatureKey) -> Result<()> {
        self.metadata.set_trustchain_public_key(key)
    }

    /// The pinned trustchain root public key.
    pub fn trustchain_public_key(&self) -> Result<PublicSignatureKey> {
        self.metadata.trustchain_public_key()
    }

    /// The last processed block index.
    pub fn last_block_index(&self) -> u64 {
        self.metadata.last_block_index()
    }

    /// The user directory.
    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    /// The group directory.
    pub fn groups(&self) -> &GroupDirectory {
        &self.groups
    }

    /// The resource share store.
    pub fn shares(&self) -> &ResourceShareStore {
        &self.shares
    }

    /// The provisional claim registry.
    pub fn claims(&self) -> &ClaimRegistry {
        &self.claims
    }

    /// Verify and apply one block, advancing the watermark.
    ///
    /// Any error leaves the directories and the watermark untouched.
    pub fn process_block(&mut self, block: &Block) -> Result<()> {
        let expected = self.metadata.last_block_index() + 1;
        if block.index != expected {
            warn!(expected, actual = block.index, "rejecting out-of-order block");
            return Err(Error::OutOfOrderBlock { expected, actual: block.index });
        }

        let signing_bytes = block.payload.signing_bytes()?;
        keyseal_crypto::verify_signature(
            block.author.as_bytes(),
            &signing_bytes,
            block.signature.as_bytes(),
        )
        .map_err(|_| {
            warn!(index = block.index, author = %block.author, "rejecting block with bad signature");
            Error::InvalidSignature
        })?;

        self.authorize(block)?;
        self.dispatch(block)?;
        self.metadata.set_last_block_index(block.index)?;

        debug!(index = block.index, "block applied");
        Ok(())
    }

    /// Check that the block author may perform the operation it carries.
    fn authorize(&self, block: &Block) -> Result<()> {
        // Trust anchor absence is a hard error, not a default.
        let root = self.metadata.trustchain_public_key()?;

        match &block.payload {
            Payload::DeviceCreation(creation) => {
                if block.author == root {
                    return Ok(());
                }
                match self.users.owner_of(&block.author) {
                    Some(owner) if owner == creation.user_id => Ok(()),
                    Some(_) => Err(Error::InvalidArgument(
                        "device creation authored by another user's device".into(),
                    )),
                    None => Err(Error::UnknownAuthor),
                }
            }
            Payload::GroupMembersAdded(added) => {
                let author_user =
                    self.users.owner_of(&block.author).ok_or(Error::UnknownAuthor)?;
                let group = self.groups.group(&added.group_id).ok_or_else(|| {
                    Error::InvalidArgument("members added to unknown group".into())
                })?;
                if group.is_member(&author_user) {
                    Ok(())
                } else {
                    Err(Error::InvalidArgument(
                        "cannot update members of a group the author is not in".into(),
                    ))
                }
            }
            Payload::ProvisionalIdentityClaim(claim) => {
                let author_user =
                    self.users.owner_of(&block.author).ok_or(Error::UnknownAuthor)?;
                if author_user == claim.user_id {
                    Ok(())
                } else {
                    Err(Error::InvalidArgument(
                        "claim authored by a device of another user".into(),
                    ))
                }
            }
            Payload::GroupCreation(_)
            | Payload::KeyPublishToUser(_)
            | Payload::KeyPublishToGroup(_)
            | Payload::KeyPublishToProvisionalUser(_) => {
                self.users.owner_of(&block.author).map(|_| ()).ok_or(Error::UnknownAuthor)
            }
        }
    }

    /// Dispatch the payload to the directory that owns its effect.
    fn dispatch(&mut self, block: &Block) -> Result<()> {
        match &block.payload {
            Payload::DeviceCreation(creation) => self.users.apply_device_creation(creation),
            Payload::GroupCreation(creation) => self.groups.apply_group_creation(creation),
            Payload::GroupMembersAdded(added) => self.groups.apply_members_added(added),
            Payload::KeyPublishToUser(publish) => {
                self.shares.apply_user_publish(publish);
                Ok(())
            }
            Payload::KeyPublishToGroup(publish) => {
                self.shares.apply_group_publish(publish);
                Ok(())
            }
            Payload::KeyPublishToProvisionalUser(publish) => {
                self.shares.apply_provisional_publish(publish);
                Ok(())
            }
            Payload::ProvisionalIdentityClaim(claim) => {
                // Validate the binding before mutating anything; a replay by
                // the same user is a no-op because all applies converged the
                // first time.
                if let Some(existing) = self.claims.claimed_by(&claim.app_encryption_key) {
                    return if existing == claim.user_id {
                        Ok(())
                    } else {
                        Err(Error::AlreadyClaimed)
                    };
                }
                self.groups.apply_claim(claim)?;
                self.shares.apply_claim(claim);
                self.claims.record(claim.app_encryption_key, claim.user_id)
            }
        }
    }
}
