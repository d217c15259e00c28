//! Core error taxonomy.
//!
//! Three families, handled differently by callers:
//!
//! - Trust violations ([`Error::OutOfOrderBlock`], [`Error::InvalidSignature`],
//!   [`Error::UnknownAuthor`], [`Error::AlreadyClaimed`]) abort the operation
//!   and are never retried silently.
//! - Authorization-state errors ([`Error::RecipientsNotFound`],
//!   [`Error::NotAGroupMember`], [`Error::ResourceNotFound`],
//!   [`Error::InvalidArgument`]) are recoverable: the caller can fix the
//!   request or wait for a future share. They carry enough structure to
//!   retry precisely.
//! - Input validation ([`Error::InvalidGroupSize`]) is rejected before any
//!   cryptographic work or block emission.
//!
//! Infrastructure errors from collaborators are wrapped, not reinterpreted.

use keyseal_proto::{GroupId, ProtocolError, PublicEncryptionKey, ResourceId, UserId};
use thiserror::Error;

use crate::storage::StorageError;

/// An identifier that could not be resolved to key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientId {
    /// A user with no known devices.
    User(UserId),
    /// A group absent from the group directory.
    Group(GroupId),
    /// A provisional identity, by its app-layer public key.
    Provisional(PublicEncryptionKey),
}

/// Errors from the trustchain and key-distribution core.
#[derive(Debug, Error)]
pub enum Error {
    /// A block arrived with an index other than watermark + 1.
    #[error("out-of-order block: expected index {expected}, got {actual}")]
    OutOfOrderBlock {
        /// The only index that would have been accepted.
        expected: u64,
        /// The index the block carried.
        actual: u64,
    },

    /// A block signature did not verify against its author.
    #[error("block signature verification failed")]
    InvalidSignature,

    /// A block author is neither the trustchain root nor a known device.
    #[error("block author is not known to the directories")]
    UnknownAuthor,

    /// The trustchain root key was read before being learned.
    #[error("trustchain public key has not been set")]
    UninitializedTrustchainKey,

    /// An attempt to replace the pinned trustchain root key.
    #[error("trustchain public key is already set to a different key")]
    TrustchainKeyAlreadySet,

    /// The user has no devices in the directory.
    #[error("unknown user {0}")]
    UnknownUser(UserId),

    /// A divergent replay of an existing group id.
    #[error("group {0} already exists with different contents")]
    DuplicateGroup(GroupId),

    /// The caller holds no wrapped entry for any epoch of the group.
    #[error("caller is not a member of group {0}")]
    NotAGroupMember(GroupId),

    /// Some requested recipients could not be resolved.
    ///
    /// Carries exactly the unresolvable subset so valid recipients mixed
    /// into the same request remain distinguishable.
    #[error("some recipients could not be resolved: {recipient_ids:?}")]
    RecipientsNotFound {
        /// The unresolved identifiers, in request order.
        recipient_ids: Vec<RecipientId>,
    },

    /// No wrapped entry for this resource is currently readable by the
    /// caller. Expected for shares made under a pre-membership group epoch;
    /// resolvable once the resource is re-shared.
    #[error("no readable key found for resource {0}")]
    ResourceNotFound(ResourceId),

    /// The request is malformed or the caller lacks standing to make it.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A group operation with an empty combined member set.
    #[error("a group must have at least one member")]
    InvalidGroupSize,

    /// The provisional identity is already attached to a user.
    #[error("provisional identity was already claimed")]
    AlreadyClaimed,

    /// The ownership proof for a provisional identity was rejected.
    #[error("verification proof rejected")]
    InvalidVerification,

    /// Crypto collaborator failure, passed through.
    #[error(transparent)]
    Crypto(#[from] keyseal_crypto::CryptoError),

    /// Storage collaborator failure, passed through.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Payload encoding failure, passed through.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
