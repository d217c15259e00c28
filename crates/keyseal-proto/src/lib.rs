//! Wire format for the keyseal trustchain.
//!
//! A trustchain is an append-only log of signed blocks. Each block carries a
//! tagged CBOR payload describing one identity or key-distribution operation
//! (device creation, group creation, membership change, key publication,
//! provisional identity claim). The block index is assigned by the log, not
//! by the author, so signatures cover the payload encoding only; ordering is
//! enforced by index continuity at the consumer.
//!
//! # Security
//!
//! Payload encoding is canonical enough for signature coverage because every
//! author signs the exact bytes it serialized; consumers verify against the
//! received encoding, never against a re-serialization.

pub mod block;
pub mod error;
pub mod ids;
pub mod keys;

pub use block::{
    Block, ClaimGroupEntry, ClaimResourceEntry, DeviceCreation, GroupCreation, GroupMemberEntry,
    GroupMembersAdded, GroupShareEntry, KeyPublishToGroup, KeyPublishToProvisionalUser,
    KeyPublishToUser, Payload, ProvisionalIdentityClaim, ProvisionalMemberEntry,
    ProvisionalShareEntry, UserShareEntry,
};
pub use error::{ProtocolError, Result};
pub use ids::{GroupId, ResourceId, UserId};
pub use keys::{
    PublicEncryptionKey, PublicProvisionalIdentity, PublicSignatureKey, Signature, WrappedKey,
};
