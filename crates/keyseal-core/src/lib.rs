//! Keyseal trust and key-distribution core
//!
//! A local verified mirror of a trustchain (an append-only log of signed
//! blocks) plus the key-distribution operations built on top of it: group
//! lifecycle, resource key sharing, and provisional identity claims.
//!
//! # Architecture
//!
//! The core is a pure state machine over blocks, decoupled from transport.
//! Blocks arrive from the caller in log order; [`TrustchainProcessor`]
//! verifies each one (index continuity, author signature, authorization)
//! and dispatches it into in-memory directories. Only the watermark and the
//! trustchain root key are persisted, through the [`Storage`] trait; the
//! directories are rebuilt by replaying the log.
//!
//! [`Session`] is the emitting side: it couples a [`LocalDevice`]'s key
//! material with a processor. Local operations build a payload, sign it,
//! and self-apply the resulting block through the same verified path before
//! handing it to the caller for transport, so a session always reads its
//! own writes.
//!
//! # Components
//!
//! - [`processor`]: Block verification and dispatch
//! - [`metadata`]: Persistent trustchain metadata (watermark, root key)
//! - [`users`]: User and device directory
//! - [`groups`]: Group directory with per-epoch wrapped keys
//! - [`shares`]: Wrapped resource-key entries
//! - [`claims`]: Provisional claim registry and verification seam
//! - [`session`]: Local device session
//! - [`group_manager`]: Group creation and membership updates
//! - [`sharing`]: Resource key sharing and recovery
//! - [`claim`]: Provisional identity claim flow
//! - [`storage`]: Storage backends (in-memory, redb)
//! - [`error`]: Error types

pub mod claim;
pub mod claims;
pub mod error;
pub mod group_manager;
pub mod groups;
pub mod metadata;
pub mod processor;
pub mod session;
pub mod shares;
pub mod sharing;
pub mod storage;
pub mod users;

pub use claims::{ClaimRegistry, ClaimVerifier, VerificationProof};
pub use error::{Error, RecipientId, Result};
pub use groups::{Group, GroupDirectory, GroupEpoch};
pub use metadata::TrustchainMetadata;
pub use processor::TrustchainProcessor;
pub use session::{LocalDevice, Session};
pub use shares::{PendingShare, ResourceShareStore};
pub use sharing::ShareTargets;
pub use storage::{MemoryStorage, RedbStorage, Storage, StorageError};
pub use users::{Device, UserDirectory};
