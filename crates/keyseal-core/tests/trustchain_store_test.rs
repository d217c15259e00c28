//! Trustchain metadata store tests
//!
//! Durability and watermark semantics across both storage backends.

use keyseal_core::{Error, MemoryStorage, RedbStorage, TrustchainMetadata};
use keyseal_proto::PublicSignatureKey;

#[test]
fn fresh_store_starts_at_index_zero_with_no_root_key() {
    let metadata = TrustchainMetadata::open(MemoryStorage::new()).unwrap();
    assert_eq!(metadata.last_block_index(), 0);
    assert!(matches!(
        metadata.trustchain_public_key(),
        Err(Error::UninitializedTrustchainKey)
    ));
}

#[test]
fn watermark_never_regresses() {
    let mut metadata = TrustchainMetadata::open(MemoryStorage::new()).unwrap();
    metadata.set_last_block_index(5).unwrap();
    // A lower or equal index is silently ignored.
    metadata.set_last_block_index(3).unwrap();
    metadata.set_last_block_index(5).unwrap();
    assert_eq!(metadata.last_block_index(), 5);

    metadata.set_last_block_index(6).unwrap();
    assert_eq!(metadata.last_block_index(), 6);
}

#[test]
fn root_key_is_write_once() {
    let mut metadata = TrustchainMetadata::open(MemoryStorage::new()).unwrap();
    let key = PublicSignatureKey([1; 32]);
    metadata.set_trustchain_public_key(key).unwrap();
    // Idempotent for the same key.
    metadata.set_trustchain_public_key(key).unwrap();

    assert!(matches!(
        metadata.set_trustchain_public_key(PublicSignatureKey([2; 32])),
        Err(Error::TrustchainKeyAlreadySet)
    ));
    assert_eq!(metadata.trustchain_public_key().unwrap(), key);
}

#[test]
fn state_survives_reopening_memory_storage() {
    let storage = MemoryStorage::new();
    {
        let mut metadata = TrustchainMetadata::open(storage.clone()).unwrap();
        metadata.set_trustchain_public_key(PublicSignatureKey([7; 32])).unwrap();
        metadata.set_last_block_index(42).unwrap();
    }

    let metadata = TrustchainMetadata::open(storage).unwrap();
    assert_eq!(metadata.last_block_index(), 42);
    assert_eq!(metadata.trustchain_public_key().unwrap(), PublicSignatureKey([7; 32]));
}

#[test]
fn state_survives_reopening_redb_storage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trustchain.redb");

    {
        let storage = RedbStorage::open(&path).unwrap();
        let mut metadata = TrustchainMetadata::open(storage).unwrap();
        metadata.set_trustchain_public_key(PublicSignatureKey([7; 32])).unwrap();
        metadata.set_last_block_index(42).unwrap();
    }

    let storage = RedbStorage::open(&path).unwrap();
    let metadata = TrustchainMetadata::open(storage).unwrap();
    assert_eq!(metadata.last_block_index(), 42);
    assert_eq!(metadata.trustchain_public_key().unwrap(), PublicSignatureKey([7; 32]));
}
