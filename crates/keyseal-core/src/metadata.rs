//! Trustchain metadata store.
//!
//! Persists the two singleton facts of trustchain synchronization: the last
//! processed block index (the watermark) and the trustchain root public key
//! (the trust anchor). The watermark never regresses; the root key is set at
//! most once. Reading an unset root key is a hard error, never a default —
//! a missing trust anchor must not silently verify anything.

use keyseal_proto::PublicSignatureKey;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::Storage;

const TABLE_METADATA: &str = "trustchain_metadata";
const LAST_BLOCK_INDEX_KEY: &str = "lastBlockIndex";
const TRUSTCHAIN_PUBLIC_KEY: &str = "trustchainPublicKey";

#[derive(Serialize, Deserialize)]
struct IndexRecord {
    index: u64,
}

#[derive(Serialize, Deserialize)]
struct PublicKeyRecord {
    trustchain_public_key: [u8; 32],
}

/// The trustchain synchronization state, cached in memory and durably
/// persisted through a [`Storage`] backend on every mutation.
pub struct TrustchainMetadata<S: Storage> {
    storage: S,
    last_block_index: u64,
    trustchain_public_key: Option<PublicSignatureKey>,
}

impl<S: Storage> TrustchainMetadata<S> {
    /// Open the store, reading persisted state. A fresh store starts at
    /// index 0 with no root key.
    pub fn open(storage: S) -> Result<Self> {
        let last_block_index = match storage.get(TABLE_METADATA, LAST_BLOCK_INDEX_KEY)? {
            Some(bytes) => decode::<IndexRecord>(&bytes)?.index,
            None => 0,
        };
        let trustchain_public_key = storage
            .get(TABLE_METADATA, TRUSTCHAIN_PUBLIC_KEY)?
            .map(|bytes| decode::<PublicKeyRecord>(&bytes))
            .transpose()?
            .map(|record| PublicSignatureKey(record.trustchain_public_key));

        Ok(Self { storage, last_block_index, trustchain_public_key })
    }

    /// The last processed block index, 0 if nothing was processed yet.
    pub fn last_block_index(&self) -> u64 {
        self.last_block_index
    }

    /// Persist a new watermark. A value not greater than the current one is
    /// ignored; the watermark never regresses.
    pub fn set_last_block_index(&mut self, index: u64) -> Result<()> {
        if index <= self.last_block_index {
            return Ok(());
        }
        let bytes = encode(&IndexRecord { index })?;
        self.storage.put(TABLE_METADATA, LAST_BLOCK_INDEX_KEY, &bytes)?;
        self.last_block_index = index;
        Ok(())
    }

    /// The trustchain root public key.
    pub fn trustchain_public_key(&self) -> Result<PublicSignatureKey> {
        self.trustchain_public_key.ok_or(Error::UninitializedTrustchainKey)
    }

    /// Pin the trustchain root public key. Setting the same key again is a
    /// no-op; a different key is rejected, the anchor is immutable once
    /// learned.
    pub fn set_trustchain_public_key(&mut self, key: PublicSignatureKey) -> Result<()> {
        match self.trustchain_public_key {
            Some(existing) if existing == key => return Ok(()),
            Some(_) => return Err(Error::TrustchainKeyAlreadySet),
            None => {}
        }
        let bytes = encode(&PublicKeyRecord { trustchain_public_key: key.0 })?;
        self.storage.put(TABLE_METADATA, TRUSTCHAIN_PUBLIC_KEY, &bytes)?;
        self.trustchain_public_key = Some(key);
        Ok(())
    }
}

fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(record, &mut bytes).map_err(keyseal_proto::ProtocolError::from)?;
    Ok(bytes)
}

fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T> {
    Ok(ciborium::de::from_reader(bytes).map_err(keyseal_proto::ProtocolError::from)?)
}
