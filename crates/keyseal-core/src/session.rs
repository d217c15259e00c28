//! Device session: the local emitting side of the trustchain.
//!
//! A [`Session`] couples the local device's key material with a
//! [`TrustchainProcessor`]. Remote blocks are ingested through
//! [`Session::process_block`]; local operations (group management, key
//! sharing, claims) build a payload, sign it, and feed the resulting block
//! through the same serialized processor path before returning it to the
//! caller for transport. A subsequent read by this process therefore always
//! observes its own writes, and an operation that fails before self-apply
//! leaves the directories unmodified — emission and local apply are one
//! commit point.

use keyseal_crypto::{EncryptionKeyPair, SigningKeyPair};
use keyseal_proto::{Block, Payload, PublicEncryptionKey, PublicSignatureKey, Signature, UserId};

use crate::error::Result;
use crate::processor::TrustchainProcessor;
use crate::storage::Storage;

/// The local device's identity and key material.
///
/// Read from the device keystore by the session bootstrap layer; this core
/// only uses it, it never provisions it.
#[derive(Debug, Clone)]
pub struct LocalDevice {
    /// The user this device belongs to.
    pub user_id: UserId,
    /// The device's block-authorship keypair.
    pub signing: SigningKeyPair,
    /// The device's wrapping-target keypair.
    pub encryption: EncryptionKeyPair,
}

impl LocalDevice {
    /// The device's signature public key.
    pub fn signature_key(&self) -> PublicSignatureKey {
        PublicSignatureKey(self.signing.public_bytes())
    }

    /// The device's encryption public key.
    pub fn encryption_key(&self) -> PublicEncryptionKey {
        PublicEncryptionKey(self.encryption.public_bytes())
    }
}

/// A device-local view of one trustchain, able to both replay remote blocks
/// and emit new ones.
pub struct Session<S: Storage> {
    device: LocalDevice,
    processor: TrustchainProcessor<S>,
}

impl<S: Storage> Session<S> {
    /// Open a session, pinning the trustchain root public key.
    ///
    /// Fails if the store already holds a different root key.
    pub fn open(
        storage: S,
        trustchain_public_key: PublicSignatureKey,
        device: LocalDevice,
    ) -> Result<Self> {
        let mut processor = TrustchainProcessor::open(storage)?;
        processor.set_trustchain_public_key(trustchain_public_key)?;
        Ok(Self { device, processor })
    }

    /// The local device.
    pub fn device(&self) -> &LocalDevice {
        &self.device
    }

    /// The local user id.
    pub fn user_id(&self) -> UserId {
        self.device.user_id
    }

    /// The replayed trustchain state.
    pub fn processor(&self) -> &TrustchainProcessor<S> {
        &self.processor
    }

    /// Ingest one remote block.
    pub fn process_block(&mut self, block: &Block) -> Result<()> {
        self.processor.process_block(block)
    }

    /// Sign a payload, assign it the next index, and apply it locally.
    ///
    /// The returned block is ready to be appended to the trustchain by the
    /// transport layer.
    pub(crate) fn emit(&mut self, payload: Payload) -> Result<Block> {
        let signing_bytes = payload.signing_bytes()?;
        let block = Block {
            index: self.processor.last_block_index() + 1,
            author: self.device.signature_key(),
            signature: Signature(self.device.signing.sign(&signing_bytes).to_vec()),
            payload,
        };
        self.processor.process_block(&block)?;
        Ok(block)
    }
}
