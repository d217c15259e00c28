//! Shared test harness: a trustchain root plus a block log that device
//! sessions replay from, standing in for the append-only server log.

use keyseal_core::{
    ClaimVerifier, LocalDevice, MemoryStorage, Session, Storage, VerificationProof,
};
use keyseal_crypto::{EncryptionKeyPair, SigningKeyPair};
use keyseal_proto::{
    Block, DeviceCreation, Payload, PublicEncryptionKey, PublicSignatureKey, Signature, UserId,
};

pub fn user_id(n: u8) -> UserId {
    UserId([n; 16])
}

/// The trustchain root and the ordered block log.
///
/// Sessions emit blocks locally; [`TestNet::publish`] appends them to the
/// log and [`TestNet::catch_up`] replays the log into any session that is
/// behind, mirroring how clients pull new blocks from the server.
pub struct TestNet {
    root: SigningKeyPair,
    log: Vec<Block>,
}

impl TestNet {
    pub fn new() -> Self {
        Self { root: SigningKeyPair::generate(), log: Vec::new() }
    }

    pub fn root_key(&self) -> PublicSignatureKey {
        PublicSignatureKey(self.root.public_bytes())
    }

    /// Register a user with one device via a root-signed device creation
    /// block, returning the device's key material.
    pub fn register_user(&mut self, n: u8) -> LocalDevice {
        let device = LocalDevice {
            user_id: user_id(n),
            signing: SigningKeyPair::generate(),
            encryption: EncryptionKeyPair::generate(),
        };
        let payload = Payload::DeviceCreation(DeviceCreation {
            user_id: device.user_id,
            signature_key: PublicSignatureKey(device.signing.public_bytes()),
            encryption_key: PublicEncryptionKey(device.encryption.public_bytes()),
        });
        let bytes = payload.signing_bytes().unwrap();
        self.log.push(Block {
            index: self.log.len() as u64 + 1,
            author: self.root_key(),
            signature: Signature(self.root.sign(&bytes).to_vec()),
            payload,
        });
        device
    }

    /// Open a session for a device, replayed up to the current log head.
    pub fn session(&self, device: &LocalDevice) -> Session<MemoryStorage> {
        let mut session =
            Session::open(MemoryStorage::new(), self.root_key(), device.clone()).unwrap();
        self.catch_up(&mut session);
        session
    }

    /// Append locally emitted blocks to the log.
    pub fn publish(&mut self, blocks: impl IntoIterator<Item = Block>) {
        self.log.extend(blocks);
    }

    /// Replay every log block the session has not seen yet.
    pub fn catch_up<S: Storage>(&self, session: &mut Session<S>) {
        for block in &self.log {
            if block.index > session.processor().last_block_index() {
                session.process_block(block).unwrap();
            }
        }
    }
}

/// Verifier that accepts a single known code for any email.
pub struct CodeVerifier {
    pub code: String,
}

impl ClaimVerifier for CodeVerifier {
    fn verify(&self, _email: &str, proof: &VerificationProof) -> bool {
        proof.0 == self.code
    }
}
