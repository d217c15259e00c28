//! User directory: user id to device key mapping.
//!
//! Updated only by block processing. Device addition is append-only; there
//! is no removal. Replaying the exact same device creation is a no-op so
//! block re-processing stays idempotent.

use std::collections::HashMap;

use keyseal_proto::{DeviceCreation, PublicEncryptionKey, PublicSignatureKey, UserId};

use crate::error::{Error, Result};

/// One device of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Device {
    /// Key the device authors blocks with.
    pub signature_key: PublicSignatureKey,
    /// Key secrets are wrapped under for this device.
    pub encryption_key: PublicEncryptionKey,
}

/// Maps user identifiers to their current device keys.
#[derive(Debug, Default)]
pub struct UserDirectory {
    devices: HashMap<UserId, Vec<Device>>,
    owner_by_signature_key: HashMap<PublicSignatureKey, UserId>,
}

impl UserDirectory {
    /// Apply a device creation block payload.
    ///
    /// Exact replays are accepted silently. A signature key that already
    /// belongs to another user, or a key reuse with different material, is
    /// rejected.
    pub fn apply_device_creation(&mut self, creation: &DeviceCreation) -> Result<()> {
        let device = Device {
            signature_key: creation.signature_key,
            encryption_key: creation.encryption_key,
        };

        if let Some(owner) = self.owner_by_signature_key.get(&device.signature_key) {
            if *owner != creation.user_id {
                return Err(Error::InvalidArgument(
                    "device signature key already registered to another user".into(),
                ));
            }
            let known = self.devices.get(owner).is_some_and(|devices| devices.contains(&device));
            if known {
                // Replay of an already-applied block.
                return Ok(());
            }
            return Err(Error::InvalidArgument(
                "device signature key reused with different key material".into(),
            ));
        }

        self.devices.entry(creation.user_id).or_default().push(device);
        self.owner_by_signature_key.insert(device.signature_key, creation.user_id);
        Ok(())
    }

    /// The user's devices, in registration order.
    pub fn device_keys(&self, user_id: &UserId) -> Result<&[Device]> {
        self.devices
            .get(user_id)
            .map(Vec::as_slice)
            .ok_or(Error::UnknownUser(*user_id))
    }

    /// Whether the user has at least one device.
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.devices.contains_key(user_id)
    }

    /// The user owning a device signature key, if known.
    pub fn owner_of(&self, signature_key: &PublicSignatureKey) -> Option<UserId> {
        self.owner_by_signature_key.get(signature_key).copied()
    }
}
