//! Opaque identifiers for users, groups and resources.
//!
//! Identifiers are 16-byte values. They are opaque to this crate: user ids
//! come from the identity layer, group ids are derived from the group's
//! initial public key, resource ids are chosen by the encryption layer.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! impl_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub [u8; 16]);

        impl $name {
            /// Byte length of the identifier.
            pub const LEN: usize = 16;

            /// View the identifier as raw bytes.
            pub fn as_bytes(&self) -> &[u8; 16] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl From<[u8; 16]> for $name {
            fn from(bytes: [u8; 16]) -> Self {
                Self(bytes)
            }
        }
    };
}

impl_id!(
    /// Stable identifier of a user across all of their devices.
    UserId
);
impl_id!(
    /// Identifier of a group, derived from its initial public key.
    GroupId
);
impl_id!(
    /// Identifier of an encrypted resource.
    ResourceId
);
