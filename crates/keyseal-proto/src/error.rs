//! Protocol error types.

use thiserror::Error;

/// Errors produced while encoding or decoding protocol payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload could not be serialized to CBOR.
    #[error("failed to encode payload: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),

    /// Payload bytes could not be deserialized.
    #[error("failed to decode payload: {0}")]
    Decode(#[from] ciborium::de::Error<std::io::Error>),
}

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
