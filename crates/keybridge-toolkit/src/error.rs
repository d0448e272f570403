//! Error types for the Keybridge toolkit.

use thiserror::Error;

/// Convenience alias for toolkit results.
pub type Result<T> = std::result::Result<T, ToolkitError>;

/// Failures while materializing or using a primitive.
#[derive(Debug, Error)]
pub enum ToolkitError {
    /// The key type cannot provide the requested capability.
    #[error("key type {type_id} does not support capability {capability}")]
    UnsupportedKeyType {
        type_id: String,
        capability: String,
    },

    /// The key material does not parse as a valid key for its declared type.
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// The annotation policy forbids access to this keyset's material.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// A template descriptor could not be parsed or is inconsistent.
    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    /// Decryption failed: wrong key, wrong associated data, or tampering.
    #[error("decryption failed")]
    Authentication,

    /// Any other cryptographic failure.
    #[error("crypto failure: {0}")]
    Crypto(String),
}

/// Status codes for the chunked stream protocol.
///
/// `RangeExhausted` is not a failure: it is the distinguished end-of-stream
/// signal a decrypting stream returns once all segments have been yielded.
#[derive(Debug, Error)]
pub enum StreamError {
    /// End of stream. The only status a consumer should not treat as fatal.
    #[error("range exhausted")]
    RangeExhausted,

    /// A segment failed authentication (wrong key/AD, truncation, reorder).
    #[error("stream authentication failed")]
    Authentication,

    /// The stream protocol was violated (bad header, impossible lengths).
    #[error("stream protocol error: {0}")]
    Protocol(String),
}
