//! Error types for the Keybridge core.

use thiserror::Error;

/// Errors raised while decoding or encoding keysets.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input bytes cannot be decoded in the requested format.
    #[error("malformed keyset: {0}")]
    Malformed(String),

    /// The decoded fields violate a keyset invariant.
    #[error("invalid keyset: {0}")]
    InvalidKeyset(String),

    /// The keyset could not be serialized.
    #[error("keyset encoding failed: {0}")]
    Encoding(String),
}
