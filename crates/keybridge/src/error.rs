//! Error types for the gateway.

use keybridge_core::CodecError;
use keybridge_toolkit::StreamError;
use thiserror::Error;

/// Errors that can occur during gateway operations.
///
/// Every variant folds into the per-operation error string at the service
/// boundary; only [`RequestFault`] escapes as a transport-level failure.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Keyset codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The toolkit refused to materialize a primitive.
    #[error("resolve error: {0}")]
    Resolve(String),

    /// The master keyset could not provide a sealing primitive.
    #[error("master key error: {0}")]
    MasterKey(String),

    /// Envelope decryption failed (wrong master key, wrong associated data,
    /// or a tampered envelope).
    #[error("envelope authentication failed")]
    EnvelopeAuthentication,

    /// Stream protocol or authentication failure.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// No template registered under the requested name.
    #[error("no template named {0}")]
    TemplateNotFound(String),
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// A malformed or unsupported request shape.
///
/// Reserved for failures the caller should see as a transport-level invalid
/// argument (an unrecognized wire-format selector), never for cryptographic
/// or input-validation failures.
#[derive(Debug, Error)]
#[error("invalid request: {message}")]
pub struct RequestFault {
    /// Human-readable description of the request defect.
    pub message: String,
}

impl RequestFault {
    /// Build a fault from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
