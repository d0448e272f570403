//! # Keybridge Toolkit
//!
//! The cryptographic collaborator behind the Keybridge gateway. The gateway
//! treats keysets as opaque bytes; this crate turns decoded handles into
//! working primitives through the [`materialize`] contract and implements
//! each capability:
//!
//! - **Sealing** - AEAD with key-id output-prefix routing ([`KeysetSealer`])
//! - **Streaming sealing** - segmented AEAD over the chunked stream protocol
//!   ([`SegmentedStreamer`])
//! - **Signing** - Ed25519 with the same prefix routing ([`KeysetSigner`])
//! - **Keyset derivation** - HKDF-SHA256 keyset expansion
//!   ([`HkdfKeysetDeriver`])
//!
//! Keyset generation from [`TemplateDescriptor`]s and public-keyset
//! extraction live here too, since both need to understand key material.

pub mod derive;
pub mod error;
pub mod generate;
pub mod materialize;
pub mod sealing;
pub mod signing;
pub mod streaming;
pub mod template;

pub use derive::{HkdfKeysetDeriver, KeysetDeriver};
pub use error::{StreamError, ToolkitError};
pub use generate::{generate_keyset, public_keyset};
pub use materialize::{
    check_access, materialize, materialize_deriver, materialize_sealer, materialize_signer,
    materialize_streaming, Primitive, ACCESS_LEVEL_ANNOTATION, PUBLIC_ONLY,
};
pub use sealing::{KeysetSealer, Sealer};
pub use signing::{KeysetSigner, Signing};
pub use streaming::{DecryptingStream, EncryptingStream, SegmentedStreamer, StreamingSealer};
pub use template::TemplateDescriptor;

/// Key type identifiers understood by the toolkit.
pub mod type_ids {
    /// AES-GCM AEAD key (16 or 32 bytes).
    pub const AES_GCM: &str = "keybridge/aes-gcm";
    /// XChaCha20-Poly1305 AEAD key (32 bytes).
    pub const XCHACHA20_POLY1305: &str = "keybridge/xchacha20-poly1305";
    /// Segmented streaming AEAD key (`key || segment_size:u32`).
    pub const AES_GCM_HKDF_STREAMING: &str = "keybridge/aes-gcm-hkdf-streaming";
    /// Ed25519 private signing key (32-byte seed).
    pub const ED25519_SIGN: &str = "keybridge/ed25519-sign";
    /// Ed25519 public verification key (32 bytes).
    pub const ED25519_VERIFY: &str = "keybridge/ed25519-verify";
    /// HKDF-SHA256 keyset-derivation key.
    pub const HKDF_SHA256_DERIVE: &str = "keybridge/hkdf-sha256-derive";
}
