//! Deterministic keyset fixtures.
//!
//! Every fixture is built from fixed byte patterns, so tests that compare
//! serialized forms across runs see the same bytes each time. Randomized
//! inputs belong in [`crate::generators`].

use keybridge::AnnotatedKeyset;
use keybridge_core::{encode, KeyEntry, KeysetHandle, KeyStatus, OutputPrefix, WireFormat};
use keybridge_toolkit::type_ids;

/// A single-key AES-256-GCM sealing keyset.
pub fn sealing_handle(seed: u8) -> KeysetHandle {
    single_key(type_ids::AES_GCM, vec![seed; 32])
}

/// A single-key XChaCha20-Poly1305 sealing keyset.
pub fn xchacha_handle(seed: u8) -> KeysetHandle {
    single_key(type_ids::XCHACHA20_POLY1305, vec![seed; 32])
}

/// A single-key Ed25519 signing keyset.
pub fn signing_handle(seed: u8) -> KeysetHandle {
    single_key(type_ids::ED25519_SIGN, vec![seed; 32])
}

/// A single-key streaming keyset with the given segment size.
pub fn streaming_handle(seed: u8, segment_size: u32) -> KeysetHandle {
    let mut material = vec![seed; 16];
    material.extend_from_slice(&segment_size.to_be_bytes());
    single_key(type_ids::AES_GCM_HKDF_STREAMING, material)
}

/// A single-key HKDF derivation keyset.
pub fn derivation_handle(seed: u8) -> KeysetHandle {
    single_key(type_ids::HKDF_SHA256_DERIVE, vec![seed; 32])
}

/// A rotated keyset: enabled primary plus a disabled predecessor.
pub fn rotated_sealing_handle() -> KeysetHandle {
    KeysetHandle::new(
        2,
        vec![
            KeyEntry {
                id: 2,
                status: KeyStatus::Enabled,
                prefix: OutputPrefix::Prefixed,
                type_id: type_ids::AES_GCM.into(),
                material: vec![0xB2; 32],
            },
            KeyEntry {
                id: 1,
                status: KeyStatus::Disabled,
                prefix: OutputPrefix::Prefixed,
                type_id: type_ids::AES_GCM.into(),
                material: vec![0xB1; 32],
            },
        ],
    )
    .expect("fixture keyset is valid")
}

/// Binary-format bytes for a handle.
pub fn binary_bytes(handle: &KeysetHandle) -> Vec<u8> {
    encode(handle, WireFormat::Binary).expect("fixture keyset encodes")
}

/// An unannotated [`AnnotatedKeyset`] over a handle's binary bytes.
pub fn annotated(handle: &KeysetHandle) -> AnnotatedKeyset {
    AnnotatedKeyset::unannotated(binary_bytes(handle))
}

fn single_key(type_id: &str, material: Vec<u8>) -> KeysetHandle {
    KeysetHandle::new(
        1,
        vec![KeyEntry {
            id: 1,
            status: KeyStatus::Enabled,
            prefix: OutputPrefix::Prefixed,
            type_id: type_id.into(),
            material,
        }],
    )
    .expect("fixture keyset is valid")
}
