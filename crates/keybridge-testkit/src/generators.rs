//! Proptest generators for property-based testing.

use proptest::prelude::*;

use keybridge_core::{
    AnnotationMap, KeyEntry, KeysetHandle, KeyStatus, OutputPrefix,
};
use keybridge_toolkit::type_ids;

/// Generate a key status.
pub fn key_status() -> impl Strategy<Value = KeyStatus> {
    prop_oneof![
        Just(KeyStatus::Enabled),
        Just(KeyStatus::Disabled),
        Just(KeyStatus::Destroyed),
    ]
}

/// Generate an output prefix kind.
pub fn output_prefix() -> impl Strategy<Value = OutputPrefix> {
    prop_oneof![Just(OutputPrefix::Prefixed), Just(OutputPrefix::Raw)]
}

/// Generate a key type id from the recognized set.
pub fn type_id() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(type_ids::AES_GCM.to_string()),
        Just(type_ids::XCHACHA20_POLY1305.to_string()),
        Just(type_ids::AES_GCM_HKDF_STREAMING.to_string()),
        Just(type_ids::ED25519_SIGN.to_string()),
        Just(type_ids::ED25519_VERIFY.to_string()),
        Just(type_ids::HKDF_SHA256_DERIVE.to_string()),
    ]
}

/// Generate opaque key material. Codecs must pass any bytes through.
pub fn material(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a structurally valid keyset handle.
///
/// Entries get distinct ids, the first entry is the enabled primary, and
/// material is arbitrary bytes (the codecs never inspect it).
pub fn keyset_handle(max_keys: usize) -> impl Strategy<Value = KeysetHandle> {
    let entry = (key_status(), output_prefix(), type_id(), material(64));
    prop::collection::vec(entry, 1..=max_keys.max(1)).prop_map(|entries| {
        let entries: Vec<KeyEntry> = entries
            .into_iter()
            .enumerate()
            .map(|(i, (status, prefix, type_id, material))| KeyEntry {
                id: i as u32 + 1,
                // The primary must be enabled.
                status: if i == 0 { KeyStatus::Enabled } else { status },
                prefix,
                type_id,
                material,
            })
            .collect();
        KeysetHandle::new(1, entries).expect("generated keyset is structurally valid")
    })
}

/// Generate an annotation map with lowercase keys and values.
pub fn annotation_map() -> impl Strategy<Value = AnnotationMap> {
    prop::collection::btree_map("[a-z][a-z-]{0,15}", "[a-z0-9-]{0,15}", 0..4)
        .prop_map(|m| m.into_iter().collect())
}

/// Generate a segment size suitable for streaming tests.
pub fn segment_size() -> impl Strategy<Value = u32> {
    prop_oneof![Just(1u32), 2u32..=64, Just(4096u32)]
}
