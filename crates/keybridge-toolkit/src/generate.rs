//! Keyset generation from templates, and public-keyset extraction.

use ed25519_dalek::SigningKey;
use rand::RngCore;

use keybridge_core::{KeyEntry, KeyStatus, KeysetHandle};

use crate::error::{Result, ToolkitError};
use crate::template::TemplateDescriptor;
use crate::type_ids;

/// Generate a fresh single-key keyset from a template.
///
/// The new key is enabled, is the primary, and gets a random non-zero id.
pub fn generate_keyset(template: &TemplateDescriptor) -> Result<KeysetHandle> {
    let mut rng = rand::thread_rng();
    let id = loop {
        let candidate = rng.next_u32();
        if candidate != 0 {
            break candidate;
        }
    };

    let material = match template.type_id.as_str() {
        type_ids::AES_GCM_HKDF_STREAMING => {
            // Packed layout: key || segment_size.
            let segment_size = template.segment_size.ok_or_else(|| {
                ToolkitError::InvalidTemplate("streaming template missing segment size".into())
            })?;
            let mut material = vec![0u8; template.key_size as usize];
            rng.fill_bytes(&mut material);
            material.extend_from_slice(&segment_size.to_be_bytes());
            material
        }
        _ => {
            let mut material = vec![0u8; template.key_size as usize];
            rng.fill_bytes(&mut material);
            material
        }
    };

    let entry = KeyEntry {
        id,
        status: KeyStatus::Enabled,
        prefix: template.prefix,
        type_id: template.type_id.clone(),
        material,
    };
    KeysetHandle::new(id, vec![entry]).map_err(|e| ToolkitError::Crypto(e.to_string()))
}

/// Extract the public keyset from a private signing keyset.
///
/// Every `ed25519-sign` entry maps to its `ed25519-verify` counterpart; ids,
/// statuses, prefixes, and the primary designation are preserved. Any entry
/// of another type fails the whole extraction.
pub fn public_keyset(handle: &KeysetHandle) -> Result<KeysetHandle> {
    let mut public = Vec::with_capacity(handle.len());
    for entry in handle.entries() {
        if entry.type_id != type_ids::ED25519_SIGN {
            return Err(ToolkitError::UnsupportedKeyType {
                type_id: entry.type_id.clone(),
                capability: "public-keyset extraction".into(),
            });
        }
        let seed: [u8; 32] = entry.material.as_slice().try_into().map_err(|_| {
            ToolkitError::InvalidKeyMaterial(format!(
                "ed25519 seed must be 32 bytes, got {}",
                entry.material.len()
            ))
        })?;
        let verifying = SigningKey::from_bytes(&seed).verifying_key();
        public.push(KeyEntry {
            id: entry.id,
            status: entry.status,
            prefix: entry.prefix,
            type_id: type_ids::ED25519_VERIFY.into(),
            material: verifying.to_bytes().to_vec(),
        });
    }
    KeysetHandle::new(handle.primary_id(), public)
        .map_err(|e| ToolkitError::Crypto(e.to_string()))
}
