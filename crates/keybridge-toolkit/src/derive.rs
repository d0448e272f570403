//! Keyset derivation (the "keyset-derivation" capability).
//!
//! A derivation keyset holds `keybridge/hkdf-sha256-derive` entries whose
//! material is an HKDF input keying material. Deriving with a salt produces
//! a new keyset with the same shape (ids, statuses, prefixes, primary) whose
//! enabled entries carry fresh 32-byte `keybridge/aes-gcm` keys:
//!
//! ```text
//! derived = HKDF-SHA256(ikm = entry material, salt, info = DERIVE_INFO)
//! ```
//!
//! Derivation is deterministic in (source keyset, salt), so two parties
//! holding the same derivation keyset agree on the derived keys.

use hkdf::Hkdf;
use sha2::Sha256;

use keybridge_core::{KeyEntry, KeyStatus, KeysetHandle};

use crate::error::{Result, ToolkitError};
use crate::type_ids;

/// HKDF info string binding derived keys to this scheme.
pub const DERIVE_INFO: &[u8] = b"keybridge/derived-key";

/// Size of every derived key.
pub const DERIVED_KEY_LEN: usize = 32;

/// Derives whole keysets from salts.
pub trait KeysetDeriver {
    /// Produce the keyset derived under `salt`.
    fn derive(&self, salt: &[u8]) -> Result<KeysetHandle>;
}

/// HKDF-SHA256 deriver over a derivation keyset.
pub struct HkdfKeysetDeriver {
    source: KeysetHandle,
}

impl HkdfKeysetDeriver {
    /// Build from a handle. Every non-destroyed entry must be a derivation
    /// key; destroyed entries have no material and cannot be carried into
    /// the derived keyset.
    pub fn from_handle(handle: &KeysetHandle) -> Result<Self> {
        for entry in handle.entries() {
            if entry.status == KeyStatus::Destroyed {
                return Err(ToolkitError::InvalidKeyMaterial(format!(
                    "key {} is destroyed and cannot derive",
                    entry.id
                )));
            }
            if entry.type_id != type_ids::HKDF_SHA256_DERIVE {
                return Err(ToolkitError::UnsupportedKeyType {
                    type_id: entry.type_id.clone(),
                    capability: "keyset-derivation".into(),
                });
            }
            if entry.material.is_empty() {
                return Err(ToolkitError::InvalidKeyMaterial(format!(
                    "key {} has empty derivation material",
                    entry.id
                )));
            }
        }
        Ok(Self {
            source: handle.clone(),
        })
    }
}

impl KeysetDeriver for HkdfKeysetDeriver {
    fn derive(&self, salt: &[u8]) -> Result<KeysetHandle> {
        let mut derived = Vec::with_capacity(self.source.entries().len());
        for entry in self.source.entries() {
            let hk = Hkdf::<Sha256>::new(Some(salt), &entry.material);
            let mut okm = vec![0u8; DERIVED_KEY_LEN];
            hk.expand(DERIVE_INFO, &mut okm)
                .map_err(|e| ToolkitError::Crypto(e.to_string()))?;
            derived.push(KeyEntry {
                id: entry.id,
                status: entry.status,
                prefix: entry.prefix,
                type_id: type_ids::AES_GCM.into(),
                material: okm,
            });
        }
        KeysetHandle::new(self.source.primary_id(), derived)
            .map_err(|e| ToolkitError::Crypto(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keybridge_core::OutputPrefix;

    fn derive_entry(id: u32, status: KeyStatus, ikm: u8) -> KeyEntry {
        KeyEntry {
            id,
            status,
            prefix: OutputPrefix::Prefixed,
            type_id: type_ids::HKDF_SHA256_DERIVE.into(),
            material: vec![ikm; 32],
        }
    }

    fn deriver() -> HkdfKeysetDeriver {
        let handle = KeysetHandle::new(
            1,
            vec![
                derive_entry(1, KeyStatus::Enabled, 0x01),
                derive_entry(2, KeyStatus::Disabled, 0x02),
            ],
        )
        .unwrap();
        HkdfKeysetDeriver::from_handle(&handle).unwrap()
    }

    #[test]
    fn test_same_salt_is_deterministic() {
        let d = deriver();
        let a = d.derive(b"salt").unwrap();
        let b = d.derive(b"salt").unwrap();
        assert_eq!(a.entries()[0].material, b.entries()[0].material);
        assert_eq!(a.entries()[1].material, b.entries()[1].material);
    }

    #[test]
    fn test_different_salts_differ() {
        let d = deriver();
        let a = d.derive(b"salt-a").unwrap();
        let b = d.derive(b"salt-b").unwrap();
        assert_ne!(a.entries()[0].material, b.entries()[0].material);
    }

    #[test]
    fn test_shape_preserved() {
        let d = deriver();
        let derived = d.derive(b"s").unwrap();
        assert_eq!(derived.primary_id(), 1);
        assert_eq!(derived.entries().len(), 2);
        assert_eq!(derived.entries()[1].id, 2);
        assert_eq!(derived.entries()[1].status, KeyStatus::Disabled);
        for entry in derived.entries() {
            assert_eq!(entry.type_id, type_ids::AES_GCM);
            assert_eq!(entry.material.len(), DERIVED_KEY_LEN);
        }
    }

    #[test]
    fn test_destroyed_entry_rejected() {
        let handle = KeysetHandle::new(
            1,
            vec![
                derive_entry(1, KeyStatus::Enabled, 0x01),
                KeyEntry {
                    material: Vec::new(),
                    ..derive_entry(2, KeyStatus::Destroyed, 0x02)
                },
            ],
        )
        .unwrap();
        assert!(matches!(
            HkdfKeysetDeriver::from_handle(&handle),
            Err(ToolkitError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn test_non_derivation_type_rejected() {
        let handle = KeysetHandle::new(
            1,
            vec![KeyEntry {
                id: 1,
                status: KeyStatus::Enabled,
                prefix: OutputPrefix::Raw,
                type_id: type_ids::AES_GCM.into(),
                material: vec![0; 16],
            }],
        )
        .unwrap();
        assert!(matches!(
            HkdfKeysetDeriver::from_handle(&handle),
            Err(ToolkitError::UnsupportedKeyType { .. })
        ));
    }
}
