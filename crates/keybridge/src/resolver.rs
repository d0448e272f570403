//! Primitive resolution.
//!
//! The single decode-plus-materialize choke point: serialized keyset bytes
//! plus annotations plus a capability tag become a working primitive here,
//! and nowhere else. The envelope codec and the streaming adapter both go
//! through [`resolve`] rather than decoding keysets themselves.

use keybridge_core::{decode, AnnotationMap, KeysetHandle, PrimitiveCapability, WireFormat};
use keybridge_toolkit::{materialize, Primitive};

use crate::error::{GatewayError, Result};

/// Serialized keyset bytes with the annotations that travel alongside them.
#[derive(Debug, Clone, Default)]
pub struct AnnotatedKeyset {
    /// Binary-format keyset bytes.
    pub keyset: Vec<u8>,
    /// Access annotations. Empty means unrestricted.
    pub annotations: AnnotationMap,
}

impl AnnotatedKeyset {
    /// Wrap keyset bytes with no annotations.
    pub fn unannotated(keyset: impl Into<Vec<u8>>) -> Self {
        Self {
            keyset: keyset.into(),
            annotations: AnnotationMap::new(),
        }
    }
}

/// Decode an annotated keyset (binary format only).
pub fn decode_annotated(annotated: &AnnotatedKeyset) -> Result<KeysetHandle> {
    Ok(decode(&annotated.keyset, WireFormat::Binary)?)
}

/// Resolve the primitive for `capability` from serialized keyset bytes.
///
/// Codec errors surface verbatim; any toolkit refusal (capability mismatch,
/// invalid material, annotation denial) becomes [`GatewayError::Resolve`]
/// carrying the toolkit's message. Resolution is never retried and never
/// partially satisfied.
pub fn resolve(annotated: &AnnotatedKeyset, capability: PrimitiveCapability) -> Result<Primitive> {
    let handle = decode_annotated(annotated)?;
    materialize(&handle, &annotated.annotations, capability)
        .map_err(|e| GatewayError::Resolve(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keybridge_core::encode;
    use keybridge_core::{KeyEntry, KeyStatus, OutputPrefix};
    use keybridge_toolkit::type_ids;

    fn aead_keyset_bytes() -> Vec<u8> {
        let handle = KeysetHandle::new(
            1,
            vec![KeyEntry {
                id: 1,
                status: KeyStatus::Enabled,
                prefix: OutputPrefix::Prefixed,
                type_id: type_ids::AES_GCM.into(),
                material: vec![0x11; 32],
            }],
        )
        .unwrap();
        encode(&handle, WireFormat::Binary).unwrap()
    }

    #[test]
    fn test_resolve_sealing() {
        let annotated = AnnotatedKeyset::unannotated(aead_keyset_bytes());
        let primitive = resolve(&annotated, PrimitiveCapability::Sealing).unwrap();
        assert!(matches!(primitive, Primitive::Sealing(_)));
    }

    #[test]
    fn test_capability_mismatch_is_resolve_error() {
        let annotated = AnnotatedKeyset::unannotated(aead_keyset_bytes());
        assert!(matches!(
            resolve(&annotated, PrimitiveCapability::Signing),
            Err(GatewayError::Resolve(_))
        ));
    }

    #[test]
    fn test_malformed_bytes_are_codec_error() {
        let annotated = AnnotatedKeyset::unannotated(vec![0x80]);
        assert!(matches!(
            resolve(&annotated, PrimitiveCapability::Sealing),
            Err(GatewayError::Codec(_))
        ));
    }

    #[test]
    fn test_annotation_denial_is_resolve_error() {
        let mut annotated = AnnotatedKeyset::unannotated(aead_keyset_bytes());
        annotated
            .annotations
            .insert(keybridge_toolkit::ACCESS_LEVEL_ANNOTATION, keybridge_toolkit::PUBLIC_ONLY);
        assert!(matches!(
            resolve(&annotated, PrimitiveCapability::Sealing),
            Err(GatewayError::Resolve(_))
        ));
    }
}
