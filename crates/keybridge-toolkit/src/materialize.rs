//! The primitive-instantiation contract.
//!
//! [`materialize`] is the single choke point where a decoded keyset plus its
//! annotations become a usable primitive: it applies the annotation access
//! policy, checks that the primary key's type supports the requested
//! capability, and then parses key material. Everything upstream (codecs,
//! envelope, the gateway) works with opaque bytes.

use keybridge_core::{AnnotationMap, KeysetHandle, PrimitiveCapability};

use crate::derive::HkdfKeysetDeriver;
use crate::error::{Result, ToolkitError};
use crate::sealing::KeysetSealer;
use crate::signing::KeysetSigner;
use crate::streaming::SegmentedStreamer;
use crate::type_ids;

/// Annotation key for the access policy.
pub const ACCESS_LEVEL_ANNOTATION: &str = "access-level";
/// Policy value restricting materialization to public key material.
pub const PUBLIC_ONLY: &str = "public-only";

/// A materialized primitive, one variant per capability.
pub enum Primitive {
    Sealing(KeysetSealer),
    Signing(KeysetSigner),
    StreamingSealing(SegmentedStreamer),
    KeysetDerivation(HkdfKeysetDeriver),
}

fn is_secret_type(type_id: &str) -> bool {
    type_id != type_ids::ED25519_VERIFY
}

/// Enforce the annotation access policy on a handle.
///
/// The only policy-bearing annotation is `access-level: public-only`, which
/// denies access to any keyset containing secret key material. All other
/// annotations are carried verbatim and never restrict.
pub fn check_access(handle: &KeysetHandle, annotations: &AnnotationMap) -> Result<()> {
    if annotations.get(ACCESS_LEVEL_ANNOTATION) == Some(PUBLIC_ONLY) {
        if let Some(secret) = handle.entries().iter().find(|e| is_secret_type(&e.type_id)) {
            return Err(ToolkitError::AccessDenied(format!(
                "annotation {}: {} forbids secret key type {}",
                ACCESS_LEVEL_ANNOTATION, PUBLIC_ONLY, secret.type_id
            )));
        }
    }
    Ok(())
}

fn supports(type_id: &str, capability: PrimitiveCapability) -> bool {
    match capability {
        PrimitiveCapability::Sealing => {
            matches!(type_id, type_ids::AES_GCM | type_ids::XCHACHA20_POLY1305)
        }
        PrimitiveCapability::Signing => {
            matches!(type_id, type_ids::ED25519_SIGN | type_ids::ED25519_VERIFY)
        }
        PrimitiveCapability::StreamingSealing => type_id == type_ids::AES_GCM_HKDF_STREAMING,
        PrimitiveCapability::KeysetDerivation => type_id == type_ids::HKDF_SHA256_DERIVE,
    }
}

/// Materialize the primitive for `capability` from an annotated handle.
pub fn materialize(
    handle: &KeysetHandle,
    annotations: &AnnotationMap,
    capability: PrimitiveCapability,
) -> Result<Primitive> {
    check_access(handle, annotations)?;

    let primary = handle.primary();
    if !supports(&primary.type_id, capability) {
        return Err(ToolkitError::UnsupportedKeyType {
            type_id: primary.type_id.clone(),
            capability: capability.as_str().into(),
        });
    }

    match capability {
        PrimitiveCapability::Sealing => KeysetSealer::from_handle(handle).map(Primitive::Sealing),
        PrimitiveCapability::Signing => KeysetSigner::from_handle(handle).map(Primitive::Signing),
        PrimitiveCapability::StreamingSealing => {
            SegmentedStreamer::from_handle(handle).map(Primitive::StreamingSealing)
        }
        PrimitiveCapability::KeysetDerivation => {
            HkdfKeysetDeriver::from_handle(handle).map(Primitive::KeysetDerivation)
        }
    }
}

/// [`materialize`] narrowed to the sealing capability.
pub fn materialize_sealer(
    handle: &KeysetHandle,
    annotations: &AnnotationMap,
) -> Result<KeysetSealer> {
    match materialize(handle, annotations, PrimitiveCapability::Sealing)? {
        Primitive::Sealing(sealer) => Ok(sealer),
        _ => unreachable!("materialize returned a mismatched primitive"),
    }
}

/// [`materialize`] narrowed to the streaming-sealing capability.
pub fn materialize_streaming(
    handle: &KeysetHandle,
    annotations: &AnnotationMap,
) -> Result<SegmentedStreamer> {
    match materialize(handle, annotations, PrimitiveCapability::StreamingSealing)? {
        Primitive::StreamingSealing(streamer) => Ok(streamer),
        _ => unreachable!("materialize returned a mismatched primitive"),
    }
}

/// [`materialize`] narrowed to the signing capability.
pub fn materialize_signer(
    handle: &KeysetHandle,
    annotations: &AnnotationMap,
) -> Result<KeysetSigner> {
    match materialize(handle, annotations, PrimitiveCapability::Signing)? {
        Primitive::Signing(signer) => Ok(signer),
        _ => unreachable!("materialize returned a mismatched primitive"),
    }
}

/// [`materialize`] narrowed to the keyset-derivation capability.
pub fn materialize_deriver(
    handle: &KeysetHandle,
    annotations: &AnnotationMap,
) -> Result<HkdfKeysetDeriver> {
    match materialize(handle, annotations, PrimitiveCapability::KeysetDerivation)? {
        Primitive::KeysetDerivation(deriver) => Ok(deriver),
        _ => unreachable!("materialize returned a mismatched primitive"),
    }
}
