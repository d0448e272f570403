//! The per-operation service layer.
//!
//! Each conformance operation maps to one function. Responses follow a
//! strict shape: either a success payload or a non-empty error string, never
//! both, never neither. Cryptographic and input-validation failures always
//! take the error-string channel; the only transport-level failure is an
//! unrecognized wire-format selector in a wrap/unwrap request, which is a
//! malformed request rather than a failed operation.
//!
//! Failures are logged at this boundary and nowhere deeper, so each failed
//! request produces exactly one log line.

use keybridge_core::{decode, encode, PrimitiveCapability, WireFormat};
use keybridge_toolkit::{self as toolkit, KeysetDeriver, Primitive, TemplateDescriptor};
use tracing::warn;

use crate::envelope::{self, EnvelopeRequest};
use crate::error::{GatewayError, RequestFault};
use crate::registry;
use crate::resolver::{self, AnnotatedKeyset};
use crate::stream;

/// Per-operation response: a payload or a non-empty error string.
pub type OpResponse<T> = Result<T, String>;

/// An envelope wrap request as it arrives off the wire.
#[derive(Debug, Clone)]
pub struct WrapRequest {
    /// Binary-format keyset bytes to wrap.
    pub keyset: Vec<u8>,
    /// Binary-format master keyset bytes.
    pub master_keyset: Vec<u8>,
    /// Raw wire-format selector for the produced envelope.
    pub format_selector: i32,
    /// Optional associated data.
    pub associated_data: Option<Vec<u8>>,
}

/// An envelope unwrap request as it arrives off the wire.
#[derive(Debug, Clone)]
pub struct UnwrapRequest {
    /// Envelope bytes produced by a wrap.
    pub encrypted_keyset: Vec<u8>,
    /// Binary-format master keyset bytes.
    pub master_keyset: Vec<u8>,
    /// Raw wire-format selector the envelope was encoded with.
    pub format_selector: i32,
    /// Optional associated data; must match the wrap exactly.
    pub associated_data: Option<Vec<u8>>,
}

/// A streaming encrypt/decrypt request.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Annotated binary-format keyset bytes.
    pub annotated: AnnotatedKeyset,
    /// Associated data bound to the whole stream.
    pub associated_data: Vec<u8>,
    /// Payload: plaintext for encrypt, ciphertext for decrypt.
    pub payload: Vec<u8>,
}

fn fail<T>(operation: &str, error: GatewayError) -> OpResponse<T> {
    warn!(operation, error = %error, "operation failed");
    Err(error.to_string())
}

/// Materialize the primitive for `capability`, confirming the keyset and
/// annotations can back it.
pub fn resolve_primitive(
    annotated: &AnnotatedKeyset,
    capability: PrimitiveCapability,
) -> OpResponse<Primitive> {
    resolver::resolve(annotated, capability)
        .or_else(|e| fail("resolve_primitive", e))
}

/// Re-encode binary keyset bytes in the structured format.
pub fn keyset_to_structured(keyset: &[u8]) -> OpResponse<Vec<u8>> {
    let result = decode(keyset, WireFormat::Binary)
        .and_then(|handle| encode(&handle, WireFormat::Structured));
    result.or_else(|e| fail("keyset_to_structured", e.into()))
}

/// Re-encode structured keyset bytes in the binary format.
pub fn keyset_from_structured(keyset: &[u8]) -> OpResponse<Vec<u8>> {
    let result = decode(keyset, WireFormat::Structured)
        .and_then(|handle| encode(&handle, WireFormat::Binary));
    result.or_else(|e| fail("keyset_from_structured", e.into()))
}

/// Generate a fresh keyset from serialized template bytes.
pub fn generate_keyset(template_bytes: &[u8]) -> OpResponse<Vec<u8>> {
    let result = TemplateDescriptor::from_bytes(template_bytes)
        .and_then(|template| toolkit::generate_keyset(&template))
        .map_err(|e| GatewayError::Resolve(e.to_string()))
        .and_then(|handle| Ok(encode(&handle, WireFormat::Binary)?));
    result.or_else(|e| fail("generate_keyset", e))
}

/// Extract the public keyset from a private signing keyset.
pub fn public_keyset(private_keyset: &[u8]) -> OpResponse<Vec<u8>> {
    let result = decode(private_keyset, WireFormat::Binary)
        .map_err(GatewayError::from)
        .and_then(|handle| {
            toolkit::public_keyset(&handle).map_err(|e| GatewayError::Resolve(e.to_string()))
        })
        .and_then(|public| Ok(encode(&public, WireFormat::Binary)?));
    result.or_else(|e| fail("public_keyset", e))
}

fn format_from_selector(selector: i32) -> Result<WireFormat, RequestFault> {
    WireFormat::from_selector(selector).ok_or_else(|| {
        warn!(selector, "unrecognized wire-format selector");
        RequestFault::new(format!("unrecognized wire-format selector {}", selector))
    })
}

/// Wrap a keyset in an encrypted envelope.
///
/// An unrecognized format selector is a [`RequestFault`]; every other
/// failure is an in-band error string.
pub fn wrap_keyset(request: &WrapRequest) -> Result<OpResponse<Vec<u8>>, RequestFault> {
    let format = format_from_selector(request.format_selector)?;
    let result = envelope::wrap(&EnvelopeRequest {
        keyset: request.keyset.clone(),
        master_keyset: request.master_keyset.clone(),
        format,
        associated_data: request.associated_data.clone(),
    });
    Ok(result.or_else(|e| fail("wrap_keyset", e)))
}

/// Unwrap an encrypted envelope back to keyset bytes.
pub fn unwrap_keyset(request: &UnwrapRequest) -> Result<OpResponse<Vec<u8>>, RequestFault> {
    let format = format_from_selector(request.format_selector)?;
    let result = envelope::unwrap(
        &request.encrypted_keyset,
        &request.master_keyset,
        format,
        request.associated_data.as_deref(),
    );
    Ok(result.or_else(|e| fail("unwrap_keyset", e)))
}

/// Encrypt a payload with the streaming primitive.
pub fn stream_encrypt(request: &StreamRequest) -> OpResponse<Vec<u8>> {
    stream::encrypt_stream(&request.annotated, &request.associated_data, &request.payload)
        .or_else(|e| fail("stream_encrypt", e))
}

/// Decrypt a payload with the streaming primitive.
pub fn stream_decrypt(request: &StreamRequest) -> OpResponse<Vec<u8>> {
    stream::decrypt_stream(&request.annotated, &request.associated_data, &request.payload)
        .or_else(|e| fail("stream_decrypt", e))
}

/// Serialized template bytes for a registered template name.
pub fn template_descriptor(name: &str) -> OpResponse<Vec<u8>> {
    let result = registry::lookup(name).and_then(|descriptor| {
        descriptor
            .to_bytes()
            .map_err(|e| GatewayError::Resolve(e.to_string()))
    });
    result.or_else(|e| fail("template_descriptor", e))
}

/// Derive a keyset from a salt using the keyset-derivation primitive.
pub fn derive_keyset(annotated: &AnnotatedKeyset, salt: &[u8]) -> OpResponse<Vec<u8>> {
    let result = resolver::resolve(annotated, PrimitiveCapability::KeysetDerivation)
        .and_then(|primitive| match primitive {
            Primitive::KeysetDerivation(deriver) => deriver
                .derive(salt)
                .map_err(|e| GatewayError::Resolve(e.to_string())),
            _ => Err(GatewayError::Resolve(
                "keyset resolved to a non-derivation primitive".into(),
            )),
        })
        .and_then(|derived| Ok(encode(&derived, WireFormat::Binary)?));
    result.or_else(|e| fail("derive_keyset", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keybridge_core::{KeyEntry, KeysetHandle, KeyStatus, OutputPrefix};
    use keybridge_toolkit::type_ids;

    fn binary_keyset(type_id: &str, material: Vec<u8>) -> Vec<u8> {
        let handle = KeysetHandle::new(
            1,
            vec![KeyEntry {
                id: 1,
                status: KeyStatus::Enabled,
                prefix: OutputPrefix::Prefixed,
                type_id: type_id.into(),
                material,
            }],
        )
        .unwrap();
        encode(&handle, WireFormat::Binary).unwrap()
    }

    #[test]
    fn test_structured_conversion_roundtrip() {
        let keyset = binary_keyset(type_ids::AES_GCM, vec![0x11; 16]);
        let structured = keyset_to_structured(&keyset).unwrap();
        let back = keyset_from_structured(&structured).unwrap();
        assert_eq!(back, keyset);
    }

    #[test]
    fn test_error_strings_are_non_empty() {
        let err = keyset_to_structured(&[0x80]).unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn test_generate_from_registry_template() {
        let template_bytes = template_descriptor("AES256_GCM").unwrap();
        let keyset = generate_keyset(&template_bytes).unwrap();
        let handle = decode(&keyset, WireFormat::Binary).unwrap();
        assert_eq!(handle.primary().material.len(), 32);
    }

    #[test]
    fn test_generate_bad_template_is_error_string() {
        assert!(generate_keyset(b"bad template").is_err());
    }

    #[test]
    fn test_unknown_selector_is_request_fault() {
        let request = WrapRequest {
            keyset: binary_keyset(type_ids::AES_GCM, vec![0x11; 16]),
            master_keyset: binary_keyset(type_ids::AES_GCM, vec![0x22; 16]),
            format_selector: 99,
            associated_data: None,
        };
        assert!(wrap_keyset(&request).is_err());
    }

    #[test]
    fn test_wrap_bad_master_is_error_string_not_fault() {
        let request = WrapRequest {
            keyset: binary_keyset(type_ids::AES_GCM, vec![0x11; 16]),
            master_keyset: vec![0x80],
            format_selector: WireFormat::Binary.selector(),
            associated_data: None,
        };
        let response = wrap_keyset(&request).unwrap();
        assert!(response.is_err());
    }

    #[test]
    fn test_derivation_is_deterministic_and_salt_sensitive() {
        let annotated = AnnotatedKeyset::unannotated(binary_keyset(
            type_ids::HKDF_SHA256_DERIVE,
            vec![0x33; 32],
        ));
        let a = derive_keyset(&annotated, b"salt").unwrap();
        let b = derive_keyset(&annotated, b"salt").unwrap();
        let c = derive_keyset(&annotated, b"other").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_resolve_unsupported_capability_is_error_string() {
        let annotated =
            AnnotatedKeyset::unannotated(binary_keyset(type_ids::AES_GCM, vec![0x11; 16]));
        assert!(resolve_primitive(&annotated, PrimitiveCapability::Signing).is_err());
    }
}
