//! Key templates.
//!
//! A [`TemplateDescriptor`] names a key type and its generation parameters.
//! Descriptors travel as bytes (CBOR via `ciborium`) between the registry,
//! the gateway, and callers; [`TemplateDescriptor::from_bytes`] is the only
//! way bytes become a descriptor, so an unparsable template is rejected in
//! one place.

use keybridge_core::OutputPrefix;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolkitError};
use crate::type_ids;

/// Generation parameters for one key type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDescriptor {
    /// Key type id the template generates, e.g. `keybridge/aes-gcm`.
    pub type_id: String,
    /// Key material size in bytes.
    pub key_size: u32,
    /// Segment size for streaming keys; `None` for everything else.
    pub segment_size: Option<u32>,
    /// Output prefix kind for the generated key.
    pub prefix: OutputPrefix,
}

impl TemplateDescriptor {
    /// Serialize to descriptor bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        ciborium::into_writer(self, &mut out)
            .map_err(|e| ToolkitError::InvalidTemplate(e.to_string()))?;
        Ok(out)
    }

    /// Parse descriptor bytes, then validate the parameters.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let descriptor: TemplateDescriptor = ciborium::from_reader(bytes)
            .map_err(|e| ToolkitError::InvalidTemplate(e.to_string()))?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    fn validate(&self) -> Result<()> {
        let key_size_ok = match self.type_id.as_str() {
            type_ids::AES_GCM => matches!(self.key_size, 16 | 32),
            type_ids::XCHACHA20_POLY1305 => self.key_size == 32,
            type_ids::AES_GCM_HKDF_STREAMING => matches!(self.key_size, 16 | 32),
            type_ids::ED25519_SIGN => self.key_size == 32,
            type_ids::HKDF_SHA256_DERIVE => self.key_size >= 16,
            other => {
                return Err(ToolkitError::InvalidTemplate(format!(
                    "unknown key type {}",
                    other
                )))
            }
        };
        if !key_size_ok {
            return Err(ToolkitError::InvalidTemplate(format!(
                "key size {} invalid for {}",
                self.key_size, self.type_id
            )));
        }
        match (self.type_id.as_str(), self.segment_size) {
            (type_ids::AES_GCM_HKDF_STREAMING, Some(s)) if s > 0 => Ok(()),
            (type_ids::AES_GCM_HKDF_STREAMING, _) => Err(ToolkitError::InvalidTemplate(
                "streaming template needs a positive segment size".into(),
            )),
            (_, None) => Ok(()),
            (_, Some(_)) => Err(ToolkitError::InvalidTemplate(format!(
                "{} takes no segment size",
                self.type_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_roundtrip() {
        let descriptor = TemplateDescriptor {
            type_id: type_ids::AES_GCM.into(),
            key_size: 32,
            segment_size: None,
            prefix: OutputPrefix::Prefixed,
        };
        let bytes = descriptor.to_bytes().unwrap();
        assert_eq!(TemplateDescriptor::from_bytes(&bytes).unwrap(), descriptor);
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(matches!(
            TemplateDescriptor::from_bytes(b"bad template"),
            Err(ToolkitError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let descriptor = TemplateDescriptor {
            type_id: "keybridge/unknown".into(),
            key_size: 32,
            segment_size: None,
            prefix: OutputPrefix::Raw,
        };
        let bytes = descriptor.to_bytes().unwrap();
        assert!(TemplateDescriptor::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_streaming_requires_segment_size() {
        let mut descriptor = TemplateDescriptor {
            type_id: type_ids::AES_GCM_HKDF_STREAMING.into(),
            key_size: 16,
            segment_size: None,
            prefix: OutputPrefix::Raw,
        };
        let bytes = descriptor.to_bytes().unwrap();
        assert!(TemplateDescriptor::from_bytes(&bytes).is_err());

        descriptor.segment_size = Some(4096);
        let bytes = descriptor.to_bytes().unwrap();
        assert!(TemplateDescriptor::from_bytes(&bytes).is_ok());
    }

    #[test]
    fn test_segment_size_on_non_streaming_rejected() {
        let descriptor = TemplateDescriptor {
            type_id: type_ids::ED25519_SIGN.into(),
            key_size: 32,
            segment_size: Some(64),
            prefix: OutputPrefix::Prefixed,
        };
        let bytes = descriptor.to_bytes().unwrap();
        assert!(TemplateDescriptor::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_bad_key_size_rejected() {
        let descriptor = TemplateDescriptor {
            type_id: type_ids::AES_GCM.into(),
            key_size: 24,
            segment_size: None,
            prefix: OutputPrefix::Prefixed,
        };
        let bytes = descriptor.to_bytes().unwrap();
        assert!(TemplateDescriptor::from_bytes(&bytes).is_err());
    }
}
