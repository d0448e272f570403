//! Wire-format selection and codec dispatch.
//!
//! The format set is closed: `Binary` and `Structured`. Dispatch is a plain
//! match, not a registry. Raw integer selectors exist for the service layer,
//! which must reject unknown selector values before any decoding happens.

use crate::error::CodecError;
use crate::keyset::KeysetHandle;
use crate::{binary, structured};

/// One of the two keyset serialization formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// Compact length-prefixed container.
    Binary,
    /// Human-readable JSON.
    Structured,
}

impl WireFormat {
    /// Selector value for [`WireFormat::Binary`] in request messages.
    pub const BINARY_SELECTOR: i32 = 1;
    /// Selector value for [`WireFormat::Structured`] in request messages.
    pub const STRUCTURED_SELECTOR: i32 = 2;

    /// Map a raw request selector to a format. Zero is the conventional
    /// "unset" value and is not a valid format.
    pub const fn from_selector(selector: i32) -> Option<Self> {
        match selector {
            Self::BINARY_SELECTOR => Some(WireFormat::Binary),
            Self::STRUCTURED_SELECTOR => Some(WireFormat::Structured),
            _ => None,
        }
    }

    /// The raw selector for this format.
    pub const fn selector(self) -> i32 {
        match self {
            WireFormat::Binary => Self::BINARY_SELECTOR,
            WireFormat::Structured => Self::STRUCTURED_SELECTOR,
        }
    }
}

/// Decode a serialized keyset in the given format.
pub fn decode(bytes: &[u8], format: WireFormat) -> Result<KeysetHandle, CodecError> {
    match format {
        WireFormat::Binary => binary::decode_keyset(bytes),
        WireFormat::Structured => structured::decode_keyset(bytes),
    }
}

/// Encode a handle in the given format.
pub fn encode(handle: &KeysetHandle, format: WireFormat) -> Result<Vec<u8>, CodecError> {
    match format {
        WireFormat::Binary => binary::encode_keyset(handle),
        WireFormat::Structured => structured::encode_keyset(handle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyset::{KeyEntry, KeyStatus, OutputPrefix};

    fn handle() -> KeysetHandle {
        KeysetHandle::new(
            5,
            vec![KeyEntry {
                id: 5,
                status: KeyStatus::Enabled,
                prefix: OutputPrefix::Prefixed,
                type_id: "keybridge/aes-gcm".into(),
                material: vec![9; 16],
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_selector_roundtrip() {
        for format in [WireFormat::Binary, WireFormat::Structured] {
            assert_eq!(WireFormat::from_selector(format.selector()), Some(format));
        }
        assert_eq!(WireFormat::from_selector(0), None);
        assert_eq!(WireFormat::from_selector(3), None);
        assert_eq!(WireFormat::from_selector(-1), None);
    }

    #[test]
    fn test_dispatch_both_formats() {
        let handle = handle();
        for format in [WireFormat::Binary, WireFormat::Structured] {
            let bytes = encode(&handle, format).unwrap();
            let decoded = decode(&bytes, format).unwrap();
            assert_eq!(decoded, handle);
        }
    }

    #[test]
    fn test_formats_are_not_interchangeable() {
        let handle = handle();
        let binary_bytes = encode(&handle, WireFormat::Binary).unwrap();
        assert!(decode(&binary_bytes, WireFormat::Structured).is_err());

        let structured_bytes = encode(&handle, WireFormat::Structured).unwrap();
        assert!(decode(&structured_bytes, WireFormat::Binary).is_err());
    }
}
