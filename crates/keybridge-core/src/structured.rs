//! The structured (JSON) keyset format.
//!
//! Human-readable twin of the binary container. Key order in the `key`
//! array matches handle insertion order, so `binary -> structured -> binary`
//! is lossless. Key material is hex-encoded.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::keyset::{KeyEntry, KeysetHandle, KeyStatus, OutputPrefix};

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructuredKeyset {
    #[serde(rename = "primaryKeyId")]
    primary_key_id: u32,
    key: Vec<StructuredKey>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructuredKey {
    #[serde(rename = "keyId")]
    key_id: u32,
    status: String,
    #[serde(rename = "outputPrefix")]
    output_prefix: String,
    #[serde(rename = "typeId")]
    type_id: String,
    material: String,
}

/// Encode a handle to the structured format.
pub fn encode_keyset(handle: &KeysetHandle) -> Result<Vec<u8>, CodecError> {
    let keyset = StructuredKeyset {
        primary_key_id: handle.primary_id(),
        key: handle
            .entries()
            .iter()
            .map(|entry| StructuredKey {
                key_id: entry.id,
                status: entry.status.as_str().to_string(),
                output_prefix: entry.prefix.as_str().to_string(),
                type_id: entry.type_id.clone(),
                material: hex::encode(&entry.material),
            })
            .collect(),
    };

    serde_json::to_vec(&keyset).map_err(|e| CodecError::Encoding(e.to_string()))
}

/// Decode a handle from the structured format.
pub fn decode_keyset(bytes: &[u8]) -> Result<KeysetHandle, CodecError> {
    let keyset: StructuredKeyset =
        serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;

    let mut entries = Vec::with_capacity(keyset.key.len());
    for key in keyset.key {
        let status = KeyStatus::parse(&key.status).ok_or_else(|| {
            CodecError::Malformed(format!("unknown key status {:?}", key.status))
        })?;
        let prefix = OutputPrefix::parse(&key.output_prefix).ok_or_else(|| {
            CodecError::Malformed(format!("unknown output prefix {:?}", key.output_prefix))
        })?;
        let material = hex::decode(&key.material)
            .map_err(|e| CodecError::Malformed(format!("bad key material hex: {}", e)))?;

        entries.push(KeyEntry {
            id: key.key_id,
            status,
            prefix,
            type_id: key.type_id,
            material,
        });
    }

    KeysetHandle::new(keyset.primary_key_id, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary;

    fn sample_handle() -> KeysetHandle {
        KeysetHandle::new(
            100,
            vec![
                KeyEntry {
                    id: 100,
                    status: KeyStatus::Enabled,
                    prefix: OutputPrefix::Raw,
                    type_id: "keybridge/aes-gcm".into(),
                    material: vec![1, 2, 3, 4],
                },
                KeyEntry {
                    id: 200,
                    status: KeyStatus::Destroyed,
                    prefix: OutputPrefix::Prefixed,
                    type_id: "keybridge/ed25519-sign".into(),
                    material: vec![],
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_structured_roundtrip() {
        let handle = sample_handle();
        let bytes = encode_keyset(&handle).unwrap();
        let decoded = decode_keyset(&bytes).unwrap();
        assert_eq!(decoded, handle);
    }

    #[test]
    fn test_structured_roundtrip_matches_binary() {
        // binary -> structured -> binary is the identity on the binary bytes.
        let handle = sample_handle();
        let binary_bytes = binary::encode_keyset(&handle).unwrap();

        let structured = encode_keyset(&handle).unwrap();
        let reparsed = decode_keyset(&structured).unwrap();
        let binary_again = binary::encode_keyset(&reparsed).unwrap();

        assert_eq!(binary_bytes, binary_again);
    }

    #[test]
    fn test_decode_rejects_bad_syntax() {
        assert!(matches!(
            decode_keyset(b"not json at all"),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_fields() {
        let json = br#"{"primaryKeyId": 1, "key": [], "extra": true}"#;
        assert!(matches!(
            decode_keyset(json),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        let json = br#"{"key": []}"#;
        assert!(matches!(
            decode_keyset(json),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_status() {
        let json = br#"{"primaryKeyId": 1, "key": [{"keyId": 1, "status": "ACTIVE",
            "outputPrefix": "RAW", "typeId": "keybridge/aes-gcm", "material": "00"}]}"#;
        assert!(matches!(
            decode_keyset(json),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_hex() {
        let json = br#"{"primaryKeyId": 1, "key": [{"keyId": 1, "status": "ENABLED",
            "outputPrefix": "RAW", "typeId": "keybridge/aes-gcm", "material": "zz"}]}"#;
        assert!(matches!(
            decode_keyset(json),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_key_array_order_is_insertion_order() {
        let handle = sample_handle();
        let text = String::from_utf8(encode_keyset(&handle).unwrap()).unwrap();
        let pos_100 = text.find("\"keyId\":100").unwrap();
        let pos_200 = text.find("\"keyId\":200").unwrap();
        assert!(pos_100 < pos_200);
    }
}
