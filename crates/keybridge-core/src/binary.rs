//! The binary keyset container format.
//!
//! A compact, length-prefixed encoding. All integers are big-endian and all
//! lengths are explicit, so encoding is deterministic: decode followed by
//! encode reproduces the input byte-for-byte. Layout:
//!
//! ```text
//! version:u8  primary_id:u32  entry_count:u32
//! repeated entry_count times:
//!   id:u32  status:u8  prefix:u8  type_id_len:u16  type_id  material_len:u32  material
//! ```
//!
//! Decoding fails on truncation, version mismatch, unknown enum bytes, or
//! trailing bytes. No partial recovery is attempted.

use crate::error::CodecError;
use crate::keyset::{KeyEntry, KeysetHandle, KeyStatus, OutputPrefix};

/// Container format version.
pub const BINARY_VERSION: u8 = 1;

/// Cursor over an input buffer with bounds-checked reads.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Wrap a buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    /// Read a big-endian u16.
    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read a big-endian u32.
    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < len {
            return Err(CodecError::Malformed(format!(
                "truncated input: need {} bytes at offset {}, have {}",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Fail unless the entire buffer was consumed.
    pub fn expect_end(&self) -> Result<(), CodecError> {
        if self.remaining() != 0 {
            return Err(CodecError::Malformed(format!(
                "{} trailing bytes after keyset",
                self.remaining()
            )));
        }
        Ok(())
    }
}

/// Append-only writer for the binary layout.
#[derive(Default)]
pub struct ByteWriter(Vec<u8>);

impl ByteWriter {
    /// Start an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single byte.
    pub fn put_u8(&mut self, value: u8) {
        self.0.push(value);
    }

    /// Append a big-endian u16.
    pub fn put_u16(&mut self, value: u16) {
        self.0.extend_from_slice(&value.to_be_bytes());
    }

    /// Append a big-endian u32.
    pub fn put_u32(&mut self, value: u32) {
        self.0.extend_from_slice(&value.to_be_bytes());
    }

    /// Append raw bytes.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }

    /// Take the encoded buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Encode a handle to the binary container format.
pub fn encode_keyset(handle: &KeysetHandle) -> Result<Vec<u8>, CodecError> {
    let mut w = ByteWriter::new();
    w.put_u8(BINARY_VERSION);
    w.put_u32(handle.primary_id());
    w.put_u32(handle.len() as u32);

    for entry in handle.entries() {
        if entry.type_id.len() > u16::MAX as usize {
            return Err(CodecError::Encoding(format!(
                "type id too long: {} bytes",
                entry.type_id.len()
            )));
        }
        if entry.material.len() > u32::MAX as usize {
            return Err(CodecError::Encoding("key material too long".into()));
        }
        w.put_u32(entry.id);
        w.put_u8(entry.status.to_u8());
        w.put_u8(entry.prefix.to_u8());
        w.put_u16(entry.type_id.len() as u16);
        w.put_bytes(entry.type_id.as_bytes());
        w.put_u32(entry.material.len() as u32);
        w.put_bytes(&entry.material);
    }

    Ok(w.into_bytes())
}

/// Decode a handle from the binary container format.
pub fn decode_keyset(bytes: &[u8]) -> Result<KeysetHandle, CodecError> {
    let mut r = ByteReader::new(bytes);

    let version = r.read_u8()?;
    if version != BINARY_VERSION {
        return Err(CodecError::Malformed(format!(
            "unsupported container version {}",
            version
        )));
    }

    let primary_id = r.read_u32()?;
    let count = r.read_u32()? as usize;

    let mut entries = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let id = r.read_u32()?;

        let status_byte = r.read_u8()?;
        let status = KeyStatus::from_u8(status_byte).ok_or_else(|| {
            CodecError::Malformed(format!("unknown key status byte {}", status_byte))
        })?;

        let prefix_byte = r.read_u8()?;
        let prefix = OutputPrefix::from_u8(prefix_byte).ok_or_else(|| {
            CodecError::Malformed(format!("unknown output prefix byte {}", prefix_byte))
        })?;

        let type_id_len = r.read_u16()? as usize;
        let type_id = std::str::from_utf8(r.read_bytes(type_id_len)?)
            .map_err(|_| CodecError::Malformed("type id is not valid UTF-8".into()))?
            .to_string();

        let material_len = r.read_u32()? as usize;
        let material = r.read_bytes(material_len)?.to_vec();

        entries.push(KeyEntry {
            id,
            status,
            prefix,
            type_id,
            material,
        });
    }

    r.expect_end()?;
    KeysetHandle::new(primary_id, entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_handle() -> KeysetHandle {
        KeysetHandle::new(
            42,
            vec![
                KeyEntry {
                    id: 42,
                    status: KeyStatus::Enabled,
                    prefix: OutputPrefix::Prefixed,
                    type_id: "keybridge/aes-gcm".into(),
                    material: vec![0xab; 16],
                },
                KeyEntry {
                    id: 7,
                    status: KeyStatus::Disabled,
                    prefix: OutputPrefix::Raw,
                    type_id: "keybridge/xchacha20-poly1305".into(),
                    material: vec![0xcd; 32],
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_binary_roundtrip_identity() {
        let handle = sample_handle();
        let bytes = encode_keyset(&handle).unwrap();
        let decoded = decode_keyset(&bytes).unwrap();
        assert_eq!(decoded, handle);

        // Re-encoding is byte-identical.
        let bytes2 = encode_keyset(&decoded).unwrap();
        assert_eq!(bytes, bytes2);
    }

    #[test]
    fn test_decode_single_byte_is_malformed() {
        let result = decode_keyset(&[0x80]);
        assert!(matches!(result, Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_decode_empty_is_malformed() {
        assert!(matches!(decode_keyset(&[]), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_decode_truncated_is_malformed() {
        let bytes = encode_keyset(&sample_handle()).unwrap();
        for cut in [1, bytes.len() / 2, bytes.len() - 1] {
            let result = decode_keyset(&bytes[..cut]);
            assert!(
                matches!(result, Err(CodecError::Malformed(_))),
                "cut at {} should be malformed",
                cut
            );
        }
    }

    #[test]
    fn test_decode_trailing_bytes_is_malformed() {
        let mut bytes = encode_keyset(&sample_handle()).unwrap();
        bytes.push(0x00);
        assert!(matches!(
            decode_keyset(&bytes),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_bad_version_is_malformed() {
        let mut bytes = encode_keyset(&sample_handle()).unwrap();
        bytes[0] = 9;
        assert!(matches!(
            decode_keyset(&bytes),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_bad_status_byte_is_malformed() {
        let mut bytes = encode_keyset(&sample_handle()).unwrap();
        // First entry's status byte sits after version(1) + primary(4) +
        // count(4) + id(4).
        bytes[13] = 0xff;
        assert!(matches!(
            decode_keyset(&bytes),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_decode_preserves_entry_order() {
        let handle = sample_handle();
        let decoded = decode_keyset(&encode_keyset(&handle).unwrap()).unwrap();
        let ids: Vec<u32> = decoded.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![42, 7]);
    }

    #[test]
    fn test_decode_does_not_inspect_material() {
        // Arbitrary material bytes pass through untouched; semantic
        // validation belongs to the toolkit.
        let handle = KeysetHandle::new(
            1,
            vec![KeyEntry {
                id: 1,
                status: KeyStatus::Enabled,
                prefix: OutputPrefix::Raw,
                type_id: "keybridge/aes-gcm".into(),
                material: vec![0x80, 0x00, 0xff],
            }],
        )
        .unwrap();
        let decoded = decode_keyset(&encode_keyset(&handle).unwrap()).unwrap();
        assert_eq!(decoded.entries()[0].material, vec![0x80, 0x00, 0xff]);
    }
}
