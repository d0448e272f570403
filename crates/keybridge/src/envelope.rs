//! Envelope encryption of keysets.
//!
//! A keyset is wrapped by sealing its canonical binary encoding under the
//! master keyset's sealing primitive, then embedding the sealed bytes in an
//! envelope record encoded per the target wire format:
//!
//! - Binary: `version:u8  ciphertext_len:u32  ciphertext`
//! - Structured: JSON `{"encryptedKeyset": "<hex>"}`
//!
//! Absent and explicitly-empty associated data are distinct: the sealed AD
//! carries a one-byte presence tag (`0x00` for absent, `0x01 || ad` when
//! present), so unwrapping with the wrong variant fails authentication.

use keybridge_core::binary::{ByteReader, ByteWriter};
use keybridge_core::{decode, encode, PrimitiveCapability, WireFormat};
use keybridge_toolkit::{KeysetSealer, Primitive, Sealer};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};
use crate::resolver::{self, AnnotatedKeyset};

/// Envelope record version.
pub const ENVELOPE_VERSION: u8 = 1;

/// One wrap request: what to wrap, under what, into which format.
#[derive(Debug, Clone)]
pub struct EnvelopeRequest {
    /// Binary-format keyset bytes to wrap.
    pub keyset: Vec<u8>,
    /// Binary-format master keyset bytes.
    pub master_keyset: Vec<u8>,
    /// Wire format of the produced envelope record.
    pub format: WireFormat,
    /// Associated data bound into the seal. `None` and `Some(vec![])` are
    /// different values and produce incompatible envelopes.
    pub associated_data: Option<Vec<u8>>,
}

#[derive(Serialize, Deserialize)]
struct StructuredEnvelope {
    #[serde(rename = "encryptedKeyset")]
    encrypted_keyset: String,
}

fn master_sealer(master_keyset: &[u8]) -> Result<KeysetSealer> {
    let annotated = AnnotatedKeyset::unannotated(master_keyset);
    match resolver::resolve(&annotated, PrimitiveCapability::Sealing) {
        Ok(Primitive::Sealing(sealer)) => Ok(sealer),
        Ok(_) => Err(GatewayError::MasterKey(
            "master keyset resolved to a non-sealing primitive".into(),
        )),
        Err(e) => Err(GatewayError::MasterKey(e.to_string())),
    }
}

fn effective_ad(ad: Option<&[u8]>) -> Vec<u8> {
    match ad {
        None => vec![0x00],
        Some(bytes) => {
            let mut tagged = Vec::with_capacity(1 + bytes.len());
            tagged.push(0x01);
            tagged.extend_from_slice(bytes);
            tagged
        }
    }
}

fn encode_record(ciphertext: &[u8], format: WireFormat) -> Result<Vec<u8>> {
    match format {
        WireFormat::Binary => {
            let mut w = ByteWriter::new();
            w.put_u8(ENVELOPE_VERSION);
            w.put_u32(ciphertext.len() as u32);
            w.put_bytes(ciphertext);
            Ok(w.into_bytes())
        }
        WireFormat::Structured => {
            let record = StructuredEnvelope {
                encrypted_keyset: hex::encode(ciphertext),
            };
            serde_json::to_vec(&record)
                .map_err(|e| GatewayError::Codec(keybridge_core::CodecError::Encoding(e.to_string())))
        }
    }
}

fn decode_record(encrypted: &[u8], format: WireFormat) -> Result<Vec<u8>> {
    let malformed =
        |msg: String| GatewayError::Codec(keybridge_core::CodecError::Malformed(msg));
    match format {
        WireFormat::Binary => {
            let mut r = ByteReader::new(encrypted);
            let version = r.read_u8()?;
            if version != ENVELOPE_VERSION {
                return Err(malformed(format!("unsupported envelope version {}", version)));
            }
            let len = r.read_u32()? as usize;
            let ciphertext = r.read_bytes(len)?.to_vec();
            r.expect_end()?;
            Ok(ciphertext)
        }
        WireFormat::Structured => {
            let record: StructuredEnvelope = serde_json::from_slice(encrypted)
                .map_err(|e| malformed(format!("envelope record: {}", e)))?;
            hex::decode(&record.encrypted_keyset)
                .map_err(|e| malformed(format!("envelope ciphertext hex: {}", e)))
        }
    }
}

/// Wrap a keyset under a master keyset.
pub fn wrap(request: &EnvelopeRequest) -> Result<Vec<u8>> {
    let sealer = master_sealer(&request.master_keyset)?;

    // Decode-then-reencode validates the inner keyset and canonicalizes the
    // sealed bytes.
    let handle = decode(&request.keyset, WireFormat::Binary)?;
    let canonical = encode(&handle, WireFormat::Binary)?;

    let ad = effective_ad(request.associated_data.as_deref());
    let ciphertext = sealer
        .seal(&canonical, &ad)
        .map_err(|e| GatewayError::MasterKey(e.to_string()))?;

    encode_record(&ciphertext, request.format)
}

/// Unwrap an envelope back to canonical binary keyset bytes.
pub fn unwrap(
    encrypted: &[u8],
    master_keyset: &[u8],
    format: WireFormat,
    associated_data: Option<&[u8]>,
) -> Result<Vec<u8>> {
    let sealer = master_sealer(master_keyset)?;
    let ciphertext = decode_record(encrypted, format)?;

    let ad = effective_ad(associated_data);
    let plaintext = sealer
        .open(&ciphertext, &ad)
        .map_err(|_| GatewayError::EnvelopeAuthentication)?;

    // The recovered bytes must decode as a keyset; canonical re-encode makes
    // unwrap(wrap(k)) byte-identical to k.
    let handle = decode(&plaintext, WireFormat::Binary)?;
    Ok(encode(&handle, WireFormat::Binary)?)
}
