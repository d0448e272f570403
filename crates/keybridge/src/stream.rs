//! Whole-payload adapter over the chunked stream protocol.
//!
//! The gateway's streaming operations take a complete payload and return a
//! complete result, but the toolkit primitive only speaks the buffer-lending
//! protocol. This module drives that protocol: it copies the payload into
//! lent chunks (backing up any unused tail so the primitive never sees
//! uninitialized bytes), always closes the encrypt session before reporting
//! success, and drains decrypted chunks until the end-of-stream status.

use keybridge_core::PrimitiveCapability;
use keybridge_toolkit::{Primitive, SegmentedStreamer, StreamError, StreamingSealer};

use crate::error::{GatewayError, Result};
use crate::resolver::{self, AnnotatedKeyset};

fn resolve_streamer(annotated: &AnnotatedKeyset) -> Result<SegmentedStreamer> {
    match resolver::resolve(annotated, PrimitiveCapability::StreamingSealing)? {
        Primitive::StreamingSealing(streamer) => Ok(streamer),
        _ => Err(GatewayError::Resolve(
            "keyset resolved to a non-streaming primitive".into(),
        )),
    }
}

/// Encrypt a whole payload through a streaming session.
pub fn encrypt_stream(
    annotated: &AnnotatedKeyset,
    associated_data: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let streamer = resolve_streamer(annotated)?;
    let mut session = streamer.new_encrypting_stream(associated_data)?;

    let mut pos = 0;
    while pos < plaintext.len() {
        let (copied, unused) = {
            let chunk = session.next_chunk()?;
            let n = chunk.len().min(plaintext.len() - pos);
            chunk[..n].copy_from_slice(&plaintext[pos..pos + n]);
            (n, chunk.len() - n)
        };
        pos += copied;
        if unused > 0 {
            session.back_up(unused);
        }
    }

    // A close failure overrides loop success.
    Ok(session.close()?)
}

/// Decrypt a whole payload through a streaming session.
pub fn decrypt_stream(
    annotated: &AnnotatedKeyset,
    associated_data: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    let streamer = resolve_streamer(annotated)?;
    let mut session = streamer.new_decrypting_stream(ciphertext.to_vec(), associated_data)?;

    let mut plaintext = Vec::new();
    loop {
        match session.next_chunk() {
            Ok(chunk) => plaintext.extend_from_slice(chunk),
            Err(StreamError::RangeExhausted) => return Ok(plaintext),
            Err(e) => return Err(e.into()),
        }
    }
}
