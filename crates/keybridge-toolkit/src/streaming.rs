//! Chunked streaming authenticated encryption.
//!
//! The stream contract is a buffer-lending protocol: an encrypting stream
//! lends writable chunks via [`EncryptingStream::next_chunk`], the caller
//! fills some or all of each chunk and returns unused trailing capacity with
//! [`EncryptingStream::back_up`], and [`EncryptingStream::close`] finalizes
//! the stream and yields the ciphertext. A decrypting stream yields decrypted
//! chunks until it signals the distinguished [`StreamError::RangeExhausted`]
//! end-of-stream status.
//!
//! The concrete scheme is a segmented AEAD. Wire layout:
//!
//! ```text
//! salt:32  nonce_prefix:7  segment*  (each segment = segment_size + 16,
//!                                     final segment may be shorter)
//! ```
//!
//! The segment key is HKDF-SHA256(ikm = key material, salt, info = associated
//! data), so mismatched associated data fails authentication on the first
//! segment. Per-segment nonces are `nonce_prefix || index:u32 || last:u8`;
//! the last-flag byte makes truncation at a segment boundary detectable.
//!
//! Key material for `keybridge/aes-gcm-hkdf-streaming` entries packs the
//! parameters: `key (16 or 32 bytes) || segment_size:u32`.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

use keybridge_core::KeysetHandle;

use crate::error::{StreamError, ToolkitError};
use crate::type_ids;

/// Length of the header salt.
pub const SALT_LEN: usize = 32;
/// Length of the per-stream nonce prefix.
pub const NONCE_PREFIX_LEN: usize = 7;
/// AES-GCM authentication tag length.
pub const TAG_LEN: usize = 16;
/// Total stream header length.
pub const HEADER_LEN: usize = SALT_LEN + NONCE_PREFIX_LEN;

/// Push-style encrypting stream (buffer-lending).
pub trait EncryptingStream {
    /// Lend the next writable chunk. The caller may fill any prefix of it,
    /// reporting the unused tail via [`EncryptingStream::back_up`] before the
    /// next call.
    fn next_chunk(&mut self) -> Result<&mut [u8], StreamError>;

    /// Return `count` unused bytes from the tail of the most recently lent
    /// chunk. Counts beyond the lent chunk are clamped.
    fn back_up(&mut self, count: usize);

    /// Finalize the stream and return the complete ciphertext. Must be
    /// called exactly once; a close failure invalidates the whole stream.
    fn close(self: Box<Self>) -> Result<Vec<u8>, StreamError>;
}

/// Pull-style decrypting stream.
pub trait DecryptingStream {
    /// The next decrypted chunk (possibly empty), or
    /// [`StreamError::RangeExhausted`] once the stream ends.
    fn next_chunk(&mut self) -> Result<&[u8], StreamError>;
}

/// The "streaming-sealing" capability: a factory for stream sessions bound
/// to a fixed associated-data string.
pub trait StreamingSealer {
    /// Open an encrypting session. The ciphertext sink is owned by the
    /// session and handed back by `close`.
    fn new_encrypting_stream(&self, aad: &[u8]) -> Result<Box<dyn EncryptingStream>, StreamError>;

    /// Open a decrypting session over a ciphertext source.
    fn new_decrypting_stream(
        &self,
        ciphertext: Vec<u8>,
        aad: &[u8],
    ) -> Result<Box<dyn DecryptingStream>, StreamError>;
}

enum GcmCipher {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

impl GcmCipher {
    fn new(key: &[u8]) -> Result<Self, StreamError> {
        match key.len() {
            16 => Aes128Gcm::new_from_slice(key)
                .map(GcmCipher::Aes128)
                .map_err(|e| StreamError::Protocol(e.to_string())),
            32 => Aes256Gcm::new_from_slice(key)
                .map(GcmCipher::Aes256)
                .map_err(|e| StreamError::Protocol(e.to_string())),
            n => Err(StreamError::Protocol(format!(
                "derived key must be 16 or 32 bytes, got {}",
                n
            ))),
        }
    }

    fn seal(&self, nonce: &[u8; 12], plaintext: &[u8]) -> Result<Vec<u8>, StreamError> {
        let payload = Payload {
            msg: plaintext,
            aad: &[],
        };
        match self {
            GcmCipher::Aes128(c) => c.encrypt(aes_gcm::Nonce::from_slice(nonce), payload),
            GcmCipher::Aes256(c) => c.encrypt(aes_gcm::Nonce::from_slice(nonce), payload),
        }
        .map_err(|_| StreamError::Protocol("segment encryption failed".into()))
    }

    fn open(&self, nonce: &[u8; 12], ciphertext: &[u8]) -> Result<Vec<u8>, StreamError> {
        let payload = Payload {
            msg: ciphertext,
            aad: &[],
        };
        match self {
            GcmCipher::Aes128(c) => c.decrypt(aes_gcm::Nonce::from_slice(nonce), payload),
            GcmCipher::Aes256(c) => c.decrypt(aes_gcm::Nonce::from_slice(nonce), payload),
        }
        .map_err(|_| StreamError::Authentication)
    }
}

fn segment_nonce(prefix: &[u8; NONCE_PREFIX_LEN], index: u32, last: bool) -> [u8; 12] {
    let mut nonce = [0u8; 12];
    nonce[..NONCE_PREFIX_LEN].copy_from_slice(prefix);
    nonce[NONCE_PREFIX_LEN..11].copy_from_slice(&index.to_be_bytes());
    nonce[11] = last as u8;
    nonce
}

fn derive_segment_key(
    ikm: &[u8],
    salt: &[u8],
    aad: &[u8],
    key_size: usize,
) -> Result<Vec<u8>, StreamError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; key_size];
    hk.expand(aad, &mut okm)
        .map_err(|e| StreamError::Protocol(e.to_string()))?;
    Ok(okm)
}

/// Streaming sealer backed by a keyset's primary key.
pub struct SegmentedStreamer {
    ikm: Vec<u8>,
    key_size: usize,
    segment_size: usize,
}

impl SegmentedStreamer {
    /// Build from a handle. The primary entry must be a streaming key.
    pub fn from_handle(handle: &KeysetHandle) -> Result<Self, ToolkitError> {
        let primary = handle.primary();
        if primary.type_id != type_ids::AES_GCM_HKDF_STREAMING {
            return Err(ToolkitError::UnsupportedKeyType {
                type_id: primary.type_id.clone(),
                capability: "streaming-sealing".into(),
            });
        }
        Self::from_material(&primary.material)
    }

    /// Parse the packed `key || segment_size:u32` material layout.
    pub fn from_material(material: &[u8]) -> Result<Self, ToolkitError> {
        let key_size = match material.len() {
            20 => 16,
            36 => 32,
            n => {
                return Err(ToolkitError::InvalidKeyMaterial(format!(
                    "streaming key material must be 20 or 36 bytes, got {}",
                    n
                )))
            }
        };
        let (key, params) = material.split_at(key_size);
        let segment_size =
            u32::from_be_bytes([params[0], params[1], params[2], params[3]]) as usize;
        if segment_size == 0 {
            return Err(ToolkitError::InvalidKeyMaterial(
                "segment size must be positive".into(),
            ));
        }
        Ok(Self {
            ikm: key.to_vec(),
            key_size,
            segment_size,
        })
    }
}

impl StreamingSealer for SegmentedStreamer {
    fn new_encrypting_stream(&self, aad: &[u8]) -> Result<Box<dyn EncryptingStream>, StreamError> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce_prefix = [0u8; NONCE_PREFIX_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        rand::thread_rng().fill_bytes(&mut nonce_prefix);

        let key = derive_segment_key(&self.ikm, &salt, aad, self.key_size)?;
        let cipher = GcmCipher::new(&key)?;

        let mut out = Vec::with_capacity(HEADER_LEN + self.segment_size + TAG_LEN);
        out.extend_from_slice(&salt);
        out.extend_from_slice(&nonce_prefix);

        Ok(Box::new(SegmentedEncrypter {
            cipher,
            nonce_prefix,
            out,
            segment: vec![0u8; self.segment_size],
            filled: 0,
            index: 0,
        }))
    }

    fn new_decrypting_stream(
        &self,
        ciphertext: Vec<u8>,
        aad: &[u8],
    ) -> Result<Box<dyn DecryptingStream>, StreamError> {
        if ciphertext.len() < HEADER_LEN + TAG_LEN {
            return Err(StreamError::Protocol(format!(
                "ciphertext shorter than header: {} bytes",
                ciphertext.len()
            )));
        }
        let salt = &ciphertext[..SALT_LEN];
        let mut nonce_prefix = [0u8; NONCE_PREFIX_LEN];
        nonce_prefix.copy_from_slice(&ciphertext[SALT_LEN..HEADER_LEN]);

        let key = derive_segment_key(&self.ikm, salt, aad, self.key_size)?;
        let cipher = GcmCipher::new(&key)?;

        Ok(Box::new(SegmentedDecrypter {
            cipher,
            nonce_prefix,
            ciphertext,
            pos: HEADER_LEN,
            segment_ct_len: self.segment_size + TAG_LEN,
            index: 0,
            plain: Vec::new(),
            done: false,
        }))
    }
}

struct SegmentedEncrypter {
    cipher: GcmCipher,
    nonce_prefix: [u8; NONCE_PREFIX_LEN],
    out: Vec<u8>,
    segment: Vec<u8>,
    filled: usize,
    index: u32,
}

impl SegmentedEncrypter {
    fn flush_segment(&mut self, last: bool) -> Result<(), StreamError> {
        if self.index == u32::MAX {
            return Err(StreamError::Protocol("stream too long".into()));
        }
        let nonce = segment_nonce(&self.nonce_prefix, self.index, last);
        let ct = self.cipher.seal(&nonce, &self.segment[..self.filled])?;
        self.out.extend_from_slice(&ct);
        self.index += 1;
        self.filled = 0;
        Ok(())
    }
}

impl EncryptingStream for SegmentedEncrypter {
    fn next_chunk(&mut self) -> Result<&mut [u8], StreamError> {
        if self.filled == self.segment.len() {
            // Current segment is full and more data is coming, so it is
            // not the last one.
            self.flush_segment(false)?;
        }
        let start = self.filled;
        self.filled = self.segment.len();
        Ok(&mut self.segment[start..])
    }

    fn back_up(&mut self, count: usize) {
        self.filled = self.filled.saturating_sub(count);
    }

    fn close(mut self: Box<Self>) -> Result<Vec<u8>, StreamError> {
        self.flush_segment(true)?;
        Ok(self.out)
    }
}

struct SegmentedDecrypter {
    cipher: GcmCipher,
    nonce_prefix: [u8; NONCE_PREFIX_LEN],
    ciphertext: Vec<u8>,
    pos: usize,
    segment_ct_len: usize,
    index: u32,
    plain: Vec<u8>,
    done: bool,
}

impl DecryptingStream for SegmentedDecrypter {
    fn next_chunk(&mut self) -> Result<&[u8], StreamError> {
        if self.done {
            return Err(StreamError::RangeExhausted);
        }

        let remaining = self.ciphertext.len() - self.pos;
        let last = remaining <= self.segment_ct_len;
        let take = if last { remaining } else { self.segment_ct_len };
        if take < TAG_LEN {
            return Err(StreamError::Protocol("truncated segment".into()));
        }

        let nonce = segment_nonce(&self.nonce_prefix, self.index, last);
        let segment = &self.ciphertext[self.pos..self.pos + take];
        self.plain = self.cipher.open(&nonce, segment)?;

        self.pos += take;
        self.index += 1;
        if last {
            self.done = true;
        }
        Ok(&self.plain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streamer(key_size: usize, segment_size: u32) -> SegmentedStreamer {
        let mut material = vec![0x42u8; key_size];
        material.extend_from_slice(&segment_size.to_be_bytes());
        SegmentedStreamer::from_material(&material).unwrap()
    }

    fn encrypt_all(s: &SegmentedStreamer, aad: &[u8], plaintext: &[u8]) -> Vec<u8> {
        let mut enc = s.new_encrypting_stream(aad).unwrap();
        let mut pos = 0;
        while pos < plaintext.len() {
            let (copied, unused) = {
                let chunk = enc.next_chunk().unwrap();
                let n = chunk.len().min(plaintext.len() - pos);
                chunk[..n].copy_from_slice(&plaintext[pos..pos + n]);
                (n, chunk.len() - n)
            };
            pos += copied;
            if unused > 0 {
                enc.back_up(unused);
            }
        }
        enc.close().unwrap()
    }

    fn decrypt_all(s: &SegmentedStreamer, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, StreamError> {
        let mut dec = s.new_decrypting_stream(ciphertext.to_vec(), aad).unwrap();
        let mut out = Vec::new();
        loop {
            match dec.next_chunk() {
                Ok(chunk) => out.extend_from_slice(chunk),
                Err(StreamError::RangeExhausted) => return Ok(out),
                Err(e) => return Err(e),
            }
        }
    }

    #[test]
    fn test_roundtrip_lengths_against_segment_size() {
        let segment = 16u32;
        let s = streamer(16, segment);
        for len in [0usize, 1, 15, 16, 17, 31, 32, 33, 48, 100] {
            let plaintext: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let ct = encrypt_all(&s, b"ad", &plaintext);
            let pt = decrypt_all(&s, b"ad", &ct).unwrap();
            assert_eq!(pt, plaintext, "length {}", len);
        }
    }

    #[test]
    fn test_roundtrip_segment_size_one() {
        let s = streamer(32, 1);
        let plaintext = b"byte-at-a-time".to_vec();
        let ct = encrypt_all(&s, b"", &plaintext);
        assert_eq!(decrypt_all(&s, b"", &ct).unwrap(), plaintext);
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let s = streamer(16, 4096);
        let ct = encrypt_all(&s, b"ad", &[]);
        assert_eq!(ct.len(), HEADER_LEN + TAG_LEN);
        assert_eq!(decrypt_all(&s, b"ad", &ct).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_exact_multiple_of_segment() {
        let s = streamer(16, 8);
        let plaintext = vec![7u8; 24];
        let ct = encrypt_all(&s, b"", &plaintext);
        // Header + three full segments, each with its own tag.
        assert_eq!(ct.len(), HEADER_LEN + 3 * (8 + TAG_LEN));
        assert_eq!(decrypt_all(&s, b"", &ct).unwrap(), plaintext);
    }

    #[test]
    fn test_mismatched_aad_fails() {
        let s = streamer(16, 16);
        let ct = encrypt_all(&s, b"right", b"secret payload");
        assert!(matches!(
            decrypt_all(&s, b"wrong", &ct),
            Err(StreamError::Authentication)
        ));
    }

    #[test]
    fn test_truncated_stream_fails() {
        let s = streamer(16, 8);
        let ct = encrypt_all(&s, b"", &vec![1u8; 30]);
        // Drop the final segment: the new final segment carries the wrong
        // last-flag and must fail authentication.
        let truncated = &ct[..ct.len() - TAG_LEN - 6];
        assert!(decrypt_all(&s, b"", truncated).is_err());
    }

    #[test]
    fn test_tampered_segment_fails() {
        let s = streamer(16, 16);
        let mut ct = encrypt_all(&s, b"", b"hello streaming world");
        let idx = HEADER_LEN + 2;
        ct[idx] ^= 0x01;
        assert!(matches!(
            decrypt_all(&s, b"", &ct),
            Err(StreamError::Authentication)
        ));
    }

    #[test]
    fn test_backup_full_chunk() {
        // Lending a chunk and backing it all up must not advance the stream.
        let s = streamer(16, 16);
        let mut enc = s.new_encrypting_stream(b"").unwrap();
        {
            let chunk = enc.next_chunk().unwrap();
            let len = chunk.len();
            enc.back_up(len);
        }
        let ct = enc.close().unwrap();
        assert_eq!(decrypt_all(&s, b"", &ct).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_material_parsing() {
        assert!(SegmentedStreamer::from_material(&[0u8; 19]).is_err());
        assert!(SegmentedStreamer::from_material(&[0u8; 20]).is_err()); // zero segment size
        let mut ok = vec![1u8; 16];
        ok.extend_from_slice(&64u32.to_be_bytes());
        assert!(SegmentedStreamer::from_material(&ok).is_ok());
    }

    #[test]
    fn test_ciphertexts_are_salted() {
        let s = streamer(16, 16);
        let a = encrypt_all(&s, b"", b"same plaintext");
        let b = encrypt_all(&s, b"", b"same plaintext");
        assert_ne!(a, b);
    }
}
