//! Authenticated encryption (the "sealing" capability).
//!
//! A [`KeysetSealer`] seals with the keyset's primary key and opens with
//! whichever enabled key matches. Keys with the `Prefixed` output kind tag
//! their ciphertexts with a 5-byte prefix (`0x01 || key_id`), so opening can
//! route directly; `Raw` keys are tried blindly.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use rand::RngCore;

use keybridge_core::{KeysetHandle, OutputPrefix};

use crate::error::{Result, ToolkitError};
use crate::type_ids;

/// Leading byte of a key-id output prefix.
pub const PREFIX_LEAD: u8 = 0x01;
/// Total length of a key-id output prefix.
pub const PREFIX_LEN: usize = 5;

/// Build the output prefix for a key id.
pub fn output_prefix(key_id: u32) -> [u8; PREFIX_LEN] {
    let id = key_id.to_be_bytes();
    [PREFIX_LEAD, id[0], id[1], id[2], id[3]]
}

/// Authenticated encryption with associated data.
pub trait Sealer {
    /// Encrypt and authenticate, binding `aad`.
    fn seal(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt and verify. The same `aad` must be supplied.
    fn open(&self, ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>>;
}

/// A single AEAD key, nonce prepended to each ciphertext.
enum RawAead {
    Aes128Gcm(Aes128Gcm),
    Aes256Gcm(Aes256Gcm),
    XChaCha20Poly1305(XChaCha20Poly1305),
}

impl RawAead {
    fn from_entry(type_id: &str, material: &[u8]) -> Result<Self> {
        match type_id {
            type_ids::AES_GCM => match material.len() {
                16 => Ok(RawAead::Aes128Gcm(
                    Aes128Gcm::new_from_slice(material)
                        .map_err(|e| ToolkitError::InvalidKeyMaterial(e.to_string()))?,
                )),
                32 => Ok(RawAead::Aes256Gcm(
                    Aes256Gcm::new_from_slice(material)
                        .map_err(|e| ToolkitError::InvalidKeyMaterial(e.to_string()))?,
                )),
                n => Err(ToolkitError::InvalidKeyMaterial(format!(
                    "AES-GCM key must be 16 or 32 bytes, got {}",
                    n
                ))),
            },
            type_ids::XCHACHA20_POLY1305 => XChaCha20Poly1305::new_from_slice(material)
                .map(RawAead::XChaCha20Poly1305)
                .map_err(|e| ToolkitError::InvalidKeyMaterial(e.to_string())),
            other => Err(ToolkitError::UnsupportedKeyType {
                type_id: other.to_string(),
                capability: "sealing".into(),
            }),
        }
    }

    fn nonce_len(&self) -> usize {
        match self {
            RawAead::Aes128Gcm(_) | RawAead::Aes256Gcm(_) => 12,
            RawAead::XChaCha20Poly1305(_) => 24,
        }
    }

    fn seal(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = vec![0u8; self.nonce_len()];
        rand::thread_rng().fill_bytes(&mut nonce);
        let payload = Payload {
            msg: plaintext,
            aad,
        };
        let ct = match self {
            RawAead::Aes128Gcm(c) => c.encrypt(aes_gcm::Nonce::from_slice(&nonce), payload),
            RawAead::Aes256Gcm(c) => c.encrypt(aes_gcm::Nonce::from_slice(&nonce), payload),
            RawAead::XChaCha20Poly1305(c) => c.encrypt(XNonce::from_slice(&nonce), payload),
        }
        .map_err(|_| ToolkitError::Crypto("encryption failed".into()))?;

        let mut out = nonce;
        out.extend_from_slice(&ct);
        Ok(out)
    }

    fn open(&self, ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let nonce_len = self.nonce_len();
        if ciphertext.len() < nonce_len {
            return Err(ToolkitError::Authentication);
        }
        let (nonce, ct) = ciphertext.split_at(nonce_len);
        let payload = Payload { msg: ct, aad };
        match self {
            RawAead::Aes128Gcm(c) => c.decrypt(aes_gcm::Nonce::from_slice(nonce), payload),
            RawAead::Aes256Gcm(c) => c.decrypt(aes_gcm::Nonce::from_slice(nonce), payload),
            RawAead::XChaCha20Poly1305(c) => c.decrypt(XNonce::from_slice(nonce), payload),
        }
        .map_err(|_| ToolkitError::Authentication)
    }
}

/// Sealing primitive backed by a whole keyset.
pub struct KeysetSealer {
    primary_prefix: Vec<u8>,
    primary: RawAead,
    prefixed: Vec<(Vec<u8>, RawAead)>,
    raw: Vec<RawAead>,
}

impl KeysetSealer {
    /// Build from a handle. Every enabled entry must be an AEAD key.
    pub fn from_handle(handle: &KeysetHandle) -> Result<Self> {
        let mut prefixed = Vec::new();
        let mut raw = Vec::new();

        for entry in handle.entries() {
            if entry.status != keybridge_core::KeyStatus::Enabled {
                continue;
            }
            let aead = RawAead::from_entry(&entry.type_id, &entry.material)?;
            match entry.prefix {
                OutputPrefix::Prefixed => prefixed.push((output_prefix(entry.id).to_vec(), aead)),
                OutputPrefix::Raw => raw.push(aead),
            }
        }

        let primary_entry = handle.primary();
        let primary = RawAead::from_entry(&primary_entry.type_id, &primary_entry.material)?;
        let primary_prefix = match primary_entry.prefix {
            OutputPrefix::Prefixed => output_prefix(primary_entry.id).to_vec(),
            OutputPrefix::Raw => Vec::new(),
        };

        Ok(Self {
            primary_prefix,
            primary,
            prefixed,
            raw,
        })
    }
}

impl Sealer for KeysetSealer {
    fn seal(&self, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let ct = self.primary.seal(plaintext, aad)?;
        let mut out = self.primary_prefix.clone();
        out.extend_from_slice(&ct);
        Ok(out)
    }

    fn open(&self, ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() > PREFIX_LEN && ciphertext[0] == PREFIX_LEAD {
            let (prefix, body) = ciphertext.split_at(PREFIX_LEN);
            for (key_prefix, aead) in &self.prefixed {
                if key_prefix == prefix {
                    if let Ok(pt) = aead.open(body, aad) {
                        return Ok(pt);
                    }
                }
            }
        }
        // Raw keys see the whole ciphertext.
        for aead in &self.raw {
            if let Ok(pt) = aead.open(ciphertext, aad) {
                return Ok(pt);
            }
        }
        Err(ToolkitError::Authentication)
    }
}
