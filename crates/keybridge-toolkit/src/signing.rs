//! Digital signatures (the "signing" capability).
//!
//! Signing uses the keyset's primary key; verification routes on the same
//! 5-byte output prefix the sealing primitive uses. Ed25519 is the only
//! supported scheme. A `keybridge/ed25519-sign` entry holds the 32-byte
//! seed; the matching `keybridge/ed25519-verify` entry holds the 32-byte
//! public key.

use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};

use keybridge_core::{KeyStatus, KeysetHandle, OutputPrefix};

use crate::error::{Result, ToolkitError};
use crate::sealing::{output_prefix, PREFIX_LEAD, PREFIX_LEN};
use crate::type_ids;

/// Signature length for Ed25519.
pub const SIGNATURE_LEN: usize = 64;

/// Produces and checks signatures over byte strings.
pub trait Signing {
    /// Sign `data` with the primary key.
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Verify `signature` over `data` against any enabled key.
    fn verify(&self, signature: &[u8], data: &[u8]) -> Result<()>;
}

enum SignerKey {
    Private(SigningKey),
    Public(VerifyingKey),
}

impl SignerKey {
    fn from_entry(type_id: &str, material: &[u8]) -> Result<Self> {
        match type_id {
            type_ids::ED25519_SIGN => {
                let seed: [u8; 32] = material.try_into().map_err(|_| {
                    ToolkitError::InvalidKeyMaterial(format!(
                        "ed25519 seed must be 32 bytes, got {}",
                        material.len()
                    ))
                })?;
                Ok(SignerKey::Private(SigningKey::from_bytes(&seed)))
            }
            type_ids::ED25519_VERIFY => {
                let bytes: [u8; 32] = material.try_into().map_err(|_| {
                    ToolkitError::InvalidKeyMaterial(format!(
                        "ed25519 public key must be 32 bytes, got {}",
                        material.len()
                    ))
                })?;
                VerifyingKey::from_bytes(&bytes)
                    .map(SignerKey::Public)
                    .map_err(|e| ToolkitError::InvalidKeyMaterial(e.to_string()))
            }
            other => Err(ToolkitError::UnsupportedKeyType {
                type_id: other.to_string(),
                capability: "signing".into(),
            }),
        }
    }

    fn verifying_key(&self) -> VerifyingKey {
        match self {
            SignerKey::Private(sk) => sk.verifying_key(),
            SignerKey::Public(vk) => *vk,
        }
    }
}

/// Signing primitive backed by a whole keyset.
///
/// Built from a private keyset it can sign and verify; built from a public
/// keyset it can only verify, and `sign` reports the capability mismatch.
pub struct KeysetSigner {
    primary_prefix: Vec<u8>,
    primary: SignerKey,
    prefixed: Vec<(Vec<u8>, VerifyingKey)>,
    raw: Vec<VerifyingKey>,
}

impl KeysetSigner {
    /// Build from a handle. Every enabled entry must be an Ed25519 key.
    pub fn from_handle(handle: &KeysetHandle) -> Result<Self> {
        let mut prefixed = Vec::new();
        let mut raw = Vec::new();

        for entry in handle.entries() {
            if entry.status != KeyStatus::Enabled {
                continue;
            }
            let key = SignerKey::from_entry(&entry.type_id, &entry.material)?;
            match entry.prefix {
                OutputPrefix::Prefixed => {
                    prefixed.push((output_prefix(entry.id).to_vec(), key.verifying_key()))
                }
                OutputPrefix::Raw => raw.push(key.verifying_key()),
            }
        }

        let primary_entry = handle.primary();
        let primary = SignerKey::from_entry(&primary_entry.type_id, &primary_entry.material)?;
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

impl Signing for KeysetSigner {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let sk = match &self.primary {
            SignerKey::Private(sk) => sk,
            SignerKey::Public(_) => {
                return Err(ToolkitError::UnsupportedKeyType {
                    type_id: type_ids::ED25519_VERIFY.into(),
                    capability: "signing".into(),
                })
            }
        };
        let sig = sk.sign(data);
        let mut out = self.primary_prefix.clone();
        out.extend_from_slice(&sig.to_bytes());
        Ok(out)
    }

    fn verify(&self, signature: &[u8], data: &[u8]) -> Result<()> {
        if signature.len() > PREFIX_LEN && signature[0] == PREFIX_LEAD {
            let (prefix, body) = signature.split_at(PREFIX_LEN);
            if let Ok(sig) = Signature::from_slice(body) {
                for (key_prefix, vk) in &self.prefixed {
                    if key_prefix == prefix && vk.verify(data, &sig).is_ok() {
                        return Ok(());
                    }
                }
            }
        }
        if let Ok(sig) = Signature::from_slice(signature) {
            for vk in &self.raw {
                if vk.verify(data, &sig).is_ok() {
                    return Ok(());
                }
            }
        }
        Err(ToolkitError::Authentication)
    }
}
