//! The keyset data model.
//!
//! A [`KeysetHandle`] is the in-memory, decoded form of a serialized keyset:
//! an ordered sequence of key entries with one designated primary. Handles
//! can only be constructed through [`KeysetHandle::new`], which enforces the
//! two structural invariants (unique key ids, enabled primary), so every
//! handle in the system is valid by construction.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Lifecycle status of a key entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// The key may be used for all operations.
    Enabled,
    /// The key is kept for decryption/verification but not used to produce.
    Disabled,
    /// The key material has been removed; only the entry metadata remains.
    Destroyed,
}

impl KeyStatus {
    /// Wire byte used in the binary container.
    pub const fn to_u8(self) -> u8 {
        match self {
            KeyStatus::Enabled => 1,
            KeyStatus::Disabled => 2,
            KeyStatus::Destroyed => 3,
        }
    }

    /// Parse a wire byte.
    pub const fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(KeyStatus::Enabled),
            2 => Some(KeyStatus::Disabled),
            3 => Some(KeyStatus::Destroyed),
            _ => None,
        }
    }

    /// Name used in the structured (JSON) format.
    pub const fn as_str(self) -> &'static str {
        match self {
            KeyStatus::Enabled => "ENABLED",
            KeyStatus::Disabled => "DISABLED",
            KeyStatus::Destroyed => "DESTROYED",
        }
    }

    /// Parse a structured-format name. Exact match only.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ENABLED" => Some(KeyStatus::Enabled),
            "DISABLED" => Some(KeyStatus::Disabled),
            "DESTROYED" => Some(KeyStatus::Destroyed),
            _ => None,
        }
    }
}

/// How ciphertexts and signatures produced by a key are tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputPrefix {
    /// Outputs carry a 5-byte prefix identifying the producing key.
    Prefixed,
    /// Outputs are raw; consumers must try the key blindly.
    Raw,
}

impl OutputPrefix {
    /// Wire byte used in the binary container.
    pub const fn to_u8(self) -> u8 {
        match self {
            OutputPrefix::Prefixed => 1,
            OutputPrefix::Raw => 2,
        }
    }

    /// Parse a wire byte.
    pub const fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(OutputPrefix::Prefixed),
            2 => Some(OutputPrefix::Raw),
            _ => None,
        }
    }

    /// Name used in the structured (JSON) format.
    pub const fn as_str(self) -> &'static str {
        match self {
            OutputPrefix::Prefixed => "PREFIXED",
            OutputPrefix::Raw => "RAW",
        }
    }

    /// Parse a structured-format name. Exact match only.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PREFIXED" => Some(OutputPrefix::Prefixed),
            "RAW" => Some(OutputPrefix::Raw),
            _ => None,
        }
    }
}

/// A single key entry within a keyset.
///
/// The key material is opaque at this layer: the codecs pass it through
/// byte-for-byte and the toolkit validates it when a primitive is
/// materialized.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyEntry {
    /// Key id, unique within the keyset.
    pub id: u32,
    /// Lifecycle status.
    pub status: KeyStatus,
    /// Output prefix kind.
    pub prefix: OutputPrefix,
    /// Key type identifier, e.g. `keybridge/aes-gcm`.
    pub type_id: String,
    /// Opaque key material.
    pub material: Vec<u8>,
}

impl fmt::Debug for KeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of debug output.
        f.debug_struct("KeyEntry")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("prefix", &self.prefix)
            .field("type_id", &self.type_id)
            .field("material_len", &self.material.len())
            .finish()
    }
}

/// A decoded keyset: ordered key entries plus a designated primary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysetHandle {
    primary_id: u32,
    primary_index: usize,
    entries: Vec<KeyEntry>,
}

impl KeysetHandle {
    /// Build a handle, enforcing the keyset invariants.
    ///
    /// Fails if the keyset is empty, a key id repeats, the primary id does
    /// not reference an entry, or the primary entry is not enabled.
    pub fn new(primary_id: u32, entries: Vec<KeyEntry>) -> Result<Self, CodecError> {
        if entries.is_empty() {
            return Err(CodecError::InvalidKeyset("keyset has no keys".into()));
        }

        let mut seen = std::collections::BTreeSet::new();
        for entry in &entries {
            if !seen.insert(entry.id) {
                return Err(CodecError::InvalidKeyset(format!(
                    "duplicate key id {}",
                    entry.id
                )));
            }
        }

        let primary_index = entries
            .iter()
            .position(|e| e.id == primary_id)
            .ok_or_else(|| {
                CodecError::InvalidKeyset(format!("primary key id {} not present", primary_id))
            })?;

        if entries[primary_index].status != KeyStatus::Enabled {
            return Err(CodecError::InvalidKeyset(format!(
                "primary key {} is not enabled",
                primary_id
            )));
        }

        Ok(Self {
            primary_id,
            primary_index,
            entries,
        })
    }

    /// The primary key id.
    pub fn primary_id(&self) -> u32 {
        self.primary_id
    }

    /// The primary key entry.
    pub fn primary(&self) -> &KeyEntry {
        &self.entries[self.primary_index]
    }

    /// All entries, in insertion order.
    pub fn entries(&self) -> &[KeyEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: a handle holds at least one key.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Annotations carried alongside a serialized keyset.
///
/// Keys are unique and order is irrelevant. An empty map means unrestricted
/// access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationMap(BTreeMap<String, String>);

impl AnnotationMap {
    /// An empty annotation map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an annotation, replacing any previous value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up an annotation value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Whether any annotations are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of annotations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over annotations in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for AnnotationMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A cryptographic operation set that can be extracted from a keyset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveCapability {
    /// Authenticated encryption (seal/open).
    Sealing,
    /// Digital signatures.
    Signing,
    /// Chunked streaming authenticated encryption.
    StreamingSealing,
    /// Deriving a new keyset from a salt.
    KeysetDerivation,
}

impl PrimitiveCapability {
    /// Stable string tag for the capability.
    pub const fn as_str(self) -> &'static str {
        match self {
            PrimitiveCapability::Sealing => "sealing",
            PrimitiveCapability::Signing => "signing",
            PrimitiveCapability::StreamingSealing => "streaming-sealing",
            PrimitiveCapability::KeysetDerivation => "keyset-derivation",
        }
    }

    /// Parse a capability tag. Exact match only.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sealing" => Some(PrimitiveCapability::Sealing),
            "signing" => Some(PrimitiveCapability::Signing),
            "streaming-sealing" => Some(PrimitiveCapability::StreamingSealing),
            "keyset-derivation" => Some(PrimitiveCapability::KeysetDerivation),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
