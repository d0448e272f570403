//! The process-wide template registry.
//!
//! A read-only name-to-template table, initialized lazily on first use and
//! never mutated afterwards. Lookup is case-sensitive exact match.

use std::collections::HashMap;

use keybridge_core::OutputPrefix;
use keybridge_toolkit::{type_ids, TemplateDescriptor};
use once_cell::sync::Lazy;

use crate::error::{GatewayError, Result};

fn aead(type_id: &str, key_size: u32, prefix: OutputPrefix) -> TemplateDescriptor {
    TemplateDescriptor {
        type_id: type_id.into(),
        key_size,
        segment_size: None,
        prefix,
    }
}

fn streaming(key_size: u32, segment_size: u32) -> TemplateDescriptor {
    TemplateDescriptor {
        type_id: type_ids::AES_GCM_HKDF_STREAMING.into(),
        key_size,
        segment_size: Some(segment_size),
        prefix: OutputPrefix::Raw,
    }
}

static TEMPLATES: Lazy<HashMap<&'static str, TemplateDescriptor>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        "AES128_GCM",
        aead(type_ids::AES_GCM, 16, OutputPrefix::Prefixed),
    );
    table.insert("AES128_GCM_RAW", aead(type_ids::AES_GCM, 16, OutputPrefix::Raw));
    table.insert(
        "AES256_GCM",
        aead(type_ids::AES_GCM, 32, OutputPrefix::Prefixed),
    );
    table.insert("AES256_GCM_RAW", aead(type_ids::AES_GCM, 32, OutputPrefix::Raw));
    // Both ChaCha template names map to the XChaCha construction.
    table.insert(
        "CHACHA20_POLY1305",
        aead(type_ids::XCHACHA20_POLY1305, 32, OutputPrefix::Prefixed),
    );
    table.insert(
        "XCHACHA20_POLY1305",
        aead(type_ids::XCHACHA20_POLY1305, 32, OutputPrefix::Prefixed),
    );
    table.insert("AES128_GCM_HKDF_4KB", streaming(16, 4096));
    table.insert("AES256_GCM_HKDF_4KB", streaming(32, 4096));
    table.insert("AES256_GCM_HKDF_1MB", streaming(32, 1 << 20));
    table.insert(
        "ED25519",
        aead(type_ids::ED25519_SIGN, 32, OutputPrefix::Prefixed),
    );
    table.insert(
        "HKDF_SHA256_DERIVE_AES256_GCM",
        aead(type_ids::HKDF_SHA256_DERIVE, 32, OutputPrefix::Prefixed),
    );
    table
});

/// Look up a template by name.
pub fn lookup(name: &str) -> Result<&'static TemplateDescriptor> {
    TEMPLATES
        .get(name)
        .ok_or_else(|| GatewayError::TemplateNotFound(name.to_string()))
}

/// Names of all registered templates, in no particular order.
pub fn template_names() -> impl Iterator<Item = &'static str> {
    TEMPLATES.keys().copied()
}
