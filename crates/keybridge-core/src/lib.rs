//! # Keybridge Core
//!
//! Pure data model and codecs for Keybridge: keysets, annotations, and the
//! two keyset serialization formats.
//!
//! This crate contains no cryptography and no I/O. It decodes bytes into
//! [`KeysetHandle`]s and encodes them back, enforcing structural invariants
//! (unique key ids, an enabled primary) but never inspecting key material;
//! semantic validation of material belongs to the toolkit.
//!
//! ## Key Types
//!
//! - [`KeysetHandle`] - A decoded keyset with a designated primary key
//! - [`KeyEntry`] - One key: id, status, prefix kind, type id, material
//! - [`WireFormat`] - The closed {Binary, Structured} format set
//! - [`AnnotationMap`] - Access annotations carried next to a keyset
//! - [`PrimitiveCapability`] - The operation set requested from a keyset

pub mod binary;
pub mod error;
pub mod format;
pub mod keyset;
pub mod structured;

pub use error::CodecError;
pub use format::{decode, encode, WireFormat};
pub use keyset::{
    AnnotationMap, KeyEntry, KeysetHandle, KeyStatus, OutputPrefix, PrimitiveCapability,
};
