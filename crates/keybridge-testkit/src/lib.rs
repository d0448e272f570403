//! # Keybridge Testkit
//!
//! Testing utilities for the Keybridge workspace.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Deterministic keysets for every capability, built from
//!   fixed byte patterns
//! - **Generators**: Proptest strategies for structurally valid keysets,
//!   annotation maps, and payloads
//!
//! ## Test Fixtures
//!
//! ```rust
//! use keybridge_testkit::fixtures;
//!
//! let handle = fixtures::sealing_handle(0x42);
//! let annotated = fixtures::annotated(&handle);
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use keybridge_testkit::generators;
//!
//! proptest! {
//!     #[test]
//!     fn binary_roundtrip(handle in generators::keyset_handle(4)) {
//!         let bytes = keybridge_core::encode(&handle, keybridge_core::WireFormat::Binary)?;
//!         prop_assert_eq!(keybridge_core::decode(&bytes, keybridge_core::WireFormat::Binary)?, handle);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
