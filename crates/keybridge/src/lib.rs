//! # Keybridge
//!
//! A conformance-testing gateway over the Keybridge keyset codecs and
//! cryptography toolkit. It accepts opaque serialized keyset material plus
//! operation requests and drives the toolkit to perform keyset management
//! and cryptographic transforms, returning a success payload or a structured
//! error for every request.
//!
//! ## Architecture
//!
//! - [`resolver`] - the single decode-plus-materialize choke point
//! - [`envelope`] - keyset wrap/unwrap under a master sealing key
//! - [`stream`] - whole-payload adapter over the chunked stream protocol
//! - [`registry`] - the process-wide, read-only template table
//! - [`service`] - the per-operation request/response contract
//!
//! The RPC transport itself is out of scope; [`service`] defines the
//! contract a transport binds to.

pub mod envelope;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod stream;

pub use envelope::EnvelopeRequest;
pub use error::{GatewayError, RequestFault};
pub use resolver::AnnotatedKeyset;
pub use service::{OpResponse, StreamRequest, UnwrapRequest, WrapRequest};

// The component crates travel with the facade.
pub use keybridge_core as core;
pub use keybridge_toolkit as toolkit;
