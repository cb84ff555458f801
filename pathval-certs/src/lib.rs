//! pathval-certs builds the certificates that make up path validation test
//! chains: self-signed roots, intermediates, and end-entity certificates,
//! each with a deliberately controllable set of fields (key strength,
//! validity window, basic constraints, key usages, and arbitrary extensions
//! keyed by OID with a criticality flag).
//!
//! The crate is a thin wrapper over [rcgen]: certificates come out as plain
//! DER, and every field a test scenario wants to perturb is a single setter
//! on [`CertBuilder`]. Key material is managed by a [`KeyStore`] so that
//! repeated generator runs can reuse keys instead of inventing new ones.
//!
//! [rcgen]: https://docs.rs/rcgen
#![warn(clippy::pedantic)]

mod builder;
mod error;
mod keys;

pub use builder::{
    BasicConstraintsSpec, CertBuilder, Issuance, IssuedCert, DEFAULT_NOT_AFTER,
    DEFAULT_NOT_BEFORE, UNKNOWN_EXTENSION_OID, UNKNOWN_EXTENSION_VALUE,
};
pub use error::BuildError;
pub use keys::{KeySpec, KeyStore};

// Scenario code sets key usages with rcgen's own types; re-export them so
// consumers don't need a direct rcgen dependency.
pub use rcgen::{ExtendedKeyUsagePurpose, KeyUsagePurpose};

/// Convenience type for functions that return a `T` on success or a [`BuildError`] otherwise.
pub type Result<T> = core::result::Result<T, BuildError>;
