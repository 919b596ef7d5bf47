//! Veridian VC
//!
//! Credential proof service: did:key identities backed by Ed25519,
//! signing and verification of VC/VP documents over JCS-canonicalized
//! JSON, and the identity resolver used during issuance.

pub mod did;
pub mod presentation;
pub mod proof;

pub use did::{DidKey, IdentityResolver, KeyResolver};
pub use proof::{CredentialClaims, ProofService};

use thiserror::Error;
use veridian_core::VeridianError;

#[derive(Error, Debug)]
pub enum ProofError {
    #[error("Malformed DID: {0}")]
    MalformedDid(String),

    #[error("Unsupported key type: {0}")]
    UnsupportedKey(String),

    #[error("Signature invalid: {0}")]
    Signature(String),

    #[error("Canonicalization failed: {0}")]
    Canonicalization(String),
}

impl From<ProofError> for VeridianError {
    fn from(err: ProofError) -> Self {
        VeridianError::Proof(err.to_string())
    }
}
