//! Veridian Core
//!
//! Core domain types for the Veridian credential platform.
//! This crate defines the fundamental data structures used across
//! the entire Veridian ecosystem: on-chain credential records,
//! VC/VP documents, verification verdicts, and issuance receipts.

pub mod credential;
pub mod document;
pub mod error;
pub mod institution;
pub mod receipt;
pub mod request;
pub mod verdict;

pub use credential::{
    Address, AnchorRequest, ChainCredential, ChainReceipt, Cid, CredentialId, ValidityTuple,
};
pub use document::{ContentKind, Proof, VcDocument, VpDocument};
pub use error::VeridianError;
pub use institution::Institution;
pub use receipt::{BatchError, BatchOutcome, IssuanceReceipt, QrPayload};
pub use request::{DisplayHints, IssueRequest};
pub use verdict::{
    ChainCheck, ContentCheck, PresentationVerdict, ProofCheck, VerificationVerdict,
};
