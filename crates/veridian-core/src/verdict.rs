//! Verification verdicts
//!
//! A verdict is computed fresh on every verification call and never
//! persisted. The blockchain sub-result is authoritative for
//! `overall_valid`; content-store and proof sub-results are
//! corroborating evidence whose failure is surfaced but never flips
//! the overall outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::ChainCredential;
use crate::document::ContentKind;

/// Outcome of the authoritative blockchain lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainCheck {
    /// True when the chain answered and the record was read.
    pub verified: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ChainCredential>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChainCheck {
    pub fn ok(record: ChainCredential) -> Self {
        Self {
            verified: true,
            record: Some(record),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            verified: false,
            record: None,
            error: Some(error.into()),
        }
    }
}

/// Outcome of the best-effort content-store fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCheck {
    pub verified: bool,

    /// Parsed document when the retrieved bytes were JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    /// What the retrieved bytes sniffed as, when anything came back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_kind: Option<ContentKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContentCheck {
    pub fn ok(metadata: serde_json::Value) -> Self {
        Self {
            verified: true,
            metadata: Some(metadata),
            content_kind: Some(ContentKind::Json),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            verified: false,
            metadata: None,
            content_kind: None,
            error: Some(error.into()),
        }
    }

    pub fn with_kind(mut self, kind: ContentKind) -> Self {
        self.content_kind = Some(kind);
        self
    }
}

/// Outcome of cryptographic proof verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofCheck {
    pub verified: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ProofCheck {
    pub fn ok() -> Self {
        Self {
            verified: true,
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            verified: false,
            errors,
        }
    }
}

/// The single consistent validity verdict for one credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationVerdict {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,

    /// AND-reduction over the authoritative facts. Never true unless
    /// the chain said valid (or, for caller-supplied documents with no
    /// on-chain record, the proof alone).
    pub overall_valid: bool,

    pub is_expired: bool,

    pub is_revoked: bool,

    pub blockchain: ChainCheck,

    /// Present only when a content fetch was requested or attempted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_store: Option<ContentCheck>,

    /// Present only when proof verification ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofCheck>,

    pub verified_at: DateTime<Utc>,

    /// Authenticated requester identity, informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<String>,
}

/// Verdict for a Verifiable Presentation: the holder proof plus one
/// verdict per embedded credential, AND-reduced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationVerdict {
    pub overall_valid: bool,

    pub presentation_proof: ProofCheck,

    pub credentials: Vec<VerificationVerdict>,

    pub verified_at: DateTime<Utc>,
}
