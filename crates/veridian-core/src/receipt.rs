//! Issuance receipts
//!
//! The receipt aggregates everything produced by the issuance pipeline.
//! `chain: None` is a first-class, representable state: the credential
//! exists and is retrievable by content id, but no on-chain authority
//! for revocation or expiry exists for it yet.

use serde::{Deserialize, Serialize};

use crate::credential::{ChainReceipt, Cid, CredentialId};
use crate::document::VcDocument;

/// Compact payload encoded into the credential QR code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    pub credential_id: CredentialId,

    /// Public URL resolving to the verification endpoint.
    pub verify_url: String,

    pub cid: Cid,
}

/// Result of a single successful issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceReceipt {
    pub credential_id: CredentialId,

    /// The full signed VC document.
    pub document: VcDocument,

    /// Content id of the full signed VC.
    pub vc_cid: Cid,

    /// Content id of the raw metadata document.
    pub metadata_cid: Cid,

    pub qr: QrPayload,

    /// Mined anchor transaction, or None when the anchor step failed
    /// or no chain is configured.
    pub chain: Option<ChainReceipt>,

    /// Cause of the missing anchor, when `chain` is None because the
    /// write was attempted and failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_error: Option<String>,

    pub issuer_did: String,

    pub subject_did: String,
}

impl IssuanceReceipt {
    /// Whether the credential has an on-chain anchor.
    pub fn is_anchored(&self) -> bool {
        self.chain.is_some()
    }
}

/// One failed entry of a batch issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchError {
    /// Index of the entry in the caller's input.
    pub index: usize,

    pub subject_email: String,

    pub error: String,
}

/// Partial-success outcome of a batch issuance. Every input entry
/// appears in exactly one of the two lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub results: Vec<IssuanceReceipt>,
    pub errors: Vec<BatchError>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.results.len() + self.errors.len()
    }
}
