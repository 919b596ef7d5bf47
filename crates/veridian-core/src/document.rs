//! Verifiable Credential and Presentation documents
//!
//! These are the signed JSON documents stored in the content store and
//! exchanged with holders. Documents are immutable once written; the
//! `proof` field is detached before canonicalization so signing and
//! verification operate over identical bytes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Linked-data proof attached to a VC or VP.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type")]
    pub proof_type: String,

    pub created: DateTime<Utc>,

    /// DID URL of the key that produced the signature.
    pub verification_method: String,

    pub proof_purpose: String,

    /// base58btc-multibase encoded signature.
    pub proof_value: String,
}

/// A W3C-shaped Verifiable Credential document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// Document URI, `urn:veridian:credential:<credential-id>`.
    pub id: String,

    #[serde(rename = "type")]
    pub types: Vec<String>,

    /// Issuer DID.
    pub issuer: String,

    pub issuance_date: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,

    /// Claims about the subject, including the subject DID under `id`.
    pub credential_subject: serde_json::Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

pub const CREDENTIAL_URN_PREFIX: &str = "urn:veridian:credential:";

impl VcDocument {
    /// The opaque credential id this document refers to, if any.
    ///
    /// Present either in the document URI or as a `credentialId`
    /// claim on the subject. Caller-supplied documents may carry
    /// neither, in which case there is no on-chain record to check.
    pub fn credential_id(&self) -> Option<String> {
        if let Some(id) = self.id.strip_prefix(CREDENTIAL_URN_PREFIX) {
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
        self.credential_subject
            .get("credentialId")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    pub fn is_expired(&self) -> bool {
        self.expiration_date
            .map(|at| Utc::now() > at)
            .unwrap_or(false)
    }

    /// Copy of the document with the proof detached, for canonical
    /// signing input.
    pub fn without_proof(&self) -> VcDocument {
        let mut doc = self.clone();
        doc.proof = None;
        doc
    }
}

/// A Verifiable Presentation bundling one or more credentials under a
/// holder proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    #[serde(rename = "type")]
    pub types: Vec<String>,

    /// Holder DID.
    pub holder: String,

    pub verifiable_credential: Vec<VcDocument>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl VpDocument {
    pub fn without_proof(&self) -> VpDocument {
        let mut doc = self.clone();
        doc.proof = None;
        doc
    }
}

/// Shape of bytes retrieved from the content store, detected from the
/// bytes themselves rather than assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Json,
    Text,
    Binary,
}

impl ContentKind {
    /// Binary-first sniff: JSON if the bytes parse as JSON, text if
    /// valid UTF-8, binary otherwise.
    pub fn sniff(bytes: &[u8]) -> Self {
        if serde_json::from_slice::<serde_json::Value>(bytes).is_ok() {
            ContentKind::Json
        } else if std::str::from_utf8(bytes).is_ok() {
            ContentKind::Text
        } else {
            ContentKind::Binary
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ContentKind::Json => "application/json",
            ContentKind::Text => "text/plain; charset=utf-8",
            ContentKind::Binary => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Json => write!(f, "json"),
            ContentKind::Text => write!(f, "text"),
            ContentKind::Binary => write!(f, "binary"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> VcDocument {
        VcDocument {
            context: vec!["https://www.w3.org/2018/credentials/v1".into()],
            id: format!("{CREDENTIAL_URN_PREFIX}cred-1"),
            types: vec!["VerifiableCredential".into()],
            issuer: "did:key:z6MkIssuer".into(),
            issuance_date: Utc::now(),
            expiration_date: None,
            credential_subject: serde_json::json!({
                "id": "did:key:z6MkSubject",
                "name": "Alice",
            }),
            proof: None,
        }
    }

    #[test]
    fn credential_id_from_urn_or_subject() {
        let doc = sample_doc();
        assert_eq!(doc.credential_id().as_deref(), Some("cred-1"));

        let mut doc = sample_doc();
        doc.id = "https://example.com/credentials/42".into();
        assert_eq!(doc.credential_id(), None);

        doc.credential_subject["credentialId"] = serde_json::json!("cred-9");
        assert_eq!(doc.credential_id().as_deref(), Some("cred-9"));
    }

    #[test]
    fn sniff_detects_shapes() {
        assert_eq!(ContentKind::sniff(br#"{"a":1}"#), ContentKind::Json);
        assert_eq!(ContentKind::sniff(b"plain words"), ContentKind::Text);
        assert_eq!(ContentKind::sniff(&[0xff, 0xfe, 0x00, 0x01]), ContentKind::Binary);
        // bare JSON scalars still count as JSON
        assert_eq!(ContentKind::sniff(b"42"), ContentKind::Json);
    }

    #[test]
    fn proof_is_detachable() {
        let mut doc = sample_doc();
        doc.proof = Some(Proof {
            proof_type: "Ed25519Signature2020".into(),
            created: Utc::now(),
            verification_method: "did:key:z6MkIssuer#z6MkIssuer".into(),
            proof_purpose: "assertionMethod".into(),
            proof_value: "zSig".into(),
        });
        assert!(doc.without_proof().proof.is_none());
        assert!(doc.proof.is_some());
    }
}
