//! VC signing and verification
//!
//! Signatures cover the JCS-canonicalized document with the proof
//! field detached, so issuance and verification operate over byte-
//! identical input regardless of JSON key ordering in transit.

use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Verifier};
use veridian_core::{
    document::CREDENTIAL_URN_PREFIX, CredentialId, Proof, ProofCheck, VcDocument,
};

use crate::did::{verifying_key_for, DidKey};
use crate::ProofError;

pub const W3C_CREDENTIALS_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const PROOF_TYPE_ED25519: &str = "Ed25519Signature2020";

/// Claims to embed in a new credential.
#[derive(Debug, Clone)]
pub struct CredentialClaims {
    pub credential_id: CredentialId,
    pub credential_type: String,
    pub subject_did: String,
    /// Attribute map merged into `credentialSubject`.
    pub claims: serde_json::Map<String, serde_json::Value>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Creates and verifies signed VC/VP documents.
#[derive(Debug, Clone, Default)]
pub struct ProofService;

impl ProofService {
    pub fn new() -> Self {
        Self
    }

    /// Produce a signed VC document for the given claims.
    pub fn issue_credential(
        &self,
        claims: CredentialClaims,
        issuer: &DidKey,
    ) -> Result<VcDocument, ProofError> {
        let mut credential_subject = serde_json::Map::new();
        credential_subject.insert("id".into(), claims.subject_did.clone().into());
        credential_subject.insert(
            "credentialId".into(),
            claims.credential_id.as_str().into(),
        );
        credential_subject.extend(claims.claims);

        let mut doc = VcDocument {
            context: vec![W3C_CREDENTIALS_CONTEXT.to_string()],
            id: format!("{CREDENTIAL_URN_PREFIX}{}", claims.credential_id),
            types: vec![
                "VerifiableCredential".to_string(),
                claims.credential_type,
            ],
            issuer: issuer.did().to_string(),
            issuance_date: Utc::now(),
            expiration_date: claims.expires_at,
            credential_subject: credential_subject.into(),
            proof: None,
        };
        doc.proof = Some(self.sign_document(&doc, issuer)?);
        Ok(doc)
    }

    fn sign_document(&self, doc: &VcDocument, issuer: &DidKey) -> Result<Proof, ProofError> {
        let canonical = serde_jcs::to_vec(&doc.without_proof())
            .map_err(|e| ProofError::Canonicalization(e.to_string()))?;
        let signature = issuer.sign(&canonical);
        Ok(Proof {
            proof_type: PROOF_TYPE_ED25519.to_string(),
            created: Utc::now(),
            verification_method: issuer.verification_method(),
            proof_purpose: "assertionMethod".to_string(),
            proof_value: format!("z{}", bs58::encode(signature.to_bytes()).into_string()),
        })
    }

    /// Verify a credential's proof and intrinsic expiry. Never panics
    /// or errors out: every defect lands in the check's error list.
    pub fn verify_credential(&self, doc: &VcDocument) -> ProofCheck {
        let mut errors = Vec::new();

        match &doc.proof {
            None => errors.push("document carries no proof".to_string()),
            Some(proof) => {
                if proof.proof_type != PROOF_TYPE_ED25519 {
                    errors.push(format!("unsupported proof type: {}", proof.proof_type));
                } else if !proof.verification_method.starts_with(&doc.issuer) {
                    errors.push("proof verification method does not belong to issuer".into());
                } else if let Err(e) =
                    self.check_signature(&doc.without_proof(), proof)
                {
                    errors.push(e.to_string());
                }
            }
        }

        if doc.is_expired() {
            errors.push("credential has expired".to_string());
        }

        if errors.is_empty() {
            ProofCheck::ok()
        } else {
            ProofCheck::failed(errors)
        }
    }

    pub(crate) fn check_signature<T: serde::Serialize>(
        &self,
        unsigned: &T,
        proof: &Proof,
    ) -> Result<(), ProofError> {
        let key = verifying_key_for(&proof.verification_method)?;
        let canonical = serde_jcs::to_vec(unsigned)
            .map_err(|e| ProofError::Canonicalization(e.to_string()))?;
        let encoded = proof
            .proof_value
            .strip_prefix('z')
            .ok_or_else(|| ProofError::Signature("missing multibase prefix".into()))?;
        let raw = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| ProofError::Signature(e.to_string()))?;
        let signature = Signature::from_slice(&raw)
            .map_err(|e| ProofError::Signature(e.to_string()))?;
        key.verify(&canonical, &signature)
            .map_err(|_| ProofError::Signature("signature does not verify".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(id: &str) -> CredentialClaims {
        let mut attrs = serde_json::Map::new();
        attrs.insert("course".into(), "Distributed Systems".into());
        CredentialClaims {
            credential_id: CredentialId::new(id),
            credential_type: "Diploma".into(),
            subject_did: "did:key:z6MkSubjectPlaceholder".into(),
            claims: attrs,
            expires_at: None,
        }
    }

    #[test]
    fn issued_credential_verifies() {
        let issuer = DidKey::generate();
        let service = ProofService::new();
        let doc = service.issue_credential(claims("cred-1"), &issuer).unwrap();

        assert_eq!(doc.credential_id().as_deref(), Some("cred-1"));
        let check = service.verify_credential(&doc);
        assert!(check.verified, "errors: {:?}", check.errors);
    }

    #[test]
    fn tampered_subject_fails_verification() {
        let issuer = DidKey::generate();
        let service = ProofService::new();
        let mut doc = service.issue_credential(claims("cred-1"), &issuer).unwrap();
        doc.credential_subject["course"] = "Underwater Basket Weaving".into();

        let check = service.verify_credential(&doc);
        assert!(!check.verified);
        assert!(check.errors.iter().any(|e| e.contains("signature")));
    }

    #[test]
    fn foreign_proof_is_rejected() {
        // signature from a different key than the document's issuer
        let issuer = DidKey::generate();
        let imposter = DidKey::generate();
        let service = ProofService::new();
        let mut doc = service.issue_credential(claims("cred-1"), &issuer).unwrap();
        let forged = service.issue_credential(claims("cred-1"), &imposter).unwrap();
        doc.proof = forged.proof;

        let check = service.verify_credential(&doc);
        assert!(!check.verified);
    }

    #[test]
    fn expired_credential_fails_with_expiry_error() {
        let issuer = DidKey::generate();
        let service = ProofService::new();
        let mut c = claims("cred-1");
        c.expires_at = Some(Utc::now() - chrono::Duration::days(1));
        let doc = service.issue_credential(c, &issuer).unwrap();

        let check = service.verify_credential(&doc);
        assert!(!check.verified);
        assert!(check.errors.iter().any(|e| e.contains("expired")));
    }

    #[test]
    fn missing_proof_is_an_error_not_a_panic() {
        let issuer = DidKey::generate();
        let service = ProofService::new();
        let mut doc = service.issue_credential(claims("cred-1"), &issuer).unwrap();
        doc.proof = None;

        let check = service.verify_credential(&doc);
        assert!(!check.verified);
        assert_eq!(check.errors, vec!["document carries no proof".to_string()]);
    }
}
