//! Veridian Verifier
//!
//! The verification orchestrator cross-checks a credential's on-chain
//! record, its content-store document, and its cryptographic proof,
//! reducing them to one consistent verdict. The chain is authoritative
//! for validity; the other sources are corroborating evidence whose
//! unavailability degrades the verdict's detail, never its outcome.
//! The one fatal case is a credential id with no on-chain record.

use std::sync::Arc;

use chrono::Utc;
use veridian_chain::{ChainError, ChainRegistry};
use veridian_core::{
    ChainCheck, ChainCredential, Cid, ContentCheck, ContentKind, CredentialId,
    PresentationVerdict, VcDocument, VerificationVerdict, VeridianError, VpDocument,
};
use veridian_store::ContentStore;
use veridian_vc::ProofService;

pub struct VerificationOrchestrator {
    chain: Arc<dyn ChainRegistry>,
    store: Arc<dyn ContentStore>,
    proofs: ProofService,
}

/// How the chain answered a lookup during document verification.
enum ChainAnswer {
    Found(ChainCredential),
    Missing,
    Unreachable(String),
}

impl VerificationOrchestrator {
    pub fn new(chain: Arc<dyn ChainRegistry>, store: Arc<dyn ContentStore>) -> Self {
        Self {
            chain,
            store,
            proofs: ProofService::new(),
        }
    }

    /// Verify a credential by id.
    ///
    /// Returns `Err(NotFound)` only when the chain answered and no
    /// record exists. Every other condition, including an unreachable
    /// chain, produces a structured verdict.
    pub async fn verify(
        &self,
        id: &CredentialId,
        include_content_metadata: bool,
        requester: Option<String>,
    ) -> Result<VerificationVerdict, VeridianError> {
        let record = match self.chain.get_credential(id).await {
            Ok(record) => record,
            Err(ChainError::NotFound(what)) => {
                return Err(VeridianError::NotFound(what));
            }
            Err(err) => {
                // degraded: unknown is never conflated with valid
                tracing::warn!(credential_id = %id, error = %err, "chain lookup failed");
                return Ok(VerificationVerdict {
                    credential_id: Some(id.to_string()),
                    overall_valid: false,
                    is_expired: false,
                    is_revoked: false,
                    blockchain: ChainCheck::failed(err.to_string()),
                    content_store: None,
                    proof: None,
                    verified_at: Utc::now(),
                    requester,
                });
            }
        };

        let validity = record.validity();
        let content_store = if include_content_metadata {
            Some(match &record.content_ref {
                Some(cid) => self.fetch_content(cid).await,
                None => ContentCheck::failed("credential has no content reference"),
            })
        } else {
            None
        };

        // When the stored content is a signed credential document, check
        // its proof too. Corroborating evidence: the chain alone decides
        // overall validity.
        let proof = content_store
            .as_ref()
            .and_then(|check| check.metadata.as_ref())
            .and_then(|value| serde_json::from_value::<VcDocument>(value.clone()).ok())
            .map(|doc| self.proofs.verify_credential(&doc));

        Ok(VerificationVerdict {
            credential_id: Some(id.to_string()),
            overall_valid: validity.valid && !validity.expired && !validity.revoked,
            is_expired: validity.expired,
            is_revoked: validity.revoked,
            blockchain: ChainCheck::ok(record),
            content_store,
            proof,
            verified_at: Utc::now(),
            requester,
        })
    }

    async fn fetch_content(&self, cid: &Cid) -> ContentCheck {
        match self.store.get(cid).await {
            Ok(bytes) => match ContentKind::sniff(&bytes) {
                ContentKind::Json => match serde_json::from_slice(&bytes) {
                    Ok(value) => ContentCheck::ok(value),
                    Err(e) => ContentCheck::failed(format!("malformed JSON at {cid}: {e}")),
                },
                kind => ContentCheck::failed(format!(
                    "content at {cid} is not a JSON document ({kind})"
                ))
                .with_kind(kind),
            },
            Err(err) => {
                tracing::warn!(cid = %cid, error = %err, "content fetch failed");
                ContentCheck::failed(err.to_string())
            }
        }
    }

    /// Verify a caller-supplied VC document directly: proof first, then
    /// the on-chain cross-check when the document names a credential id.
    ///
    /// `overall_valid = proof_valid && (no_on_chain_record || on_chain_valid)`;
    /// an unreachable chain is neither of those and yields false.
    pub async fn verify_document(
        &self,
        doc: &VcDocument,
        requester: Option<String>,
    ) -> VerificationVerdict {
        let proof = self.proofs.verify_credential(doc);

        let credential_id = doc.credential_id();
        let answer = match &credential_id {
            Some(id) => match self.chain.get_credential(&CredentialId::new(id.clone())).await {
                Ok(record) => ChainAnswer::Found(record),
                Err(ChainError::NotFound(_)) => ChainAnswer::Missing,
                Err(err) => ChainAnswer::Unreachable(err.to_string()),
            },
            // no id anywhere in the document: nothing to anchor against
            None => ChainAnswer::Missing,
        };

        let (blockchain, anchored_valid, is_expired, is_revoked) = match answer {
            ChainAnswer::Found(record) => {
                let validity = record.validity();
                (
                    ChainCheck::ok(record),
                    Some(validity.valid),
                    validity.expired || doc.is_expired(),
                    validity.revoked,
                )
            }
            ChainAnswer::Missing => (
                ChainCheck {
                    verified: false,
                    record: None,
                    error: Some("no on-chain record for this credential".into()),
                },
                None,
                doc.is_expired(),
                false,
            ),
            ChainAnswer::Unreachable(reason) => (
                ChainCheck::failed(reason),
                Some(false),
                doc.is_expired(),
                false,
            ),
        };

        VerificationVerdict {
            credential_id,
            overall_valid: proof.verified && anchored_valid.unwrap_or(true),
            is_expired,
            is_revoked,
            blockchain,
            content_store: None,
            proof: Some(proof),
            verified_at: Utc::now(),
            requester,
        }
    }

    /// Verify a presentation: holder proof plus every embedded
    /// credential independently, AND-reduced.
    pub async fn verify_presentation(
        &self,
        vp: &VpDocument,
        requester: Option<String>,
    ) -> PresentationVerdict {
        let (presentation_proof, embedded) = self.proofs.verify_presentation(vp);

        let mut credentials = Vec::with_capacity(embedded.len());
        for doc in embedded {
            credentials.push(self.verify_document(doc, requester.clone()).await);
        }

        let overall_valid =
            presentation_proof.verified && credentials.iter().all(|v| v.overall_valid);

        PresentationVerdict {
            overall_valid,
            presentation_proof,
            credentials,
            verified_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use veridian_chain::InMemoryRegistry;
    use veridian_core::{AnchorRequest, VeridianError};
    use veridian_store::{ContentStore, InMemoryStore, StoreError};
    use veridian_vc::{proof::CredentialClaims, DidKey};

    struct Fixture {
        registry: Arc<InMemoryRegistry>,
        store: Arc<InMemoryStore>,
        orchestrator: VerificationOrchestrator,
        issuer: DidKey,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(InMemoryRegistry::new());
        let store = Arc::new(InMemoryStore::new());
        Fixture {
            orchestrator: VerificationOrchestrator::new(registry.clone(), store.clone()),
            registry,
            store,
            issuer: DidKey::generate(),
        }
    }

    impl Fixture {
        /// Sign a document and anchor it, returning the document.
        async fn issue(&self, id: &str, expires_at: Option<chrono::DateTime<Utc>>) -> VcDocument {
            let doc = ProofService::new()
                .issue_credential(
                    CredentialClaims {
                        credential_id: CredentialId::new(id),
                        credential_type: "Diploma".into(),
                        subject_did: "did:key:z6MkSubjectPlaceholder".into(),
                        claims: Default::default(),
                        expires_at,
                    },
                    &self.issuer,
                )
                .unwrap();
            let cid = self
                .store
                .put(serde_json::to_vec(&doc).unwrap(), true)
                .await
                .unwrap();
            self.registry
                .issue_credential(&AnchorRequest {
                    credential_id: CredentialId::new(id),
                    subject: None,
                    content_ref: cid,
                    credential_type: "Diploma".into(),
                    expires_at,
                })
                .await
                .unwrap();
            doc
        }
    }

    #[tokio::test]
    async fn valid_credential_verifies_true() {
        let fx = fixture();
        fx.issue("cred-1", None).await;

        let verdict = fx
            .orchestrator
            .verify(&CredentialId::new("cred-1"), false, None)
            .await
            .unwrap();
        assert!(verdict.overall_valid);
        assert!(!verdict.is_expired);
        assert!(!verdict.is_revoked);
        assert!(verdict.blockchain.verified);
        assert!(verdict.content_store.is_none());
    }

    #[tokio::test]
    async fn unknown_credential_is_not_found_never_a_false_verdict() {
        let fx = fixture();
        let err = fx
            .orchestrator
            .verify(&CredentialId::new("ghost"), true, None)
            .await
            .unwrap_err();
        assert!(matches!(err, VeridianError::NotFound(_)));
    }

    #[tokio::test]
    async fn revocation_is_permanent_and_idempotent_to_observe() {
        let fx = fixture();
        fx.issue("cred-1", None).await;
        fx.registry
            .revoke_credential(&CredentialId::new("cred-1"), "data entry error")
            .await
            .unwrap();

        for _ in 0..3 {
            let verdict = fx
                .orchestrator
                .verify(&CredentialId::new("cred-1"), false, None)
                .await
                .unwrap();
            assert!(verdict.is_revoked);
            assert!(!verdict.overall_valid);
            let record = verdict.blockchain.record.as_ref().unwrap();
            assert_eq!(record.revoked_reason.as_deref(), Some("data entry error"));
        }
    }

    #[tokio::test]
    async fn expired_credential_reports_expired_even_when_revoked() {
        let fx = fixture();
        // anchor with a short future expiry, then wait it out
        fx.issue("cred-1", Some(Utc::now() + Duration::milliseconds(50))).await;
        tokio::time::sleep(std::time::Duration::from_millis(80)).await;

        let verdict = fx
            .orchestrator
            .verify(&CredentialId::new("cred-1"), false, None)
            .await
            .unwrap();
        assert!(verdict.is_expired);
        assert!(!verdict.overall_valid);

        fx.registry
            .revoke_credential(&CredentialId::new("cred-1"), "cleanup")
            .await
            .unwrap();
        let verdict = fx
            .orchestrator
            .verify(&CredentialId::new("cred-1"), false, None)
            .await
            .unwrap();
        assert!(verdict.is_expired && verdict.is_revoked);
    }

    #[tokio::test]
    async fn content_metadata_is_attached_when_requested() {
        let fx = fixture();
        let doc = fx.issue("cred-1", None).await;

        let verdict = fx
            .orchestrator
            .verify(&CredentialId::new("cred-1"), true, None)
            .await
            .unwrap();
        let content = verdict.content_store.unwrap();
        assert!(content.verified);
        let stored: VcDocument =
            serde_json::from_value(content.metadata.unwrap()).unwrap();
        assert_eq!(stored.id, doc.id);
    }

    #[tokio::test]
    async fn by_id_verify_checks_proof_of_the_stored_document() {
        let fx = fixture();
        fx.issue("cred-1", None).await;

        let verdict = fx
            .orchestrator
            .verify(&CredentialId::new("cred-1"), true, None)
            .await
            .unwrap();
        assert!(verdict.content_store.as_ref().unwrap().verified);
        let proof = verdict.proof.expect("stored document carries a proof");
        assert!(proof.verified);

        // without metadata there is no document to check
        let verdict = fx
            .orchestrator
            .verify(&CredentialId::new("cred-1"), false, None)
            .await
            .unwrap();
        assert!(verdict.proof.is_none());
    }

    #[tokio::test]
    async fn broken_stored_proof_is_reported_without_flipping_validity() {
        let fx = fixture();
        let mut doc = fx.issue("cred-1", None).await;
        doc.credential_subject["name"] = "Mallory".into();

        // re-anchor against the tampered copy of the document
        let cid = fx
            .store
            .put(serde_json::to_vec(&doc).unwrap(), true)
            .await
            .unwrap();
        fx.registry
            .issue_credential(&AnchorRequest {
                credential_id: CredentialId::new("cred-2"),
                subject: None,
                content_ref: cid,
                credential_type: "Diploma".into(),
                expires_at: None,
            })
            .await
            .unwrap();

        let verdict = fx
            .orchestrator
            .verify(&CredentialId::new("cred-2"), true, None)
            .await
            .unwrap();
        assert!(verdict.overall_valid, "chain record alone decides validity");
        assert!(!verdict.proof.unwrap().verified);
    }

    /// Store double that always fails.
    struct DownStore;

    #[async_trait]
    impl ContentStore for DownStore {
        async fn put(&self, _: Vec<u8>, _: bool) -> Result<Cid, StoreError> {
            Err(StoreError::Unavailable("store offline".into()))
        }
        async fn get(&self, _: &Cid) -> Result<Vec<u8>, StoreError> {
            Err(StoreError::Timeout(30))
        }
    }

    #[tokio::test]
    async fn content_store_outage_never_flips_a_valid_credential() {
        let registry = Arc::new(InMemoryRegistry::new());
        let fx = Fixture {
            orchestrator: VerificationOrchestrator::new(registry.clone(), Arc::new(DownStore)),
            registry,
            store: Arc::new(InMemoryStore::new()),
            issuer: DidKey::generate(),
        };
        // anchor without relying on the down store
        fx.registry
            .issue_credential(&AnchorRequest {
                credential_id: CredentialId::new("cred-1"),
                subject: None,
                content_ref: Cid::new("zUnreachable"),
                credential_type: "Diploma".into(),
                expires_at: None,
            })
            .await
            .unwrap();

        let verdict = fx
            .orchestrator
            .verify(&CredentialId::new("cred-1"), true, None)
            .await
            .unwrap();
        assert!(verdict.blockchain.verified);
        assert!(verdict.overall_valid, "store outage must not invalidate");
        let content = verdict.content_store.unwrap();
        assert!(!content.verified);
        assert!(content.error.is_some());
    }

    /// Registry double whose chain is unreachable.
    struct DownRegistry;

    #[async_trait]
    impl ChainRegistry for DownRegistry {
        async fn get_credential(
            &self,
            _: &CredentialId,
        ) -> Result<ChainCredential, ChainError> {
            Err(ChainError::Unavailable("rpc timeout".into()))
        }
        async fn validity(
            &self,
            _: &CredentialId,
        ) -> Result<veridian_core::ValidityTuple, ChainError> {
            Err(ChainError::Unavailable("rpc timeout".into()))
        }
        async fn issue_credential(
            &self,
            _: &AnchorRequest,
        ) -> Result<veridian_core::ChainReceipt, ChainError> {
            Err(ChainError::Unavailable("rpc timeout".into()))
        }
        async fn revoke_credential(
            &self,
            _: &CredentialId,
            _: &str,
        ) -> Result<veridian_core::ChainReceipt, ChainError> {
            Err(ChainError::Unavailable("rpc timeout".into()))
        }
        async fn get_institution(
            &self,
            _: &veridian_core::Address,
        ) -> Result<veridian_core::Institution, ChainError> {
            Err(ChainError::Unavailable("rpc timeout".into()))
        }
        async fn register_institution(
            &self,
            _: &veridian_core::Institution,
        ) -> Result<veridian_core::ChainReceipt, ChainError> {
            Err(ChainError::Unavailable("rpc timeout".into()))
        }
        async fn set_institution_verified(
            &self,
            _: &veridian_core::Address,
            _: bool,
        ) -> Result<veridian_core::ChainReceipt, ChainError> {
            Err(ChainError::Unavailable("rpc timeout".into()))
        }
        async fn set_institution_active(
            &self,
            _: &veridian_core::Address,
            _: bool,
        ) -> Result<veridian_core::ChainReceipt, ChainError> {
            Err(ChainError::Unavailable("rpc timeout".into()))
        }
    }

    #[tokio::test]
    async fn unreachable_chain_degrades_to_invalid_not_error() {
        let orchestrator =
            VerificationOrchestrator::new(Arc::new(DownRegistry), Arc::new(InMemoryStore::new()));

        let verdict = orchestrator
            .verify(&CredentialId::new("cred-1"), true, None)
            .await
            .unwrap();
        assert!(!verdict.overall_valid, "unknown must never read as valid");
        assert!(!verdict.blockchain.verified);
        assert!(verdict.blockchain.error.as_deref().unwrap().contains("rpc timeout"));
        // all chain-derived booleans stay at their zero value
        assert!(!verdict.is_expired && !verdict.is_revoked);
    }

    #[tokio::test]
    async fn document_with_valid_proof_and_anchor_verifies() {
        let fx = fixture();
        let doc = fx.issue("cred-1", None).await;

        let verdict = fx.orchestrator.verify_document(&doc, None).await;
        assert!(verdict.overall_valid);
        assert!(verdict.proof.as_ref().unwrap().verified);
        assert!(verdict.blockchain.verified);
    }

    #[tokio::test]
    async fn unanchored_document_passes_on_proof_alone() {
        let fx = fixture();
        // signed but never anchored
        let doc = ProofService::new()
            .issue_credential(
                CredentialClaims {
                    credential_id: CredentialId::new("offchain-1"),
                    credential_type: "Diploma".into(),
                    subject_did: "did:key:z6MkSubjectPlaceholder".into(),
                    claims: Default::default(),
                    expires_at: None,
                },
                &fx.issuer,
            )
            .unwrap();

        let verdict = fx.orchestrator.verify_document(&doc, None).await;
        assert!(verdict.overall_valid);
        assert!(!verdict.blockchain.verified);
        assert!(verdict
            .blockchain
            .error
            .as_deref()
            .unwrap()
            .contains("no on-chain record"));
    }

    #[tokio::test]
    async fn revoked_anchor_invalidates_a_well_signed_document() {
        let fx = fixture();
        let doc = fx.issue("cred-1", None).await;
        fx.registry
            .revoke_credential(&CredentialId::new("cred-1"), "superseded")
            .await
            .unwrap();

        let verdict = fx.orchestrator.verify_document(&doc, None).await;
        assert!(!verdict.overall_valid);
        assert!(verdict.is_revoked);
        assert!(verdict.proof.unwrap().verified, "proof itself is still good");
    }

    #[tokio::test]
    async fn unreachable_chain_fails_document_crosscheck() {
        let fx = fixture();
        let doc = fx.issue("cred-1", None).await;

        let orchestrator =
            VerificationOrchestrator::new(Arc::new(DownRegistry), Arc::new(InMemoryStore::new()));
        let verdict = orchestrator.verify_document(&doc, None).await;
        assert!(!verdict.overall_valid, "unreachable is not the same as unanchored");
        assert!(verdict.proof.unwrap().verified);
    }

    #[tokio::test]
    async fn tampered_document_fails_even_with_valid_anchor() {
        let fx = fixture();
        let mut doc = fx.issue("cred-1", None).await;
        doc.credential_subject["name"] = "Mallory".into();

        let verdict = fx.orchestrator.verify_document(&doc, None).await;
        assert!(!verdict.overall_valid);
        assert!(!verdict.proof.unwrap().verified);
    }

    #[tokio::test]
    async fn presentation_reduces_across_all_credentials() {
        let fx = fixture();
        let good = fx.issue("cred-1", None).await;
        let bad = fx.issue("cred-2", None).await;
        fx.registry
            .revoke_credential(&CredentialId::new("cred-2"), "revoked")
            .await
            .unwrap();

        let holder = DidKey::generate();
        let service = ProofService::new();

        let vp = service
            .issue_presentation(vec![good.clone()], &holder)
            .unwrap();
        let verdict = fx.orchestrator.verify_presentation(&vp, None).await;
        assert!(verdict.overall_valid);
        assert_eq!(verdict.credentials.len(), 1);

        let vp = service.issue_presentation(vec![good, bad], &holder).unwrap();
        let verdict = fx.orchestrator.verify_presentation(&vp, None).await;
        assert!(!verdict.overall_valid);
        assert!(verdict.presentation_proof.verified);
        assert_eq!(verdict.credentials.len(), 2);
    }
}
