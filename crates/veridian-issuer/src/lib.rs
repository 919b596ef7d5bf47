//! Veridian Issuer
//!
//! The issuance coordinator sequences the end-to-end credential write:
//! DID resolution, metadata assembly, proof creation, pinned content-
//! store writes, and finally the on-chain anchor. Steps 1-5 must all
//! succeed or the operation aborts with a typed error; the anchor is
//! the one optional step; its failure produces an unanchored but
//! fully issued credential, never an exception.

use std::sync::Arc;

use chrono::Utc;
use veridian_chain::ChainRegistry;
use veridian_core::{
    AnchorRequest, BatchError, BatchOutcome, ChainReceipt, CredentialId, IssuanceReceipt,
    IssueRequest, QrPayload, VeridianError,
};
use veridian_store::ContentStore;
use veridian_vc::{proof::CredentialClaims, DidKey, IdentityResolver, ProofService};

/// The issuing institution's identity.
#[derive(Debug, Clone)]
pub struct IssuerIdentity {
    pub name: String,
    pub key: DidKey,
}

pub struct IssuanceCoordinator {
    issuer: IssuerIdentity,
    resolver: Arc<dyn IdentityResolver>,
    proofs: ProofService,
    store: Arc<dyn ContentStore>,
    /// None when the deployment runs without a chain; credentials are
    /// then issued unanchored.
    chain: Option<Arc<dyn ChainRegistry>>,
    /// Base URL baked into QR verification links.
    verify_base_url: String,
}

impl IssuanceCoordinator {
    pub fn new(
        issuer: IssuerIdentity,
        resolver: Arc<dyn IdentityResolver>,
        store: Arc<dyn ContentStore>,
        chain: Option<Arc<dyn ChainRegistry>>,
        verify_base_url: impl Into<String>,
    ) -> Self {
        Self {
            issuer,
            resolver,
            proofs: ProofService::new(),
            store,
            chain,
            verify_base_url: verify_base_url.into(),
        }
    }

    pub fn issuer_did(&self) -> &str {
        self.issuer.key.did()
    }

    /// Issue one credential end-to-end.
    pub async fn issue(&self, request: IssueRequest) -> Result<IssuanceReceipt, VeridianError> {
        // 1. validation, before any side effect
        request.validate()?;

        // 2. subject identity, idempotent by email
        let subject_did = self.resolver.create_or_get_did(&request.subject_email).await?;

        // 3. metadata assembly (pure)
        let credential_id = CredentialId::generate();
        let metadata = self.build_metadata(&request, &credential_id, &subject_did);

        // 4. signed VC document
        let document = self.proofs.issue_credential(
            CredentialClaims {
                credential_id: credential_id.clone(),
                credential_type: request.credential_type.clone(),
                subject_did: subject_did.clone(),
                claims: request.attributes.clone(),
                expires_at: request.expires_at,
            },
            &self.issuer.key,
        )?;

        // 5. pinned content-store writes; failure here aborts the
        // operation, leaving at most unreferenced bytes behind
        let metadata_cid = self
            .store
            .put(serde_json::to_vec(&metadata)?, true)
            .await?;
        let vc_cid = self
            .store
            .put(serde_json::to_vec(&document)?, true)
            .await?;

        // 6. on-chain anchor: best-effort, never fails the issuance
        let (chain, chain_error) = self
            .anchor(AnchorRequest {
                credential_id: credential_id.clone(),
                subject: request.subject_address.clone(),
                content_ref: vc_cid.clone(),
                credential_type: request.credential_type.clone(),
                expires_at: request.expires_at,
            })
            .await;

        // 7. QR redirect payload (pure)
        let qr = QrPayload {
            credential_id: credential_id.clone(),
            verify_url: format!("{}/verify/{}", self.verify_base_url, credential_id),
            cid: vc_cid.clone(),
        };

        // 8. aggregate receipt
        Ok(IssuanceReceipt {
            credential_id,
            document,
            vc_cid,
            metadata_cid,
            qr,
            chain,
            chain_error,
            issuer_did: self.issuer.key.did().to_string(),
            subject_did,
        })
    }

    async fn anchor(&self, request: AnchorRequest) -> (Option<ChainReceipt>, Option<String>) {
        let Some(chain) = &self.chain else {
            return (None, Some("no chain registry configured".to_string()));
        };
        match chain.issue_credential(&request).await {
            Ok(receipt) => (Some(receipt), None),
            Err(err) => {
                tracing::warn!(
                    credential_id = %request.credential_id,
                    error = %err,
                    "on-chain anchor failed, credential issued unanchored"
                );
                (None, Some(err.to_string()))
            }
        }
    }

    fn build_metadata(
        &self,
        request: &IssueRequest,
        credential_id: &CredentialId,
        subject_did: &str,
    ) -> serde_json::Value {
        serde_json::json!({
            "credentialId": credential_id.as_str(),
            "name": format!("{} - {}", request.credential_type, request.subject_name),
            "credentialType": request.credential_type,
            "issuer": {
                "name": self.issuer.name,
                "did": self.issuer.key.did(),
            },
            "subject": {
                "name": request.subject_name,
                "email": request.subject_email,
                "did": subject_did,
            },
            "attributes": request.attributes,
            "display": request.display,
            "issuedAt": Utc::now(),
            "expiresAt": request.expires_at,
        })
    }

    /// Issue a batch, entry by entry. One entry's failure never aborts
    /// the others; every entry lands in exactly one output list.
    pub async fn batch_issue(&self, requests: Vec<IssueRequest>) -> BatchOutcome {
        let mut results = Vec::new();
        let mut errors = Vec::new();
        for (index, request) in requests.into_iter().enumerate() {
            let subject_email = request.subject_email.clone();
            match self.issue(request).await {
                Ok(receipt) => results.push(receipt),
                Err(err) => errors.push(BatchError {
                    index,
                    subject_email,
                    error: err.to_string(),
                }),
            }
        }
        BatchOutcome { results, errors }
    }

    /// Revoke an anchored credential. Requires the chain: an unanchored
    /// credential has no on-chain authority to revoke against.
    pub async fn revoke(
        &self,
        id: &CredentialId,
        reason: &str,
    ) -> Result<ChainReceipt, VeridianError> {
        let chain = self.chain.as_ref().ok_or_else(|| {
            VeridianError::unavailable("blockchain", "no chain registry configured")
        })?;
        Ok(chain.revoke_credential(id, reason).await?)
    }
}
