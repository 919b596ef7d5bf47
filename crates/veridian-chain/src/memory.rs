//! In-memory registry
//!
//! Mirrors the registry contract's state machine without a chain:
//! issuer gating on verified+active institutions, duplicate-id and
//! past-expiry rejection, monotonic revocation. Used by tests and by
//! deployments that run without a configured chain endpoint.

use chrono::Utc;
use sha3::{Digest, Keccak256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use veridian_core::{
    Address, AnchorRequest, ChainCredential, ChainReceipt, CredentialId, Institution,
    ValidityTuple,
};

use crate::{ChainError, ChainRegistry};

pub struct InMemoryRegistry {
    credentials: RwLock<HashMap<String, ChainCredential>>,
    institutions: RwLock<HashMap<String, Institution>>,
    sender: Address,
    block_height: AtomicU64,
}

impl InMemoryRegistry {
    /// Registry with the given sender account; the sender starts
    /// unregistered and may not issue until an institution record for
    /// it is registered and verified.
    pub fn with_sender(sender: Address) -> Self {
        Self {
            credentials: RwLock::new(HashMap::new()),
            institutions: RwLock::new(HashMap::new()),
            sender,
            block_height: AtomicU64::new(1),
        }
    }

    /// Registry whose sender is pre-registered as a verified, active
    /// institution, ready to issue.
    pub fn new() -> Self {
        let sender = Address(format!("0x{}", "11".repeat(20)));
        let registry = Self::with_sender(sender.clone());
        {
            let mut institutions = registry.institutions.write().expect("lock poisoned");
            institutions.insert(
                sender.0.clone(),
                Institution {
                    address: sender,
                    name: "Veridian Registry Operator".into(),
                    did: "did:key:operator".into(),
                    verified: true,
                    active: true,
                    registered_at: Utc::now(),
                },
            );
        }
        registry
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    fn next_receipt(&self, seed: &[u8]) -> ChainReceipt {
        let block_number = self.block_height.fetch_add(1, Ordering::SeqCst);
        let mut hasher = Keccak256::new();
        hasher.update(seed);
        hasher.update(block_number.to_be_bytes());
        ChainReceipt {
            tx_hash: format!("0x{}", hex::encode(hasher.finalize())),
            block_number,
        }
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainRegistry for InMemoryRegistry {
    async fn get_credential(&self, id: &CredentialId) -> Result<ChainCredential, ChainError> {
        let credentials = self
            .credentials
            .read()
            .map_err(|e| ChainError::Unavailable(e.to_string()))?;
        credentials
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("credential {id}")))
    }

    async fn validity(&self, id: &CredentialId) -> Result<ValidityTuple, ChainError> {
        self.get_credential(id).await.map(|c| c.validity())
    }

    async fn issue_credential(&self, anchor: &AnchorRequest) -> Result<ChainReceipt, ChainError> {
        {
            let institutions = self
                .institutions
                .read()
                .map_err(|e| ChainError::Unavailable(e.to_string()))?;
            let issuer = institutions
                .get(self.sender.as_str())
                .ok_or_else(|| ChainError::Rejected("issuer not registered".into()))?;
            if !issuer.may_issue() {
                return Err(ChainError::Rejected(
                    "issuer not verified or inactive".into(),
                ));
            }
        }
        if let Some(expires_at) = anchor.expires_at {
            if expires_at <= Utc::now() {
                return Err(ChainError::Rejected("expiration is in the past".into()));
            }
        }

        let mut credentials = self
            .credentials
            .write()
            .map_err(|e| ChainError::Unavailable(e.to_string()))?;
        if credentials.contains_key(anchor.credential_id.as_str()) {
            return Err(ChainError::Rejected("credential already exists".into()));
        }
        credentials.insert(
            anchor.credential_id.as_str().to_string(),
            ChainCredential {
                credential_id: anchor.credential_id.clone(),
                issuer: self.sender.clone(),
                subject: anchor.subject.clone(),
                content_ref: Some(anchor.content_ref.clone()),
                credential_type: anchor.credential_type.clone(),
                issued_at: Utc::now(),
                expires_at: anchor.expires_at,
                revoked: false,
                revoked_reason: None,
            },
        );
        Ok(self.next_receipt(&anchor.credential_id.chain_key()))
    }

    async fn revoke_credential(
        &self,
        id: &CredentialId,
        reason: &str,
    ) -> Result<ChainReceipt, ChainError> {
        let mut credentials = self
            .credentials
            .write()
            .map_err(|e| ChainError::Unavailable(e.to_string()))?;
        let record = credentials
            .get_mut(id.as_str())
            .ok_or_else(|| ChainError::NotFound(format!("credential {id}")))?;
        if record.revoked {
            return Err(ChainError::Rejected("credential already revoked".into()));
        }
        record.revoked = true;
        record.revoked_reason = Some(reason.to_string());
        Ok(self.next_receipt(&id.chain_key()))
    }

    async fn get_institution(&self, address: &Address) -> Result<Institution, ChainError> {
        let institutions = self
            .institutions
            .read()
            .map_err(|e| ChainError::Unavailable(e.to_string()))?;
        institutions
            .get(address.as_str())
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("institution {address}")))
    }

    async fn register_institution(
        &self,
        institution: &Institution,
    ) -> Result<ChainReceipt, ChainError> {
        let mut institutions = self
            .institutions
            .write()
            .map_err(|e| ChainError::Unavailable(e.to_string()))?;
        if institutions.contains_key(institution.address.as_str()) {
            return Err(ChainError::Rejected("institution already registered".into()));
        }
        institutions.insert(institution.address.0.clone(), institution.clone());
        Ok(self.next_receipt(institution.address.as_str().as_bytes()))
    }

    async fn set_institution_verified(
        &self,
        address: &Address,
        verified: bool,
    ) -> Result<ChainReceipt, ChainError> {
        let mut institutions = self
            .institutions
            .write()
            .map_err(|e| ChainError::Unavailable(e.to_string()))?;
        let record = institutions
            .get_mut(address.as_str())
            .ok_or_else(|| ChainError::NotFound(format!("institution {address}")))?;
        record.verified = verified;
        Ok(self.next_receipt(address.as_str().as_bytes()))
    }

    async fn set_institution_active(
        &self,
        address: &Address,
        active: bool,
    ) -> Result<ChainReceipt, ChainError> {
        let mut institutions = self
            .institutions
            .write()
            .map_err(|e| ChainError::Unavailable(e.to_string()))?;
        let record = institutions
            .get_mut(address.as_str())
            .ok_or_else(|| ChainError::NotFound(format!("institution {address}")))?;
        record.active = active;
        Ok(self.next_receipt(address.as_str().as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veridian_core::Cid;

    fn anchor(id: &str) -> AnchorRequest {
        AnchorRequest {
            credential_id: CredentialId::new(id),
            subject: None,
            content_ref: Cid::new("bafytest"),
            credential_type: "Diploma".into(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn issue_get_revoke_lifecycle() {
        let registry = InMemoryRegistry::new();
        let receipt = registry.issue_credential(&anchor("cred-1")).await.unwrap();
        assert!(receipt.tx_hash.starts_with("0x"));

        let validity = registry
            .validity(&CredentialId::new("cred-1"))
            .await
            .unwrap();
        assert!(validity.valid && !validity.expired && !validity.revoked);

        registry
            .revoke_credential(&CredentialId::new("cred-1"), "data entry error")
            .await
            .unwrap();
        let record = registry
            .get_credential(&CredentialId::new("cred-1"))
            .await
            .unwrap();
        assert!(record.revoked);
        assert_eq!(record.revoked_reason.as_deref(), Some("data entry error"));

        // revocation is monotonic: the second attempt is rejected and
        // the original reason survives
        let err = registry
            .revoke_credential(&CredentialId::new("cred-1"), "second reason")
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Rejected(_)));
        let record = registry
            .get_credential(&CredentialId::new("cred-1"))
            .await
            .unwrap();
        assert_eq!(record.revoked_reason.as_deref(), Some("data entry error"));
    }

    #[tokio::test]
    async fn unknown_credential_is_not_found() {
        let registry = InMemoryRegistry::new();
        let err = registry
            .get_credential(&CredentialId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_id_rejected() {
        let registry = InMemoryRegistry::new();
        registry.issue_credential(&anchor("cred-1")).await.unwrap();
        let err = registry.issue_credential(&anchor("cred-1")).await.unwrap_err();
        assert!(matches!(err, ChainError::Rejected(_)));
    }

    #[tokio::test]
    async fn past_expiry_rejected() {
        let registry = InMemoryRegistry::new();
        let mut request = anchor("cred-1");
        request.expires_at = Some(Utc::now() - chrono::Duration::hours(1));
        let err = registry.issue_credential(&request).await.unwrap_err();
        assert!(matches!(err, ChainError::Rejected(_)));
    }

    #[tokio::test]
    async fn unverified_issuer_rejected() {
        let registry = InMemoryRegistry::with_sender(Address(format!("0x{}", "22".repeat(20))));
        let err = registry.issue_credential(&anchor("cred-1")).await.unwrap_err();
        assert!(matches!(err, ChainError::Rejected(_)));

        // register but leave unverified
        registry
            .register_institution(&Institution {
                address: registry.sender().clone(),
                name: "Pending University".into(),
                did: "did:key:pending".into(),
                verified: false,
                active: true,
                registered_at: Utc::now(),
            })
            .await
            .unwrap();
        let err = registry.issue_credential(&anchor("cred-1")).await.unwrap_err();
        assert!(matches!(err, ChainError::Rejected(_)));

        // verification gate is reversible
        registry
            .set_institution_verified(registry.sender(), true)
            .await
            .unwrap();
        registry.issue_credential(&anchor("cred-1")).await.unwrap();
    }
}
