//! On-chain credential record types
//!
//! The blockchain registry is the authoritative source for credential
//! validity. These types mirror the registry contract's storage layout:
//! credentials are keyed by the Keccak-256 hash of an opaque identifier
//! and carry issuer, subject, content reference, and revocation state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Opaque unique credential identifier.
///
/// The raw string form travels through APIs and QR payloads; the
/// fixed-width on-chain key is the Keccak-256 hash of its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId(pub String);

impl CredentialId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fixed-width key used by the on-chain registry.
    pub fn chain_key(&self) -> [u8; 32] {
        let mut hasher = Keccak256::new();
        hasher.update(self.0.as_bytes());
        hasher.finalize().into()
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 20-byte chain address in 0x-prefixed hex form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Parse and normalize a hex address string.
    pub fn parse(s: &str) -> Result<Self, crate::VeridianError> {
        let hex_part = s.strip_prefix("0x").unwrap_or(s);
        if hex_part.len() != 40 || hex::decode(hex_part).is_err() {
            return Err(crate::VeridianError::Validation(format!(
                "invalid address: {s}"
            )));
        }
        Ok(Self(format!("0x{}", hex_part.to_lowercase())))
    }

    pub fn zero() -> Self {
        Self(format!("0x{}", "0".repeat(40)))
    }

    pub fn is_zero(&self) -> bool {
        self.0
            .strip_prefix("0x")
            .map(|h| h.chars().all(|c| c == '0'))
            .unwrap_or(false)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw 20-byte form, for ABI encoding.
    pub fn to_bytes(&self) -> Option<[u8; 20]> {
        let raw = hex::decode(self.0.strip_prefix("0x")?).ok()?;
        raw.try_into().ok()
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content identifier addressing immutable bytes in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cid(pub String);

impl Cid {
    pub fn new(cid: impl Into<String>) -> Self {
        Self(cid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The on-chain credential record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainCredential {
    /// Opaque identifier this record is keyed under.
    pub credential_id: CredentialId,

    /// Issuing institution's address.
    pub issuer: Address,

    /// Subject wallet address, if the subject bound one at issuance.
    pub subject: Option<Address>,

    /// Content-store reference to the full VC document.
    pub content_ref: Option<Cid>,

    /// Free-text classifier ("Diploma", "Certificate", ...).
    pub credential_type: String,

    /// Set at write time, immutable thereafter.
    pub issued_at: DateTime<Utc>,

    /// Absent means the credential never expires.
    pub expires_at: Option<DateTime<Utc>>,

    /// Monotonic: once true, never reverts.
    pub revoked: bool,

    /// Set only on revocation.
    pub revoked_reason: Option<String>,
}

impl ChainCredential {
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|at| Utc::now() > at).unwrap_or(false)
    }

    /// The validity tuple the registry contract exposes.
    pub fn validity(&self) -> ValidityTuple {
        let expired = self.is_expired();
        ValidityTuple {
            valid: !self.revoked && !expired,
            expired,
            revoked: self.revoked,
        }
    }
}

/// Validity facts read from the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityTuple {
    pub valid: bool,
    pub expired: bool,
    pub revoked: bool,
}

/// Parameters for anchoring a credential on-chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorRequest {
    pub credential_id: CredentialId,
    pub subject: Option<Address>,
    pub content_ref: Cid,
    pub credential_type: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Receipt for a mined chain transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainReceipt {
    pub tx_hash: String,
    pub block_number: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_key_is_stable_and_id_sensitive() {
        let a = CredentialId::new("cred-1");
        let b = CredentialId::new("cred-2");
        assert_eq!(a.chain_key(), CredentialId::new("cred-1").chain_key());
        assert_ne!(a.chain_key(), b.chain_key());
    }

    #[test]
    fn address_parse_normalizes() {
        let addr = Address::parse("0xABCDEF0123456789abcdef0123456789ABCDEF01").unwrap();
        assert_eq!(addr.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
        assert!(!addr.is_zero());
        assert!(Address::zero().is_zero());
        assert!(Address::parse("0x1234").is_err());
    }

    #[test]
    fn validity_reflects_expiry_and_revocation() {
        let mut cred = ChainCredential {
            credential_id: CredentialId::generate(),
            issuer: Address::zero(),
            subject: None,
            content_ref: None,
            credential_type: "Diploma".into(),
            issued_at: Utc::now(),
            expires_at: None,
            revoked: false,
            revoked_reason: None,
        };
        assert!(cred.validity().valid);

        cred.expires_at = Some(Utc::now() - chrono::Duration::days(1));
        let v = cred.validity();
        assert!(v.expired && !v.valid);

        cred.revoked = true;
        let v = cred.validity();
        assert!(v.revoked && v.expired && !v.valid);
    }
}
