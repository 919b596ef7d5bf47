//! did:key identities
//!
//! A did:key DID embeds the Ed25519 public key directly: the method-
//! specific id is the base58btc multibase of the multicodec-prefixed
//! key bytes. Resolution is therefore pure computation, no network.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::ProofError;

// multicodec ed25519-pub, varint encoded
const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];

const DID_KEY_PREFIX: &str = "did:key:";

/// An Ed25519 keypair bound to its did:key identifier.
#[derive(Clone)]
pub struct DidKey {
    did: String,
    signing: SigningKey,
}

impl DidKey {
    /// Generate a fresh identity.
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        Self::from_signing_key(SigningKey::generate(&mut rng))
    }

    pub fn from_signing_key(signing: SigningKey) -> Self {
        let did = encode_did(&signing.verifying_key());
        Self { did, signing }
    }

    /// Rebuild an identity from a 32-byte seed (hex). Used by
    /// deployments that persist the issuer key in the environment.
    pub fn from_seed_hex(seed: &str) -> Result<Self, ProofError> {
        let raw = hex::decode(seed.strip_prefix("0x").unwrap_or(seed))
            .map_err(|e| ProofError::UnsupportedKey(e.to_string()))?;
        let seed: [u8; 32] = raw
            .try_into()
            .map_err(|_| ProofError::UnsupportedKey("seed must be 32 bytes".into()))?;
        Ok(Self::from_signing_key(SigningKey::from_bytes(&seed)))
    }

    pub fn did(&self) -> &str {
        &self.did
    }

    /// Hex seed that reconstructs this identity via [`Self::from_seed_hex`].
    pub fn seed_hex(&self) -> String {
        hex::encode(self.signing.to_bytes())
    }

    /// DID URL of the signing key, `did:key:z..#z..`.
    pub fn verification_method(&self) -> String {
        let fragment = self.did.strip_prefix(DID_KEY_PREFIX).unwrap_or(&self.did);
        format!("{}#{}", self.did, fragment)
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing.sign(message)
    }
}

impl std::fmt::Debug for DidKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // never expose key material
        write!(f, "DidKey({})", self.did)
    }
}

fn encode_did(key: &VerifyingKey) -> String {
    let mut prefixed = Vec::with_capacity(2 + 32);
    prefixed.extend_from_slice(&ED25519_MULTICODEC);
    prefixed.extend_from_slice(key.as_bytes());
    format!(
        "{DID_KEY_PREFIX}z{}",
        bs58::encode(prefixed).into_string()
    )
}

/// Resolve the Ed25519 public key embedded in a did:key DID or DID URL.
pub fn verifying_key_for(method: &str) -> Result<VerifyingKey, ProofError> {
    let did = method.split('#').next().unwrap_or(method);
    let msid = did
        .strip_prefix(DID_KEY_PREFIX)
        .ok_or_else(|| ProofError::MalformedDid(format!("not a did:key DID: {did}")))?;
    let encoded = msid
        .strip_prefix('z')
        .ok_or_else(|| ProofError::MalformedDid("missing base58btc multibase prefix".into()))?;
    let raw = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| ProofError::MalformedDid(e.to_string()))?;
    if raw.len() != 34 || raw[..2] != ED25519_MULTICODEC {
        return Err(ProofError::UnsupportedKey(
            "did:key does not embed an Ed25519 public key".into(),
        ));
    }
    let bytes: [u8; 32] = raw[2..].try_into().expect("length checked above");
    VerifyingKey::from_bytes(&bytes).map_err(|e| ProofError::UnsupportedKey(e.to_string()))
}

/// Resolve-or-create a DID for a subject key (email address).
///
/// Must be idempotent per key: repeated calls for the same subject
/// reuse the existing identity instead of minting a duplicate.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn create_or_get_did(&self, subject_key: &str) -> Result<String, ProofError>;
}

/// In-process resolver backed by generated did:key material.
pub struct KeyResolver {
    identities: RwLock<HashMap<String, DidKey>>,
}

impl KeyResolver {
    pub fn new() -> Self {
        Self {
            identities: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for KeyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityResolver for KeyResolver {
    async fn create_or_get_did(&self, subject_key: &str) -> Result<String, ProofError> {
        let mut identities = self
            .identities
            .write()
            .map_err(|e| ProofError::UnsupportedKey(e.to_string()))?;
        let identity = identities
            .entry(subject_key.to_string())
            .or_insert_with(DidKey::generate);
        Ok(identity.did().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn did_round_trips_to_public_key() {
        let identity = DidKey::generate();
        assert!(identity.did().starts_with("did:key:z"));

        let resolved = verifying_key_for(identity.did()).unwrap();
        assert_eq!(resolved, identity.signing.verifying_key());

        // DID URLs with a key fragment resolve the same way
        let resolved = verifying_key_for(&identity.verification_method()).unwrap();
        assert_eq!(resolved, identity.signing.verifying_key());
    }

    #[test]
    fn non_did_key_is_rejected() {
        assert!(verifying_key_for("did:web:example.com").is_err());
        assert!(verifying_key_for("did:key:uNotBase58btc").is_err());
    }

    #[test]
    fn seed_hex_is_deterministic() {
        let seed = "11".repeat(32);
        let a = DidKey::from_seed_hex(&seed).unwrap();
        let b = DidKey::from_seed_hex(&seed).unwrap();
        assert_eq!(a.did(), b.did());
        assert!(DidKey::from_seed_hex("beef").is_err());
    }

    #[tokio::test]
    async fn resolver_is_idempotent_per_subject() {
        let resolver = KeyResolver::new();
        let first = resolver.create_or_get_did("alice@example.com").await.unwrap();
        let second = resolver.create_or_get_did("alice@example.com").await.unwrap();
        let other = resolver.create_or_get_did("bob@example.com").await.unwrap();
        assert_eq!(first, second);
        assert_ne!(first, other);
    }
}
