//! Application state
//!
//! All collaborators are constructed once at startup and injected as
//! trait objects; handlers never reach for process-wide singletons.
//! A deployment without a configured chain endpoint still issues
//! (unanchored) credentials, but verification routes answer 503.

use std::sync::Arc;

use url::Url;
use veridian_chain::{ChainRegistry, InMemoryRegistry, JsonRpcRegistry};
use veridian_core::{Address, VeridianError};
use veridian_issuer::{IssuanceCoordinator, IssuerIdentity};
use veridian_store::{ContentStore, InMemoryStore, IpfsStore};
use veridian_vc::{DidKey, KeyResolver};
use veridian_verifier::VerificationOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub issuer: Arc<IssuanceCoordinator>,

    /// Absent when no chain registry is configured; verification
    /// routes then answer 503.
    pub verifier: Option<Arc<VerificationOrchestrator>>,

    pub chain: Option<Arc<dyn ChainRegistry>>,

    pub store: Arc<dyn ContentStore>,
}

impl AppState {
    fn assemble(
        chain: Option<Arc<dyn ChainRegistry>>,
        store: Arc<dyn ContentStore>,
        issuer_key: DidKey,
        issuer_name: String,
        public_url: String,
    ) -> Self {
        let issuer = Arc::new(IssuanceCoordinator::new(
            IssuerIdentity {
                name: issuer_name,
                key: issuer_key,
            },
            Arc::new(KeyResolver::new()),
            store.clone(),
            chain.clone(),
            public_url,
        ));
        let verifier = chain
            .clone()
            .map(|chain| Arc::new(VerificationOrchestrator::new(chain, store.clone())));
        Self {
            issuer,
            verifier,
            chain,
            store,
        }
    }

    /// Fully in-memory state: an in-process registry (sender pre-
    /// verified) and content store. Used by tests and local dev.
    pub fn in_memory() -> Self {
        Self::assemble(
            Some(Arc::new(InMemoryRegistry::new())),
            Arc::new(InMemoryStore::new()),
            DidKey::generate(),
            "Veridian Dev Issuer".into(),
            "http://localhost:4000".into(),
        )
    }

    /// State with no chain registry at all: issuance degrades to
    /// unanchored receipts, verification answers 503.
    pub fn without_chain() -> Self {
        Self::assemble(
            None,
            Arc::new(InMemoryStore::new()),
            DidKey::generate(),
            "Veridian Dev Issuer".into(),
            "http://localhost:4000".into(),
        )
    }

    /// Build from `VERIDIAN_*` environment variables.
    ///
    /// - `VERIDIAN_RPC_URL` + `VERIDIAN_CONTRACT_ADDRESS` +
    ///   `VERIDIAN_SENDER_ADDRESS`: JSON-RPC registry (all three or none).
    /// - `VERIDIAN_IPFS_URL`: IPFS HTTP API (in-memory store when unset).
    /// - `VERIDIAN_ISSUER_SEED`: hex Ed25519 seed (generated when unset).
    /// - `VERIDIAN_ISSUER_NAME`, `VERIDIAN_PUBLIC_URL`.
    pub fn from_env() -> Result<Self, VeridianError> {
        let chain: Option<Arc<dyn ChainRegistry>> = match std::env::var("VERIDIAN_RPC_URL") {
            Ok(rpc_url) => {
                let endpoint = Url::parse(&rpc_url)
                    .map_err(|e| VeridianError::Config(format!("VERIDIAN_RPC_URL: {e}")))?;
                let contract = Address::parse(&require_env("VERIDIAN_CONTRACT_ADDRESS")?)?;
                let sender = Address::parse(&require_env("VERIDIAN_SENDER_ADDRESS")?)?;
                Some(Arc::new(JsonRpcRegistry::new(endpoint, contract, sender)))
            }
            Err(_) => {
                tracing::warn!("VERIDIAN_RPC_URL not set; running without a chain registry");
                None
            }
        };

        let store: Arc<dyn ContentStore> = match std::env::var("VERIDIAN_IPFS_URL") {
            Ok(ipfs_url) => {
                let base = Url::parse(&ipfs_url)
                    .map_err(|e| VeridianError::Config(format!("VERIDIAN_IPFS_URL: {e}")))?;
                Arc::new(IpfsStore::new(base))
            }
            Err(_) => {
                tracing::warn!("VERIDIAN_IPFS_URL not set; using in-memory content store");
                Arc::new(InMemoryStore::new())
            }
        };

        let issuer_key = match std::env::var("VERIDIAN_ISSUER_SEED") {
            Ok(seed) => DidKey::from_seed_hex(&seed)
                .map_err(|e| VeridianError::Config(format!("VERIDIAN_ISSUER_SEED: {e}")))?,
            Err(_) => {
                tracing::warn!("VERIDIAN_ISSUER_SEED not set; generating an ephemeral issuer key");
                DidKey::generate()
            }
        };

        Ok(Self::assemble(
            chain,
            store,
            issuer_key,
            std::env::var("VERIDIAN_ISSUER_NAME").unwrap_or_else(|_| "Veridian Issuer".into()),
            std::env::var("VERIDIAN_PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:4000".into()),
        ))
    }
}

fn require_env(name: &str) -> Result<String, VeridianError> {
    std::env::var(name).map_err(|_| VeridianError::Config(format!("{name} must be set")))
}
