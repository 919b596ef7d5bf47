//! Veridian Chain
//!
//! Blockchain gateway for the on-chain credential registry. The
//! [`ChainRegistry`] trait is the narrow interface the orchestrators
//! consume; [`JsonRpcRegistry`] talks to a real Polygon-compatible
//! endpoint, [`InMemoryRegistry`] backs tests and chainless deployments.

pub mod abi;
pub mod memory;
pub mod rpc;

pub use memory::InMemoryRegistry;
pub use rpc::JsonRpcRegistry;

use async_trait::async_trait;
use thiserror::Error;
use veridian_core::{
    Address, AnchorRequest, ChainCredential, ChainReceipt, CredentialId, Institution,
    ValidityTuple, VeridianError,
};

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Not found on chain: {0}")]
    NotFound(String),

    #[error("Chain unavailable: {0}")]
    Unavailable(String),

    #[error("Contract rejected: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for ChainError {
    fn from(err: reqwest::Error) -> Self {
        ChainError::Unavailable(err.to_string())
    }
}

impl From<ChainError> for VeridianError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::NotFound(what) => VeridianError::NotFound(what),
            ChainError::Unavailable(reason) => VeridianError::unavailable("blockchain", reason),
            ChainError::Rejected(reason) => VeridianError::ContractRejected(reason),
        }
    }
}

/// Read/write access to the on-chain credential registry.
///
/// All methods are network calls with bounded timeouts. `NotFound`
/// means the chain answered and the entity does not exist; it must
/// never be conflated with `Unavailable`.
#[async_trait]
pub trait ChainRegistry: Send + Sync {
    /// Fetch the raw credential record.
    async fn get_credential(&self, id: &CredentialId) -> Result<ChainCredential, ChainError>;

    /// Fetch the validity tuple for a credential.
    async fn validity(&self, id: &CredentialId) -> Result<ValidityTuple, ChainError>;

    /// Anchor a new credential. Irrevocable on success.
    async fn issue_credential(&self, anchor: &AnchorRequest) -> Result<ChainReceipt, ChainError>;

    /// Revoke a credential with a reason. Monotonic: there is no
    /// un-revoke.
    async fn revoke_credential(
        &self,
        id: &CredentialId,
        reason: &str,
    ) -> Result<ChainReceipt, ChainError>;

    /// Fetch an institution record.
    async fn get_institution(&self, address: &Address) -> Result<Institution, ChainError>;

    /// Register a new issuing institution.
    async fn register_institution(
        &self,
        institution: &Institution,
    ) -> Result<ChainReceipt, ChainError>;

    /// Flip the admin-controlled verification gate. Reversible.
    async fn set_institution_verified(
        &self,
        address: &Address,
        verified: bool,
    ) -> Result<ChainReceipt, ChainError>;

    /// Activate or deactivate an institution.
    async fn set_institution_active(
        &self,
        address: &Address,
        active: bool,
    ) -> Result<ChainReceipt, ChainError>;
}
