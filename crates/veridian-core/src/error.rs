//! Error taxonomy for Veridian operations
//!
//! Validation and not-found errors abort and propagate to the caller.
//! Unavailability of a non-authoritative collaborator is never surfaced
//! through this type from the core orchestrators; it is recorded inside
//! verdicts and receipts instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VeridianError {
    /// Malformed or missing caller input. No side effects performed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced entity does not exist. Terminal, never retried.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A collaborator is unreachable or timed out on an authoritative
    /// path with no fallback.
    #[error("{component} unavailable: {reason}")]
    Unavailable { component: String, reason: String },

    /// Content exceeded the configured size cap during retrieval.
    #[error("Content exceeds size cap of {limit} bytes")]
    TooLarge { limit: usize },

    /// Cryptographic proof creation or verification failed.
    #[error("Proof error: {0}")]
    Proof(String),

    /// On-chain write reverted (unverified issuer, duplicate id, ...).
    #[error("Contract rejected transaction: {0}")]
    ContractRejected(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl VeridianError {
    pub fn unavailable(component: impl Into<String>, reason: impl Into<String>) -> Self {
        VeridianError::Unavailable {
            component: component.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for VeridianError {
    fn from(err: serde_json::Error) -> Self {
        VeridianError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_names_the_failing_component() {
        let err = VeridianError::unavailable("blockchain", "rpc timeout");
        assert_eq!(err.to_string(), "blockchain unavailable: rpc timeout");
        assert!(matches!(err, VeridianError::Unavailable { .. }));
    }

    #[test]
    fn errors_implement_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        assert_error(&VeridianError::unavailable("content store", "down"));
        assert_error(&VeridianError::Validation("empty subject".into()));
    }
}
