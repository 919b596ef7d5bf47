//! Veridian Store
//!
//! Content-addressed storage gateway. Retrieval is content-addressed:
//! `get` returns exactly the bytes that were `put`, or fails. Reads
//! carry a wall-clock timeout and a hard size cap enforced while
//! streaming; content shape (JSON/text/binary) is sniffed from the
//! bytes on read, never assumed.

pub mod ipfs;
pub mod memory;

pub use ipfs::IpfsStore;
pub use memory::InMemoryStore;

use async_trait::async_trait;
use thiserror::Error;
use veridian_core::{Cid, VeridianError};

/// Default wall-clock budget for a single retrieval.
pub const DEFAULT_GET_TIMEOUT_SECS: u64 = 30;

/// Hard resource-exhaustion guard: 50 MB.
pub const DEFAULT_MAX_CONTENT_SIZE: usize = 50 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Content not found: {0}")]
    NotFound(String),

    #[error("Content retrieval timed out after {0}s")]
    Timeout(u64),

    #[error("Content exceeds size cap of {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Content store unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::Timeout(DEFAULT_GET_TIMEOUT_SECS)
        } else {
            StoreError::Unavailable(err.to_string())
        }
    }
}

impl From<StoreError> for VeridianError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => VeridianError::NotFound(what),
            StoreError::TooLarge { limit } => VeridianError::TooLarge { limit },
            StoreError::Timeout(secs) => {
                VeridianError::unavailable("content store", format!("timed out after {secs}s"))
            }
            StoreError::Unavailable(reason) => VeridianError::unavailable("content store", reason),
        }
    }
}

/// Content-addressed put/get.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store bytes, optionally pinning them against garbage collection.
    /// Issuance always pins: a transient write must not later vanish.
    async fn put(&self, bytes: Vec<u8>, pin: bool) -> Result<Cid, StoreError>;

    /// Retrieve the exact bytes previously stored under `cid`.
    async fn get(&self, cid: &Cid) -> Result<Vec<u8>, StoreError>;
}
