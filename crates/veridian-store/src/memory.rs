//! In-memory content store
//!
//! Content ids are derived from a SHA3-256 multihash of the bytes, so
//! the round-trip property `get(put(b)) == b` holds exactly as it does
//! against a real node. The size cap applies on reads, keeping the
//! oversize path testable.

use sha3::{Digest, Sha3_256};
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use veridian_core::Cid;

use crate::{ContentStore, StoreError, DEFAULT_MAX_CONTENT_SIZE};

// SHA3-256 multihash prefix (code 0x16, length 0x20).
const MULTIHASH_PREFIX: [u8; 2] = [0x16, 0x20];

struct Stored {
    bytes: Vec<u8>,
    pinned: bool,
}

pub struct InMemoryStore {
    objects: RwLock<HashMap<String, Stored>>,
    max_size: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_CONTENT_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            max_size,
        }
    }

    /// Whether the object is pinned. Test hook for pin semantics.
    pub fn is_pinned(&self, cid: &Cid) -> bool {
        self.objects
            .read()
            .map(|objects| {
                objects
                    .get(cid.as_str())
                    .map(|stored| stored.pinned)
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    }

    fn derive_cid(bytes: &[u8]) -> Cid {
        let mut hasher = Sha3_256::new();
        hasher.update(bytes);
        let digest = hasher.finalize();
        let mut multihash = Vec::with_capacity(2 + digest.len());
        multihash.extend_from_slice(&MULTIHASH_PREFIX);
        multihash.extend_from_slice(&digest);
        Cid::new(format!("z{}", bs58::encode(multihash).into_string()))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn put(&self, bytes: Vec<u8>, pin: bool) -> Result<Cid, StoreError> {
        let cid = Self::derive_cid(&bytes);
        let mut objects = self
            .objects
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let entry = objects
            .entry(cid.as_str().to_string())
            .or_insert(Stored { bytes, pinned: pin });
        // re-adding with pin upgrades an unpinned object
        entry.pinned |= pin;
        Ok(cid)
    }

    async fn get(&self, cid: &Cid) -> Result<Vec<u8>, StoreError> {
        let objects = self
            .objects
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let stored = objects
            .get(cid.as_str())
            .ok_or_else(|| StoreError::NotFound(cid.to_string()))?;
        if stored.bytes.len() > self.max_size {
            return Err(StoreError::TooLarge {
                limit: self.max_size,
            });
        }
        Ok(stored.bytes.clone())
    }
}
