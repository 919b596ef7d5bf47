//! Institution registry types
//!
//! Institutions are the issuing entities tracked by the on-chain
//! registry. Only institutions that are both verified (admin gate)
//! and active may anchor new credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::Address;

/// On-chain institution record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    /// Registry address the institution issues from.
    pub address: Address,

    /// Human-readable name.
    pub name: String,

    /// Decentralized identifier of the institution.
    pub did: String,

    /// Admin-controlled trust gate. Reversible.
    pub verified: bool,

    /// Whether the institution is currently operating.
    pub active: bool,

    pub registered_at: DateTime<Utc>,
}

impl Institution {
    /// Whether this institution may issue credentials right now.
    pub fn may_issue(&self) -> bool {
        self.verified && self.active
    }
}
