//! Issuance request types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::Address;
use crate::error::VeridianError;

/// Display hints the frontend uses when rendering the credential.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayHints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_url: Option<String>,
}

/// Caller input for issuing a single credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    pub subject_name: String,

    /// Also the idempotency key for subject DID resolution.
    pub subject_email: String,

    pub credential_type: String,

    /// Achievement attributes (course, program, grade, ...).
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Optional wallet the subject wants the anchor bound to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_address: Option<Address>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayHints>,
}

impl IssueRequest {
    /// Field presence check. Runs before any side effect.
    pub fn validate(&self) -> Result<(), VeridianError> {
        let mut missing = Vec::new();
        if self.subject_name.trim().is_empty() {
            missing.push("subjectName");
        }
        if self.subject_email.trim().is_empty() {
            missing.push("subjectEmail");
        }
        if self.credential_type.trim().is_empty() {
            missing.push("credentialType");
        }
        if !missing.is_empty() {
            return Err(VeridianError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_reports_all_missing_fields() {
        let req = IssueRequest {
            subject_name: "".into(),
            subject_email: "  ".into(),
            credential_type: "Diploma".into(),
            attributes: Default::default(),
            expires_at: None,
            subject_address: None,
            display: None,
        };
        let err = req.validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("subjectName"));
        assert!(msg.contains("subjectEmail"));
        assert!(!msg.contains("credentialType"));
    }
}
