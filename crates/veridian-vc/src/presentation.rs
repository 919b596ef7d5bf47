//! Verifiable Presentations
//!
//! A presentation bundles credentials under a holder proof. Verifying
//! the holder proof says nothing about the embedded credentials; the
//! verifier crate checks each of those independently.

use chrono::Utc;
use veridian_core::{Proof, ProofCheck, VcDocument, VpDocument};

use crate::did::DidKey;
use crate::proof::{ProofService, PROOF_TYPE_ED25519, W3C_CREDENTIALS_CONTEXT};
use crate::ProofError;

impl ProofService {
    /// Bundle credentials into a holder-signed presentation.
    pub fn issue_presentation(
        &self,
        credentials: Vec<VcDocument>,
        holder: &DidKey,
    ) -> Result<VpDocument, ProofError> {
        let mut vp = VpDocument {
            context: vec![W3C_CREDENTIALS_CONTEXT.to_string()],
            types: vec!["VerifiablePresentation".to_string()],
            holder: holder.did().to_string(),
            verifiable_credential: credentials,
            proof: None,
        };
        let canonical = serde_jcs::to_vec(&vp)
            .map_err(|e| ProofError::Canonicalization(e.to_string()))?;
        let signature = holder.sign(&canonical);
        vp.proof = Some(Proof {
            proof_type: PROOF_TYPE_ED25519.to_string(),
            created: Utc::now(),
            verification_method: holder.verification_method(),
            proof_purpose: "authentication".to_string(),
            proof_value: format!("z{}", bs58::encode(signature.to_bytes()).into_string()),
        });
        Ok(vp)
    }

    /// Verify the holder proof alone. Embedded credentials are returned
    /// for independent verification by the caller.
    pub fn verify_presentation<'a>(
        &self,
        vp: &'a VpDocument,
    ) -> (ProofCheck, &'a [VcDocument]) {
        let mut errors = Vec::new();

        match &vp.proof {
            None => errors.push("presentation carries no proof".to_string()),
            Some(proof) => {
                if proof.proof_type != PROOF_TYPE_ED25519 {
                    errors.push(format!("unsupported proof type: {}", proof.proof_type));
                } else if !proof.verification_method.starts_with(&vp.holder) {
                    errors.push("proof verification method does not belong to holder".into());
                } else if let Err(e) = self.check_signature(&vp.without_proof(), proof) {
                    errors.push(e.to_string());
                }
            }
        }

        let check = if errors.is_empty() {
            ProofCheck::ok()
        } else {
            ProofCheck::failed(errors)
        };
        (check, &vp.verifiable_credential)
    }
}
