//! Admin API routes
//!
//! Institution management and credential revocation. All admin
//! endpoints require the `X-Admin-Key` header to match the
//! `VERIDIAN_ADMIN_KEY` environment variable.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use veridian_chain::ChainRegistry;
use veridian_core::{Address, CredentialId, Institution, VeridianError};

use crate::routes::{error_response, fail, ok};
use crate::state::AppState;

/// Admin API key authentication middleware.
pub async fn admin_auth_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let admin_key = std::env::var("VERIDIAN_ADMIN_KEY").unwrap_or_default();

    if admin_key.is_empty() {
        // no admin key configured: reject all admin requests
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let provided = request
        .headers()
        .get("X-Admin-Key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided != admin_key {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

fn chain_of(state: &AppState) -> Result<&dyn ChainRegistry, Response> {
    state
        .chain
        .as_deref()
        .ok_or_else(|| fail(StatusCode::SERVICE_UNAVAILABLE, "no chain registry configured"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInstitutionBody {
    pub address: String,
    pub name: String,
    pub did: String,
}

/// `POST /admin/institutions`
pub async fn register_institution(
    State(state): State<AppState>,
    Json(body): Json<RegisterInstitutionBody>,
) -> Response {
    let chain = match chain_of(&state) {
        Ok(chain) => chain,
        Err(response) => return response,
    };
    let address = match Address::parse(&body.address) {
        Ok(address) => address,
        Err(err) => return error_response(&err),
    };
    let institution = Institution {
        address,
        name: body.name,
        did: body.did,
        verified: false,
        active: true,
        registered_at: Utc::now(),
    };
    match chain.register_institution(&institution).await {
        Ok(receipt) => (StatusCode::CREATED, ok(receipt)).into_response(),
        Err(err) => error_response(&VeridianError::from(err)),
    }
}

/// `GET /admin/institutions/:address`
pub async fn get_institution(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Response {
    let chain = match chain_of(&state) {
        Ok(chain) => chain,
        Err(response) => return response,
    };
    let address = match Address::parse(&address) {
        Ok(address) => address,
        Err(err) => return error_response(&err),
    };
    match chain.get_institution(&address).await {
        Ok(institution) => ok(institution).into_response(),
        Err(err) => error_response(&VeridianError::from(err)),
    }
}

#[derive(Debug, Deserialize)]
pub struct SetVerifiedBody {
    pub verified: bool,
}

/// `POST /admin/institutions/:address/verified`
pub async fn set_institution_verified(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(body): Json<SetVerifiedBody>,
) -> Response {
    let chain = match chain_of(&state) {
        Ok(chain) => chain,
        Err(response) => return response,
    };
    let address = match Address::parse(&address) {
        Ok(address) => address,
        Err(err) => return error_response(&err),
    };
    match chain.set_institution_verified(&address, body.verified).await {
        Ok(receipt) => ok(receipt).into_response(),
        Err(err) => error_response(&VeridianError::from(err)),
    }
}

#[derive(Debug, Deserialize)]
pub struct SetActiveBody {
    pub active: bool,
}

/// `POST /admin/institutions/:address/active`
pub async fn set_institution_active(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(body): Json<SetActiveBody>,
) -> Response {
    let chain = match chain_of(&state) {
        Ok(chain) => chain,
        Err(response) => return response,
    };
    let address = match Address::parse(&address) {
        Ok(address) => address,
        Err(err) => return error_response(&err),
    };
    match chain.set_institution_active(&address, body.active).await {
        Ok(receipt) => ok(receipt).into_response(),
        Err(err) => error_response(&VeridianError::from(err)),
    }
}

#[derive(Debug, Deserialize)]
pub struct RevokeBody {
    pub reason: String,
}

/// `POST /admin/credentials/:id/revoke`
pub async fn revoke_credential(
    State(state): State<AppState>,
    Path(credential_id): Path<String>,
    Json(body): Json<RevokeBody>,
) -> Response {
    if body.reason.trim().is_empty() {
        return fail(StatusCode::BAD_REQUEST, "revocation reason is required");
    }
    match state
        .issuer
        .revoke(&CredentialId::new(credential_id), &body.reason)
        .await
    {
        Ok(receipt) => ok(receipt).into_response(),
        Err(err) => error_response(&err),
    }
}
