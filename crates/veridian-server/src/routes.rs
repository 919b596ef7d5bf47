//! HTTP route handlers
//!
//! Every endpoint answers a `{success, data | error}` envelope. Caller
//! input is parsed explicitly so malformed bodies map to 400 rather
//! than falling through as extractor rejections.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use veridian_core::{
    Cid, ContentKind, CredentialId, IssueRequest, VcDocument, VeridianError, VpDocument,
};

use crate::state::AppState;

/// Uniform response envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        success: true,
        data: Some(data),
        error: None,
    })
}

pub fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(Envelope::<()> {
            success: false,
            data: None,
            error: Some(message.into()),
        }),
    )
        .into_response()
}

pub fn error_response(err: &VeridianError) -> Response {
    let status = match err {
        VeridianError::Validation(_) => StatusCode::BAD_REQUEST,
        VeridianError::NotFound(_) => StatusCode::NOT_FOUND,
        VeridianError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        VeridianError::TooLarge { .. } => StatusCode::BAD_GATEWAY,
        VeridianError::ContractRejected(_) => StatusCode::CONFLICT,
        VeridianError::Proof(_)
        | VeridianError::Serialization(_)
        | VeridianError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    fail(status, err.to_string())
}

fn parse_body<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, Response> {
    serde_json::from_value(value)
        .map_err(|e| fail(StatusCode::BAD_REQUEST, format!("malformed request: {e}")))
}

fn requester_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Requester")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

// ── Issuance ────────────────────────────────────────────────────

/// `POST /credentials/issue`
pub async fn issue_credential(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let request: IssueRequest = match parse_body(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    match state.issuer.issue(request).await {
        Ok(receipt) => (StatusCode::CREATED, ok(receipt)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[derive(Debug, Deserialize)]
struct BatchBody {
    requests: Vec<serde_json::Value>,
}

/// `POST /credentials/issue/batch`
///
/// Entries that fail to parse are reported in the outcome's error list
/// alongside entries that failed during issuance; the batch itself
/// always answers 200 with a full partition.
pub async fn issue_batch(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let batch: BatchBody = match parse_body(body) {
        Ok(batch) => batch,
        Err(response) => return response,
    };

    let mut parsed = Vec::new();
    let mut parse_errors = Vec::new();
    for (index, entry) in batch.requests.into_iter().enumerate() {
        match serde_json::from_value::<IssueRequest>(entry) {
            Ok(request) => parsed.push((index, request)),
            Err(e) => parse_errors.push(veridian_core::BatchError {
                index,
                subject_email: String::new(),
                error: format!("malformed entry: {e}"),
            }),
        }
    }

    let mut outcome = state
        .issuer
        .batch_issue(parsed.iter().map(|(_, r)| r.clone()).collect())
        .await;
    // re-map indices of issuance errors back to the caller's input
    // positions, then append the parse failures
    for error in &mut outcome.errors {
        error.index = parsed[error.index].0;
    }
    outcome.errors.extend(parse_errors);

    ok(outcome).into_response()
}

// ── Verification ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "includeMetadata", default)]
    pub include_metadata: bool,
}

/// `GET /verify/:credential_id`
pub async fn verify_credential(
    State(state): State<AppState>,
    Path(credential_id): Path<String>,
    Query(params): Query<VerifyParams>,
    headers: HeaderMap,
) -> Response {
    let Some(verifier) = &state.verifier else {
        return fail(
            StatusCode::SERVICE_UNAVAILABLE,
            "no chain registry configured",
        );
    };
    match verifier
        .verify(
            &CredentialId::new(credential_id),
            params.include_metadata,
            requester_of(&headers),
        )
        .await
    {
        Ok(verdict) => ok(verdict).into_response(),
        Err(err) => error_response(&err),
    }
}

/// `POST /verify/credential`: verify a caller-supplied VC document.
pub async fn verify_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let Some(verifier) = &state.verifier else {
        return fail(
            StatusCode::SERVICE_UNAVAILABLE,
            "no chain registry configured",
        );
    };
    let doc: VcDocument = match parse_body(body) {
        Ok(doc) => doc,
        Err(response) => return response,
    };
    ok(verifier.verify_document(&doc, requester_of(&headers)).await).into_response()
}

/// `POST /verify/presentation`
pub async fn verify_presentation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    let Some(verifier) = &state.verifier else {
        return fail(
            StatusCode::SERVICE_UNAVAILABLE,
            "no chain registry configured",
        );
    };
    let vp: VpDocument = match parse_body(body) {
        Ok(vp) => vp,
        Err(response) => return response,
    };
    ok(verifier.verify_presentation(&vp, requester_of(&headers)).await).into_response()
}

// ── Content ─────────────────────────────────────────────────────

/// What the caller uploaded, resolved at the boundary. The store only
/// ever sees bytes.
enum UploadPayload {
    Text(String),
    Json(serde_json::Value),
    Raw(Vec<u8>),
}

impl UploadPayload {
    fn classify(content_type: Option<&str>, bytes: &Bytes) -> Result<Self, String> {
        match content_type {
            Some(ct) if ct.starts_with("application/json") => {
                match serde_json::from_slice::<serde_json::Value>(bytes) {
                    Ok(serde_json::Value::String(s)) => Ok(UploadPayload::Text(s)),
                    Ok(value) => Ok(UploadPayload::Json(value)),
                    Err(e) => Err(format!("malformed JSON body: {e}")),
                }
            }
            Some(ct) if ct.starts_with("text/") => {
                String::from_utf8(bytes.to_vec())
                    .map(UploadPayload::Text)
                    .map_err(|_| "text body is not valid UTF-8".to_string())
            }
            _ => Ok(UploadPayload::Raw(bytes.to_vec())),
        }
    }

    fn into_bytes(self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            UploadPayload::Text(s) => Ok(s.into_bytes()),
            UploadPayload::Json(value) => serde_json::to_vec(&value),
            UploadPayload::Raw(bytes) => Ok(bytes),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub cid: Cid,
    pub size: usize,
    pub kind: ContentKind,
}

/// `POST /content`: upload arbitrary content, pinned.
pub async fn upload_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let payload = match UploadPayload::classify(content_type, &body) {
        Ok(payload) => payload,
        Err(message) => return fail(StatusCode::BAD_REQUEST, message),
    };
    let bytes = match payload.into_bytes() {
        Ok(bytes) => bytes,
        Err(e) => return fail(StatusCode::BAD_REQUEST, e.to_string()),
    };
    if bytes.is_empty() {
        return fail(StatusCode::BAD_REQUEST, "empty upload");
    }

    let kind = ContentKind::sniff(&bytes);
    let size = bytes.len();
    match state.store.put(bytes, true).await {
        Ok(cid) => (StatusCode::CREATED, ok(UploadResult { cid, size, kind })).into_response(),
        Err(err) => error_response(&err.into()),
    }
}

/// `GET /content/:cid`: raw bytes with a sniffed content type.
pub async fn get_content(State(state): State<AppState>, Path(cid): Path<String>) -> Response {
    match state.store.get(&Cid::new(cid)).await {
        Ok(bytes) => {
            let kind = ContentKind::sniff(&bytes);
            ([(header::CONTENT_TYPE, kind.mime())], bytes).into_response()
        }
        Err(err) => error_response(&err.into()),
    }
}

// ── Health ──────────────────────────────────────────────────────

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "issuerDid": state.issuer.issuer_did(),
        "chainConfigured": state.chain.is_some(),
    }))
}
