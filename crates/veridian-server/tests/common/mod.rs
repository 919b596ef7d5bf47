//! Test utilities for integration tests

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use veridian_server::state::AppState;

/// Test application wrapper
pub struct TestApp {
    router: Router,
}

impl TestApp {
    /// Fully in-memory application: in-process chain registry and
    /// content store, generated issuer key.
    pub fn new() -> Self {
        let state = AppState::in_memory();
        let router = veridian_server::create_router(state);
        Self { router }
    }

    /// Application with no chain registry configured at all.
    pub fn without_chain() -> Self {
        let state = AppState::without_chain();
        let router = veridian_server::create_router(state);
        Self { router }
    }

    /// Get the router for making requests
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> Response<Body> {
        self.router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

/// Read a response body as JSON.
pub async fn json_body(res: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Read a response body as raw bytes.
pub async fn raw_body(res: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Assert a `{success: true, data}` envelope and return the data.
pub async fn expect_data(res: Response<Body>, expected: StatusCode) -> Value {
    assert_eq!(res.status(), expected, "unexpected status");
    let body = json_body(res).await;
    assert_eq!(body["success"], true, "expected success envelope: {body}");
    body["data"].clone()
}
