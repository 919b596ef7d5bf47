//! Veridian Server Library
//!
//! HTTP server for the Veridian credential platform. The library
//! exposes the router and state for integration testing; the binary
//! handles startup.

pub mod admin;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Admin sub-router (behind auth middleware)
fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/institutions", post(admin::register_institution))
        .route("/institutions/:address", get(admin::get_institution))
        .route(
            "/institutions/:address/verified",
            post(admin::set_institution_verified),
        )
        .route(
            "/institutions/:address/active",
            post(admin::set_institution_active),
        )
        .route("/credentials/:id/revoke", post(admin::revoke_credential))
        .layer(axum_middleware::from_fn(admin::admin_auth_middleware))
}

/// Build CORS layer based on environment.
///
/// `VERIDIAN_CORS_ORIGINS`: comma-separated allowed origins
/// (default: `*`, development mode).
fn cors_layer() -> CorsLayer {
    let origins = std::env::var("VERIDIAN_CORS_ORIGINS").unwrap_or_else(|_| "*".into());

    let allow_origin = if origins.trim() == "*" {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .max_age(std::time::Duration::from_secs(3600))
}

fn core_routes() -> Router<AppState> {
    Router::new()
        // Issuance
        .route("/credentials/issue", post(routes::issue_credential))
        .route("/credentials/issue/batch", post(routes::issue_batch))
        // Verification
        .route("/verify/:credential_id", get(routes::verify_credential))
        .route("/verify/credential", post(routes::verify_document))
        .route("/verify/presentation", post(routes::verify_presentation))
        // Content store
        .route("/content", post(routes::upload_content))
        .route("/content/:cid", get(routes::get_content))
        // Health check
        .route("/health", get(routes::health))
        // Admin API
        .nest("/admin", admin_router())
}

/// Create the main router with all routes configured
pub fn create_router(state: AppState) -> Router {
    core_routes()
        .with_state(state)
        .layer(axum_middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}
