//! Route configuration and setup

use crate::constants::{API_PREFIX, HTTP_CONCURRENCY_LIMIT, MULTIPART_OVERHEAD_BYTES};
use crate::handlers;
use crate::middleware::request_filter_middleware;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Json, Router,
};
use std::sync::Arc;
use storeguard_core::Config;
use storeguard_infra::{request_id_middleware, security_headers_middleware, SecurityHeaderPolicy};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
///
/// Outermost first: request id, security headers, tracing, body limit, concurrency limit,
/// request filter.
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router<()> {
    let upload_limit = config.max_upload_bytes() + MULTIPART_OVERHEAD_BYTES;
    let body_limit = upload_limit.max(config.max_form_body_bytes());

    let upload_routes = Router::new()
        .route(
            &format!("{}/uploads", API_PREFIX),
            post(handlers::uploads::upload_artifact)
                .get(handlers::uploads::list_artifacts)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            &format!("{}/uploads/{{id}}", API_PREFIX),
            delete(handlers::uploads::delete_artifact),
        )
        .route(
            &format!("{}/uploads/{{id}}/file", API_PREFIX),
            get(handlers::uploads::download_artifact),
        );

    let audit_routes = Router::new()
        .route(
            &format!("{}/audit/recent", API_PREFIX),
            get(handlers::audit::recent_events),
        )
        .route(
            &format!("{}/audit/actors/{{actor_id}}", API_PREFIX),
            get(handlers::audit::actor_events),
        )
        .route(
            &format!("{}/audit/events", API_PREFIX),
            post(handlers::audit::report_event),
        );

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            &format!("{}/probe", API_PREFIX),
            get(handlers::probe::probe).post(handlers::probe::probe),
        )
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::ApiDoc::openapi()) }),
        );

    let security_headers = SecurityHeaderPolicy::for_environment(config.is_production());

    public_routes
        .merge(upload_routes)
        .merge(audit_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            request_filter_middleware,
        ))
        .layer(ConcurrencyLimitLayer::new(HTTP_CONCURRENCY_LIMIT))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            security_headers,
            security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}
