//! Request filter middleware
//!
//! Runs before routing reaches any handler. Query parameters are always inspected;
//! `POST`/`PUT`/`PATCH` bodies are inspected only when declared as
//! `application/x-www-form-urlencoded`. Other bodies pass through untouched.
//!
//! A rejection answers with the fixed 400 body and records a `RequestBlocked` event;
//! the handler never runs.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use storeguard_core::{AppError, SecurityEvent, SecurityEventKind, Severity};
use storeguard_infra::get_request_id;
use storeguard_inspect::{parse_urlencoded, FieldSource, InspectionFinding, Verdict};

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::ip_extraction::client_origin;

pub async fn request_filter_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let filter = state.security.filter;

    let query_fields = request.uri().query().map(parse_urlencoded);
    if let Some(fields) = query_fields {
        if let Verdict::Rejected(finding) = filter.filter(FieldSource::Query, fields) {
            let event = blocked_event(&state, &request, &finding);
            return reject(&state, event, finding).await;
        }
    }

    if !carries_form_body(request.method(), request.headers()) {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, state.security.max_form_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Form body could not be buffered for inspection");
            return HttpAppError(AppError::PayloadTooLarge(
                "Form body exceeds the inspection limit".to_string(),
            ))
            .into_response();
        }
    };

    let fields = parse_urlencoded(&String::from_utf8_lossy(&bytes));
    let request = Request::from_parts(parts, Body::from(bytes));
    if let Verdict::Rejected(finding) = filter.filter(FieldSource::Form, fields) {
        let event = blocked_event(&state, &request, &finding);
        return reject(&state, event, finding).await;
    }

    next.run(request).await
}

fn carries_form_body(method: &Method, headers: &HeaderMap) -> bool {
    let has_body_method = matches!(*method, Method::POST | Method::PUT | Method::PATCH);
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            mime.trim()
                .eq_ignore_ascii_case("application/x-www-form-urlencoded")
        })
        .unwrap_or(false);
    has_body_method && is_form
}

/// Log the block and describe it as a `RequestBlocked` event.
fn blocked_event(
    state: &AppState,
    request: &Request,
    finding: &InspectionFinding,
) -> SecurityEvent {
    let origin = client_origin(
        request.headers(),
        request.extensions(),
        state.security.trusted_proxy_count,
    );

    tracing::warn!(
        target: "security",
        method = %request.method(),
        path = %request.uri().path(),
        source = %finding.source,
        field = %finding.field,
        category = %finding.category,
        rule = %finding.rule,
        value = %finding.value,
        origin = %origin,
        request_id = ?get_request_id(request),
        "Request blocked by input filter"
    );

    SecurityEvent::new(SecurityEventKind::RequestBlocked)
        .with_detail(format!(
            "{} {} {}",
            request.method(),
            request.uri().path(),
            finding.summary()
        ))
        .with_origin(&origin)
        .with_severity(Severity::Warning)
        .failed()
}

async fn reject(state: &AppState, event: SecurityEvent, finding: InspectionFinding) -> Response {
    state.security.audit.record(event).await;
    HttpAppError(finding.to_error()).into_response()
}
