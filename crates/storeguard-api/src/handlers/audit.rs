//! Security event queries and reporting, administrators only

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storeguard_core::{
    Actor, AppError, SecurityEvent, SecurityEventKind, Severity,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::AuthenticatedActor;
use crate::constants::MAX_AUDIT_LIMIT;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::ip_extraction::ClientOrigin;

#[derive(Debug, Serialize, ToSchema)]
pub struct SecurityEventResponse {
    pub id: Uuid,
    pub kind: String,
    pub actor_id: String,
    pub actor_name: String,
    pub detail: String,
    pub origin: String,
    pub severity: String,
    pub success: bool,
    pub occurred_at: DateTime<Utc>,
}

impl From<SecurityEvent> for SecurityEventResponse {
    fn from(event: SecurityEvent) -> Self {
        Self {
            id: event.id,
            kind: event.kind.to_string(),
            actor_id: event.actor_id,
            actor_name: event.actor_name,
            detail: event.detail,
            origin: event.origin,
            severity: event.severity.to_string(),
            success: event.success,
            occurred_at: event.occurred_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentQuery {
    /// Maximum number of events, capped at 1000
    pub limit: Option<usize>,
}

/// Event reported by an identity collaborator (role changes, failed sign-ins).
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReportEventRequest {
    pub kind: String,
    #[serde(default)]
    pub detail: Option<String>,
    /// `Info`, `Warning` or `Critical` in any case; anything else is recorded as `Info`
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    /// Subject of the event; defaults to the reporting administrator
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub actor_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportEventResponse {
    pub id: Uuid,
}

/// Refuse non-administrators and leave a trace of the attempt.
async fn require_admin(
    state: &AppState,
    actor: &Actor,
    origin: &str,
    resource: &str,
) -> Result<(), AppError> {
    if actor.is_admin() {
        return Ok(());
    }

    state
        .security
        .audit
        .record(
            SecurityEvent::new(SecurityEventKind::UnauthorizedAccess)
                .with_actor(actor)
                .with_origin(origin)
                .with_detail(format!("Non-administrator requested {}", resource))
                .with_severity(Severity::Warning)
                .failed(),
        )
        .await;

    Err(AppError::Forbidden(
        "Administrator role required".to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/audit/recent",
    tag = "audit",
    params(RecentQuery),
    responses(
        (status = 200, description = "Newest events first", body = [SecurityEventResponse]),
        (status = 401, description = "Missing user identity", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse)
    )
)]
pub async fn recent_events(
    State(state): State<Arc<AppState>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ClientOrigin(origin): ClientOrigin,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<SecurityEventResponse>>, HttpAppError> {
    require_admin(&state, &actor, &origin, "recent security events").await?;

    let limit = query
        .limit
        .unwrap_or_else(|| state.config.audit_default_limit())
        .min(MAX_AUDIT_LIMIT);
    let events = state.security.audit.recent(limit).await?;

    Ok(Json(
        events.into_iter().map(SecurityEventResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/audit/actors/{actor_id}",
    tag = "audit",
    params(("actor_id" = String, Path, description = "Actor identifier")),
    responses(
        (status = 200, description = "Events for the actor, newest first", body = [SecurityEventResponse]),
        (status = 403, description = "Administrator role required", body = ErrorResponse)
    )
)]
pub async fn actor_events(
    State(state): State<Arc<AppState>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ClientOrigin(origin): ClientOrigin,
    Path(actor_id): Path<String>,
) -> Result<Json<Vec<SecurityEventResponse>>, HttpAppError> {
    require_admin(&state, &actor, &origin, "security events of another actor").await?;

    let events = state.security.audit.for_actor(&actor_id).await?;
    Ok(Json(
        events.into_iter().map(SecurityEventResponse::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/audit/events",
    tag = "audit",
    request_body = ReportEventRequest,
    responses(
        (status = 201, description = "Event recorded", body = ReportEventResponse),
        (status = 400, description = "Invalid event", body = ErrorResponse),
        (status = 403, description = "Administrator role required", body = ErrorResponse)
    )
)]
pub async fn report_event(
    State(state): State<Arc<AppState>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    ClientOrigin(origin): ClientOrigin,
    ValidatedJson(request): ValidatedJson<ReportEventRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    require_admin(&state, &actor, &origin, "to report a security event").await?;

    if request.kind.trim().is_empty() {
        return Err(AppError::InvalidInput("kind must not be empty".to_string()).into());
    }

    let subject = match request.actor_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => Actor::new(id, request.actor_name),
        None => actor.clone(),
    };

    let mut event = SecurityEvent::new(SecurityEventKind::from(request.kind.trim()))
        .with_actor(&subject)
        .with_origin(&origin)
        .with_severity(
            request
                .severity
                .as_deref()
                .map(Severity::parse)
                .unwrap_or(Severity::Info),
        );
    if let Some(detail) = request.detail {
        event = event.with_detail(detail);
    }
    if !request.success.unwrap_or(true) {
        event = event.failed();
    }

    let id = event.id;
    tracing::info!(
        event_id = %id,
        kind = %event.kind,
        reported_by = %actor.id,
        "Security event reported"
    );
    state.security.audit.record(event).await;

    Ok((StatusCode::CREATED, Json(ReportEventResponse { id })))
}
