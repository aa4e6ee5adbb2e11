//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storeguard API",
        version = "0.1.0",
        description = "Request inspection, guarded file intake and security audit trail. Callers are identified by the X-User-Id, X-User-Name and X-User-Roles headers set by the upstream identity service."
    ),
    paths(
        handlers::uploads::upload_artifact,
        handlers::uploads::list_artifacts,
        handlers::uploads::download_artifact,
        handlers::uploads::delete_artifact,
        handlers::audit::recent_events,
        handlers::audit::actor_events,
        handlers::audit::report_event,
        handlers::probe::probe,
        handlers::health::health_check,
    ),
    components(schemas(
        error::ErrorResponse,
        handlers::uploads::ArtifactResponse,
        handlers::audit::SecurityEventResponse,
        handlers::audit::ReportEventRequest,
        handlers::audit::ReportEventResponse,
        handlers::probe::ProbeResponse,
        handlers::health::HealthCheckResponse,
    )),
    tags(
        (name = "uploads", description = "Guarded file intake and download"),
        (name = "audit", description = "Security event trail (administrators)"),
        (name = "probe", description = "Request filter probe"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
