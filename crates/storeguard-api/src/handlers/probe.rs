//! Filter probe
//!
//! Does nothing itself: the request filter middleware has already inspected the
//! query string and form body by the time this runs.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::ErrorResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProbeResponse {
    pub accepted: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/probe",
    tag = "probe",
    params(("input" = Option<String>, Query, description = "Value to run through the request filter")),
    responses(
        (status = 200, description = "Input accepted", body = ProbeResponse),
        (status = 400, description = "Invalid request detected", body = ErrorResponse)
    )
)]
pub async fn probe() -> Json<ProbeResponse> {
    Json(ProbeResponse { accepted: true })
}
