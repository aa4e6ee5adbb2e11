use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderMap};
use storeguard_core::models::security_event::MAX_ACTOR_ID_LEN;
use storeguard_core::{Actor, AppError};

use crate::constants::{USER_ID_HEADER, USER_NAME_HEADER, USER_ROLES_HEADER};
use crate::error::HttpAppError;

/// Actor making the request, read from `X-User-Id`, `X-User-Name` and `X-User-Roles`.
///
/// Rejects with 401 when no usable user id is present.
#[derive(Debug, Clone)]
pub struct AuthenticatedActor(pub Actor);

impl AuthenticatedActor {
    pub fn from_headers(headers: &HeaderMap) -> Option<Actor> {
        let id = header_str(headers, USER_ID_HEADER)
            .filter(|id| id.chars().count() <= MAX_ACTOR_ID_LEN)?;

        let name = header_str(headers, USER_NAME_HEADER).map(str::to_string);
        let roles = header_str(headers, USER_ROLES_HEADER)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|role| !role.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Actor::new(id, name).with_roles(roles))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl<S> FromRequestParts<S> for AuthenticatedActor
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
            .map(AuthenticatedActor)
            .ok_or_else(|| {
                HttpAppError(AppError::Unauthorized(
                    "Missing or invalid user identity".to_string(),
                ))
            })
    }
}
