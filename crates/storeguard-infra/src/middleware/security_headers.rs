use axum::extract::State;
use axum::http::HeaderValue;
use axum::{extract::Request, middleware::Next, response::Response};

/// Which optional headers to emit.
#[derive(Clone, Copy, Debug, Default)]
pub struct SecurityHeaderPolicy {
    /// Send `Strict-Transport-Security`; only meaningful behind HTTPS.
    pub hsts: bool,
}

impl SecurityHeaderPolicy {
    pub fn for_environment(is_production: bool) -> Self {
        Self { hsts: is_production }
    }
}

/// Adds security headers to all HTTP responses.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn security_headers_middleware(
    State(policy): State<SecurityHeaderPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    if policy.hsts {
        headers.insert(
            "Strict-Transport-Security",
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    // JSON API and attachment downloads only; nothing is ever rendered.
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );

    response
}
