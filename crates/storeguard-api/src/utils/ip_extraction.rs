//! Origin address extraction
//!
//! `X-Forwarded-For` is only believed as far as the configured number of trusted
//! proxies; `X-Real-IP` and then the socket address are the fallbacks.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{request::Parts, Extensions, HeaderMap};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use storeguard_core::models::UNKNOWN;

use crate::state::AppState;

/// Origin address of the request, or `Unknown`.
#[derive(Debug, Clone)]
pub struct ClientOrigin(pub String);

impl FromRequestParts<Arc<AppState>> for ClientOrigin {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(ClientOrigin(client_origin(
            &parts.headers,
            &parts.extensions,
            state.security.trusted_proxy_count,
        )))
    }
}

/// Resolve the origin from headers and the `ConnectInfo` extension, if the server
/// was started with connect info.
pub fn client_origin(
    headers: &HeaderMap,
    extensions: &Extensions,
    trusted_proxy_count: usize,
) -> String {
    let socket_addr = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    extract_client_ip(headers, socket_addr.as_ref(), trusted_proxy_count)
}

pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    header_value(headers, "x-forwarded-for")
        .and_then(|chain| from_forwarded_for(chain, trusted_proxy_count))
        .or_else(|| {
            header_value(headers, "x-real-ip")
                .map(str::trim)
                .and_then(parse_ip)
        })
        .or_else(|| socket_addr.map(|addr| addr.ip()))
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Pick the client out of `client, proxy1, proxy2, ...`.
///
/// With N trusted proxies the last N hops are skipped. With none, or a chain too short
/// to contain them, only the hop closest to us is used.
fn from_forwarded_for(chain: &str, trusted_proxy_count: usize) -> Option<IpAddr> {
    let hops: Vec<&str> = chain
        .split(',')
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .collect();

    let position = if trusted_proxy_count == 0 || hops.len() <= trusted_proxy_count {
        hops.len().checked_sub(1)?
    } else {
        hops.len() - trusted_proxy_count - 1
    };

    hops.get(position).and_then(|hop| parse_ip(hop))
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    value.parse().ok()
}
