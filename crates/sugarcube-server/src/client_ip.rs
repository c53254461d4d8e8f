//! Client address resolution.
//!
//! The server usually sits behind a reverse proxy, so the forwarding headers
//! win over the socket peer address.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{Extensions, HeaderMap, request::Parts},
};

use crate::error::ServerError;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Resolve the client address of a request.
///
/// Order: first `X-Forwarded-For` hop, then `X-Real-IP`, then the peer
/// address recorded by `into_make_service_with_connect_info`. Header values
/// that do not parse as an IP address are skipped.
pub fn resolve_client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|hop| hop.trim().parse().ok());

    forwarded
        .or_else(|| {
            headers
                .get(X_REAL_IP)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        })
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
}

/// Extractor for the resolved client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        resolve_client_ip(&parts.headers, &parts.extensions)
            .map(ClientIp)
            .ok_or_else(|| ServerError::BadRequest("Cannot determine client address".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    fn with_peer(addr: &str) -> Extensions {
        let mut ext = Extensions::new();
        ext.insert(ConnectInfo::<SocketAddr>(addr.parse().unwrap()));
        ext
    }

    #[test]
    fn test_forwarded_for_first_hop_wins() {
        let h = headers(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(
            resolve_client_ip(&h, &with_peer("127.0.0.1:5000")),
            Some("203.0.113.7".parse().unwrap())
        );
    }

    #[test]
    fn test_real_ip_fallback() {
        let h = headers(&[("x-real-ip", " 2001:db8::1 ")]);
        assert_eq!(
            resolve_client_ip(&h, &Extensions::new()),
            Some("2001:db8::1".parse().unwrap())
        );
    }

    #[test]
    fn test_peer_address_fallback() {
        let h = headers(&[("x-forwarded-for", "not-an-ip")]);
        assert_eq!(
            resolve_client_ip(&h, &with_peer("192.0.2.4:4444")),
            Some("192.0.2.4".parse().unwrap())
        );
    }

    #[test]
    fn test_nothing_known() {
        assert_eq!(resolve_client_ip(&HeaderMap::new(), &Extensions::new()), None);
    }
}
