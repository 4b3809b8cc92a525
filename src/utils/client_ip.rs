use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Resolve the rate-limit key for a request.
///
/// Forwarding headers are only honored when the gateway sits behind a trusted
/// proxy; otherwise the connection's peer address is used.
pub fn extract_client_ip(
    headers: &HeaderMap,
    peer: Option<&SocketAddr>,
    trust_proxy: bool,
) -> String {
    if trust_proxy {
        if let Some(forwarded) = headers.get("x-forwarded-for")
            && let Ok(val) = forwarded.to_str()
            && let Some(ip) = val.split(',').next()
            && !ip.trim().is_empty()
        {
            return ip.trim().to_string();
        }
        if let Some(real_ip) = headers.get("x-real-ip")
            && let Ok(val) = real_ip.to_str()
            && !val.trim().is_empty()
        {
            return val.trim().to_string();
        }
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_peer_address_when_proxy_untrusted() {
        let peer: SocketAddr = "10.0.0.7:5123".parse().unwrap();
        let h = headers(&[("x-forwarded-for", "203.0.113.9")]);
        assert_eq!(extract_client_ip(&h, Some(&peer), false), "10.0.0.7");
    }

    #[test]
    fn test_forwarded_for_first_hop() {
        let peer: SocketAddr = "10.0.0.7:5123".parse().unwrap();
        let h = headers(&[("x-forwarded-for", "203.0.113.9, 10.0.0.1")]);
        assert_eq!(extract_client_ip(&h, Some(&peer), true), "203.0.113.9");
    }

    #[test]
    fn test_real_ip_then_fallbacks() {
        let h = headers(&[("x-real-ip", " 198.51.100.4 ")]);
        assert_eq!(extract_client_ip(&h, None, true), "198.51.100.4");
        assert_eq!(extract_client_ip(&HeaderMap::new(), None, true), "unknown");
    }
}
