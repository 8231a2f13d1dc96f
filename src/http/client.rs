//! Client request helpers
//!
//! Resolve the originating client address and the externally visible URL
//! when running behind a reverse proxy.

use std::net::{Ipv6Addr, SocketAddr};

use hyper::header::{self, HeaderMap};
use hyper::Uri;

/// Resolve the client IP address
///
/// Order: `X-Real-IP`, `X-Forwarded-For`, then the socket peer. Only the first
/// comma separated element is used. A bare IPv6 address is returned as-is,
/// otherwise a trailing `:port` and surrounding brackets are removed.
pub fn client_ip(headers: &HeaderMap, remote_addr: Option<&SocketAddr>) -> String {
    let raw = header_value(headers, "x-real-ip")
        .or_else(|| header_value(headers, "x-forwarded-for"))
        .map(ToString::to_string)
        .or_else(|| remote_addr.map(ToString::to_string))
        .unwrap_or_default();

    let first = raw.split(',').next().unwrap_or_default().trim();

    if first.parse::<Ipv6Addr>().is_ok() {
        return first.to_string();
    }

    let without_port = match first.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => host,
        _ => first,
    };

    without_port
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string()
}

/// Reconstruct the full URL as the client requested it
///
/// The scheme comes from `X-Forwarded-Proto` (default `http`) and the
/// authority from `Host`, falling back to the request URI's authority.
pub fn full_url(uri: &Uri, headers: &HeaderMap) -> Option<Uri> {
    let scheme = header_value(headers, "x-forwarded-proto")
        .filter(|s| !s.is_empty())
        .unwrap_or("http");

    let authority = header_value(headers, header::HOST.as_str())
        .map(ToString::to_string)
        .or_else(|| uri.authority().map(ToString::to_string))?;

    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());

    Uri::builder()
        .scheme(scheme)
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .ok()
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
