//! Capture of inbound requests.
//!
//! Turns the pieces axum hands a handler into an [`InboundRequest`] so the
//! envelope builders never see the server framework.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri, Version};
use std::net::SocketAddr;

use crate::envelope::InboundRequest;

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Header pairs in arrival order. Names are already lower-case in a
/// `HeaderMap`; values that are not valid UTF-8 are decoded lossily.
pub fn header_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

pub fn protocol(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

/// Build the transport-independent request. The path is kept exactly as
/// received.
pub fn inbound_request(
    method: &Method,
    uri: &Uri,
    version: Version,
    headers: &HeaderMap,
    body: Bytes,
    peer: Option<SocketAddr>,
) -> InboundRequest {
    InboundRequest {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        raw_query: uri.query().unwrap_or_default().to_string(),
        protocol: protocol(version).to_string(),
        headers: header_pairs(headers),
        body,
        source_ip: peer.map(|addr| addr.ip()),
    }
}

/// Correlation id set by the request-id layer, if any.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
