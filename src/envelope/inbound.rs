//! Transport-independent view of an inbound HTTP request.
//!
//! The HTTP layer captures one of these per request. Envelope builders only
//! read it, so they never touch the server framework.

use axum::body::Bytes;
use base64::Engine;
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Source IP reported when the transport does not expose one.
pub const DEFAULT_SOURCE_IP: &str = "127.0.0.1";

const COOKIE_SEPARATOR: &str = "; ";

/// An inbound request as received by the routing layer.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub method: String,
    /// Path exactly as received, never decoded or re-encoded.
    pub path: String,
    /// Query string without the leading `?`.
    pub raw_query: String,
    pub protocol: String,
    /// Lower-cased header names, in arrival order, repeats kept.
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub source_ip: Option<IpAddr>,
}

impl InboundRequest {
    /// First value of a header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every `cookie` header line merged into one cookie string.
    pub fn cookie(&self) -> Option<String> {
        let lines: Vec<&str> = self
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("cookie"))
            .map(|(_, v)| v.as_str())
            .collect();
        (!lines.is_empty()).then(|| lines.join(COOKIE_SEPARATOR))
    }

    pub fn user_agent(&self) -> String {
        self.header("user-agent").unwrap_or_default().to_string()
    }

    pub fn source_ip(&self) -> String {
        self.source_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| DEFAULT_SOURCE_IP.to_string())
    }

    pub fn protocol(&self) -> &str {
        if self.protocol.is_empty() {
            "HTTP/1.1"
        } else {
            &self.protocol
        }
    }

    /// Body as sent to the function, and whether it had to be base64-encoded.
    pub fn body_string(&self) -> (String, bool) {
        normalize_body(&self.body, self.header("content-type"))
    }
}

/// Re-serialize a request body to a string.
///
/// JSON bodies are parsed and re-encoded, other text passes through, and
/// anything that is not UTF-8 is base64-encoded.
pub fn normalize_body(body: &[u8], content_type: Option<&str>) -> (String, bool) {
    if body.is_empty() {
        return (String::new(), false);
    }

    if content_type.map(is_json_content_type).unwrap_or(false) {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
            return (value.to_string(), false);
        }
    }

    match std::str::from_utf8(body) {
        Ok(text) => (text.to_string(), false),
        Err(_) => (base64::engine::general_purpose::STANDARD.encode(body), true),
    }
}

fn is_json_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Single-value header map; repeated headers are comma-joined, except
/// `cookie` lines, which are joined with `; `.
pub fn joined_headers(headers: &[(String, String)]) -> BTreeMap<String, String> {
    let mut joined: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let separator = if name.eq_ignore_ascii_case("cookie") { COOKIE_SEPARATOR } else { "," };
        joined
            .entry(name.clone())
            .and_modify(|existing| {
                existing.push_str(separator);
                existing.push_str(value);
            })
            .or_insert_with(|| value.clone());
    }
    joined
}

/// Single-value header map; the last value of a repeated header wins.
pub fn last_value_headers(headers: &[(String, String)]) -> BTreeMap<String, String> {
    headers.iter().cloned().collect()
}

/// Every value of every header.
pub fn multi_value_headers(headers: &[(String, String)]) -> BTreeMap<String, Vec<String>> {
    let mut multi: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        multi.entry(name.clone()).or_default().push(value.clone());
    }
    multi
}

/// Decoded `key=value` pairs of a raw query string, in order.
pub fn query_pairs(raw_query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(raw_query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
