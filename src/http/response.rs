//! Rendering of invocation responses for the caller.
//!
//! - `headers` are set as given
//! - 1.0 `multiValueHeaders` are appended
//! - 2.0 `cookies` become `Set-Cookie` headers
//! - base64-flagged bodies are decoded
//!
//! A status outside 100..=999 or an undecodable base64 body cannot be sent
//! as given, so the caller gets a 502 instead.

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::response::InvocationResponse;

pub fn render(invocation: InvocationResponse) -> Response {
    let Ok(status) = StatusCode::from_u16(invocation.status_code) else {
        tracing::error!(status_code = invocation.status_code, "Function returned an unusable status code");
        return bad_gateway();
    };
    let body = match invocation.decoded_body() {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "Function returned an undecodable base64 body");
            return bad_gateway();
        }
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in invocation.headers.iter().flatten() {
        if let Some((name, value)) = header_pair(name, value) {
            headers.insert(name, value);
        }
    }
    for (name, values) in invocation.multi_value_headers.iter().flatten() {
        for value in values {
            if let Some((name, value)) = header_pair(name, value) {
                headers.append(name, value);
            }
        }
    }
    for cookie in invocation.cookies.iter().flatten() {
        if let Ok(value) = HeaderValue::from_str(cookie) {
            headers.append(header::SET_COOKIE, value);
        }
    }

    response
}

fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
}

fn header_pair(name: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
    match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
        (Ok(name), Ok(value)) => Some((name, value)),
        _ => {
            tracing::warn!(header = %name, "Dropping invalid response header");
            None
        }
    }
}
