//! Direct invocation listener.
//!
//! Serves `POST /2015-03-31/functions/{function_name}/invocations`, the
//! function service's invoke API. `X-Amz-Invocation-Type` picks the mode:
//!
//! - `RequestResponse` (default): forward the raw payload, return the runtime reply
//! - `Event`: queue the invocation, answer 202 at once
//! - `DryRun`: answer 204 if the function exists

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::gateway::Gateway;
use crate::invoker::{InvocationType, RawReply, FUNCTION_ERROR_HEADER, INVOCATION_TYPE_HEADER};

pub const INVOKE_ROUTE: &str = "/2015-03-31/functions/{function_name}/invocations";

pub fn build_router(gateway: Arc<Gateway>) -> Router {
    let body_limit = gateway.config().limits.max_body_bytes;

    Router::new()
        .route(INVOKE_ROUTE, post(invoke))
        .with_state(gateway)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

async fn invoke(
    State(gateway): State<Arc<Gateway>>,
    Path(function_name): Path<String>,
    headers: HeaderMap,
    payload: Bytes,
) -> Response {
    let invocation_type = match headers
        .get(INVOCATION_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::parse::<InvocationType>)
        .transpose()
    {
        Ok(invocation_type) => invocation_type.unwrap_or_default(),
        Err(e) => return service_error(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let invoker = gateway.invoker();
    if !invoker.endpoints().contains(&function_name) {
        return service_error(StatusCode::NOT_FOUND, format!("Function not found: {function_name}"));
    }

    tracing::info!(function = %function_name, invocation_type = %invocation_type, "Direct invoke");

    match invocation_type {
        InvocationType::DryRun => StatusCode::NO_CONTENT.into_response(),
        InvocationType::Event => {
            let pending = invoker.invoke_raw(&function_name, payload, InvocationType::Event);
            tokio::spawn(async move {
                let outcome = match pending.await {
                    Ok(reply) => reply.ensure_success(&function_name).map(|_| ()),
                    Err(e) => Err(e),
                };
                if let Err(e) = outcome {
                    tracing::warn!(function = %function_name, error = %e, "Asynchronous invoke failed");
                }
            });
            StatusCode::ACCEPTED.into_response()
        }
        InvocationType::RequestResponse => {
            match invoker
                .invoke_raw(&function_name, payload, InvocationType::RequestResponse)
                .await
            {
                Ok(reply) => passthrough(reply),
                Err(e) => e.into_response(),
            }
        }
    }
}

/// The runtime's reply with only the headers the invoke API exposes.
fn passthrough(reply: RawReply) -> Response {
    let mut response = (reply.status, reply.body).into_response();
    let headers = response.headers_mut();
    headers.remove(header::CONTENT_TYPE);

    if let Some(value) = reply.content_type.and_then(|v| HeaderValue::from_str(&v).ok()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Some(value) = reply.function_error.and_then(|v| HeaderValue::from_str(&v).ok()) {
        headers.insert(FUNCTION_ERROR_HEADER, value);
    }
    response
}

fn service_error(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "Message": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn router() -> Router {
        let mut config = GatewayConfig::default();
        config.functions.insert("calc".into(), "http://127.0.0.1:9".into());
        build_router(Arc::new(Gateway::new(config).unwrap()))
    }

    fn invoke_request(function: &str, invocation_type: Option<&str>) -> Request<Body> {
        let mut builder = Request::post(format!("/2015-03-31/functions/{function}/invocations"));
        if let Some(invocation_type) = invocation_type {
            builder = builder.header(INVOCATION_TYPE_HEADER, invocation_type);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_dry_run_checks_function_exists() {
        let response = router().oneshot(invoke_request("calc", Some("DryRun"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = router().oneshot(invoke_request("nope", Some("DryRun"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["Message"], "Function not found: nope");
    }

    #[tokio::test]
    async fn test_unknown_invocation_type_is_bad_request() {
        let response = router().oneshot(invoke_request("calc", Some("Later"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_passthrough_keeps_runtime_headers() {
        let reply = RawReply {
            status: StatusCode::OK,
            content_type: Some("application/json".into()),
            function_error: Some("Unhandled".into()),
            body: Bytes::from_static(br#"{"errorMessage":"boom"}"#),
        };
        let response = passthrough(reply);

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()[FUNCTION_ERROR_HEADER], "Unhandled");
    }

    #[test]
    fn test_passthrough_without_content_type() {
        let reply = RawReply {
            status: StatusCode::OK,
            content_type: None,
            function_error: None,
            body: Bytes::new(),
        };
        let response = passthrough(reply);
        assert!(response.headers().get(header::CONTENT_TYPE).is_none());
        assert!(response.headers().get(FUNCTION_ERROR_HEADER).is_none());
    }
}
