//! Downstream function client.
//!
//! Every `invoke_*` method resolves the endpoint and submits to the queue
//! before it returns, so calls made in order are dispatched in order even if
//! their futures are awaited later or not at all.

use axum::body::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use super::{InvocationQueue, InvocationType, FUNCTION_ERROR_HEADER, INVOCATION_TYPE_HEADER};
use crate::config::schema::ClientConfig;
use crate::envelope::{Envelope, WebSocketEvent};
use crate::error::{GatewayError, GatewayResult};
use crate::observability::metrics::{self, Trigger};
use crate::response::{parse_output, resolve_response, InvocationResponse};
use crate::routing::EndpointMap;

/// A runtime reply, untouched.
#[derive(Debug, Clone)]
pub struct RawReply {
    pub status: StatusCode,
    pub content_type: Option<String>,
    /// Set when the function raised instead of returning.
    pub function_error: Option<String>,
    pub body: Bytes,
}

impl RawReply {
    /// Treat runtime-reported failures and non-2xx replies as downstream errors.
    pub fn ensure_success(self, function: &str) -> GatewayResult<Self> {
        if let Some(kind) = &self.function_error {
            return Err(GatewayError::downstream(
                function,
                format!("function raised ({kind}): {}", String::from_utf8_lossy(&self.body)),
            ));
        }
        if !self.status.is_success() {
            return Err(GatewayError::downstream(
                function,
                format!("function endpoint answered {}", self.status),
            ));
        }
        Ok(self)
    }

    fn outcome(&self) -> &'static str {
        if self.function_error.is_some() {
            "function_error"
        } else if self.status.is_success() {
            "ok"
        } else {
            "error_status"
        }
    }
}

/// Shared handle for invoking configured functions.
#[derive(Clone)]
pub struct Invoker {
    endpoints: Arc<EndpointMap>,
    client: reqwest::Client,
    queue: InvocationQueue,
}

impl Invoker {
    pub fn new(endpoints: EndpointMap, config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            endpoints: Arc::new(endpoints),
            client: builder.build()?,
            queue: InvocationQueue::new(),
        })
    }

    pub fn endpoints(&self) -> &EndpointMap {
        &self.endpoints
    }

    pub fn queue(&self) -> &InvocationQueue {
        &self.queue
    }

    /// Invoke with an HTTP envelope and resolve the caller-facing response.
    pub fn invoke_http(
        &self,
        function: &str,
        envelope: &Envelope,
    ) -> impl Future<Output = GatewayResult<InvocationResponse>> + Send + 'static {
        let version = envelope.version();
        let submitted = serde_json::to_vec(envelope)
            .map_err(|e| GatewayError::downstream(function, e))
            .and_then(|payload| {
                self.submit(function, payload.into(), InvocationType::RequestResponse, Trigger::Http)
            });
        let function = function.to_string();

        async move {
            let (endpoint, pending) = submitted?;
            let reply = pending.await?.ensure_success(&function)?;
            let output = parse_output(&reply.body);
            resolve_response(&output, version, &function, endpoint.as_str())
        }
    }

    /// Dispatch a lifecycle event as an asynchronous invocation.
    pub fn invoke_websocket(
        &self,
        function: &str,
        event: &WebSocketEvent,
    ) -> impl Future<Output = GatewayResult<()>> + Send + 'static {
        let submitted = serde_json::to_vec(event)
            .map_err(|e| GatewayError::downstream(function, e))
            .and_then(|payload| self.submit(function, payload.into(), InvocationType::Event, Trigger::WebSocket));
        let function = function.to_string();

        async move {
            let (_, pending) = submitted?;
            pending.await?.ensure_success(&function)?;
            Ok(())
        }
    }

    /// Forward a raw payload and hand back the runtime's reply as-is.
    pub fn invoke_raw(
        &self,
        function: &str,
        payload: Bytes,
        invocation_type: InvocationType,
    ) -> impl Future<Output = GatewayResult<RawReply>> + Send + 'static {
        let submitted = self.submit(function, payload, invocation_type, Trigger::Direct);

        async move {
            let (_, pending) = submitted?;
            pending.await
        }
    }

    fn submit(
        &self,
        function: &str,
        payload: Bytes,
        invocation_type: InvocationType,
        trigger: Trigger,
    ) -> GatewayResult<(Url, impl Future<Output = GatewayResult<RawReply>> + Send + 'static)> {
        let endpoint = self.endpoints.resolve_endpoint(function)?.clone();

        let client = self.client.clone();
        let url = endpoint.clone();
        let name = function.to_string();
        let task = async move {
            tracing::debug!(function = %name, url = %url, invocation_type = %invocation_type, "Invoking function");
            let started = Instant::now();
            let result = post(&client, url, payload, invocation_type).await;

            let outcome = match &result {
                Ok(reply) => reply.outcome(),
                Err(_) => "error",
            };
            metrics::record_invocation(&name, trigger, outcome, started.elapsed());

            result.map_err(|e| GatewayError::downstream(&name, e))
        };

        let queued = self.queue.enqueue(function, task);
        let function = function.to_string();
        let pending = async move {
            match queued.await {
                Ok(result) => result,
                Err(e) => Err(GatewayError::downstream(&function, e)),
            }
        };

        Ok((endpoint, pending))
    }
}

async fn post(
    client: &reqwest::Client,
    url: Url,
    payload: Bytes,
    invocation_type: InvocationType,
) -> Result<RawReply, reqwest::Error> {
    let response = client
        .post(url)
        .header(INVOCATION_TYPE_HEADER, invocation_type.as_str())
        .header(CONTENT_TYPE, "application/json")
        .body(payload)
        .send()
        .await?;

    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let status = response.status();
    let content_type = header(CONTENT_TYPE.as_str());
    let function_error = header(FUNCTION_ERROR_HEADER);

    Ok(RawReply {
        status,
        content_type,
        function_error,
        body: response.bytes().await?,
    })
}
