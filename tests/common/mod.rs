//! Shared utilities for integration testing.
//!
//! `MockRuntime` stands in for a locally running function process: it serves
//! the invocation endpoint, records every payload it receives, and answers
//! with whatever the test's reply function returns.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use lambda_gateway::config::schema::ListenerConfig;
use lambda_gateway::config::{GatewayConfig, PathMapping};
use lambda_gateway::lifecycle::{start, RunningGateway, Shutdown};

/// One invocation as the runtime saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub invocation_type: Option<String>,
    pub body: Bytes,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("payload is JSON")
    }
}

/// What the runtime answers with.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub function_error: Option<String>,
    pub body: String,
    pub delay: Option<Duration>,
}

impl MockReply {
    pub fn json(value: Value) -> Self {
        Self::raw(value.to_string())
    }

    pub fn raw(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            function_error: None,
            body: body.into(),
            delay: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_function_error(mut self, kind: &str) -> Self {
        self.function_error = Some(kind.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type ReplyFn = dyn Fn(&Recorded) -> MockReply + Send + Sync;

#[derive(Clone)]
struct RuntimeState {
    calls: Arc<Mutex<Vec<Recorded>>>,
    reply: Arc<ReplyFn>,
}

pub struct MockRuntime {
    pub origin: String,
    calls: Arc<Mutex<Vec<Recorded>>>,
}

impl MockRuntime {
    /// Start a runtime on an ephemeral port.
    pub async fn start<F>(reply: F) -> Self
    where
        F: Fn(&Recorded) -> MockReply + Send + Sync + 'static,
    {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = RuntimeState {
            calls: calls.clone(),
            reply: Arc::new(reply),
        };

        let app = Router::new()
            .route("/2015-03-31/functions/function/invocations", post(invoke))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            origin: format!("http://{}", addr),
            calls,
        }
    }

    /// Runtime that always answers with the same JSON value.
    pub async fn returning(value: Value) -> Self {
        Self::start(move |_| MockReply::json(value.clone())).await
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    /// Wait until at least `count` invocations have arrived.
    pub async fn wait_for_calls(&self, count: usize) -> Vec<Recorded> {
        for _ in 0..500 {
            let calls = self.calls();
            if calls.len() >= count {
                return calls;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} invocations, got {}", count, self.calls().len());
    }
}

async fn invoke(State(state): State<RuntimeState>, headers: HeaderMap, body: Bytes) -> Response {
    let recorded = Recorded {
        invocation_type: headers
            .get("x-amz-invocation-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    };
    state.calls.lock().unwrap().push(recorded.clone());

    let reply = (state.reply)(&recorded);
    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(reply.status).unwrap();
    let mut response = (status, [(header::CONTENT_TYPE, "application/json")], reply.body).into_response();
    if let Some(kind) = reply.function_error {
        response
            .headers_mut()
            .insert("x-amz-function-error", kind.parse().unwrap());
    }
    response
}

/// Config listening on ephemeral localhost ports.
pub fn gateway_config(functions: &[(&str, &MockRuntime)], mappings: &[(&str, &str)]) -> GatewayConfig {
    GatewayConfig {
        listener: ListenerConfig {
            host: "127.0.0.1".to_string(),
            base_port: 0,
        },
        functions: functions
            .iter()
            .map(|(name, runtime)| (name.to_string(), runtime.origin.clone()))
            .collect::<BTreeMap<_, _>>(),
        path_mappings: mappings
            .iter()
            .map(|(path, function)| PathMapping::new(*path, *function))
            .collect(),
        ..Default::default()
    }
}

pub async fn start_gateway(config: GatewayConfig) -> (RunningGateway, Shutdown) {
    let shutdown = Shutdown::new();
    let running = start(config, &shutdown).await.unwrap();
    (running, shutdown)
}
