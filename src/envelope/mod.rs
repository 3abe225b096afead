//! Invocation envelopes.
//!
//! # Data Flow
//! ```text
//! axum request ──► InboundRequest ──► build_envelope(version)
//!                                          │
//!                         ┌────────────────┴───────────────┐
//!                         ▼                                ▼
//!                  HttpApiEvent (2.0)              RestApiEvent (1.0)
//!                         └────────────────┬───────────────┘
//!                                          ▼
//!                                  Envelope ──► invoker
//! ```
//!
//! The payload version is decided once, from the target function's
//! configuration, and travels with the envelope as an enum tag. WebSocket
//! lifecycle events have their own shape in [`websocket`].

pub mod context;
pub mod http_api;
pub mod inbound;
pub mod rest_api;
pub mod websocket;

use serde::Serialize;
use std::fmt;

pub use context::RequestTime;
pub use http_api::HttpApiEvent;
pub use inbound::InboundRequest;
pub use rest_api::RestApiEvent;
pub use websocket::{ConnectionContext, LifecycleEvent, WebSocketEvent};

/// Request payload format a function is invoked with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PayloadVersion {
    /// Legacy REST API layout.
    #[serde(rename = "1.0")]
    V1,
    /// HTTP API layout.
    #[serde(rename = "2.0")]
    V2,
}

impl PayloadVersion {
    pub fn for_legacy(legacy: bool) -> Self {
        if legacy {
            PayloadVersion::V1
        } else {
            PayloadVersion::V2
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadVersion::V1 => "1.0",
            PayloadVersion::V2 => "2.0",
        }
    }

    /// What the platform requires of a function response in this format.
    pub fn format_expectation(&self) -> &'static str {
        match self {
            PayloadVersion::V1 => {
                "REST APIs expect the function to return the documented proxy response format."
            }
            PayloadVersion::V2 => {
                "HTTP APIs expect the function to return the documented response format. \
                 The current response would make the API fail to respond."
            }
        }
    }

    pub fn response_schema_url(&self) -> &'static str {
        match self {
            PayloadVersion::V1 => concat!(
                "https://docs.aws.amazon.com/apigateway/latest/developerguide/http-api-develop-integrations-lambda.html",
                "#http-api-develop-integrations-lambda.v1"
            ),
            PayloadVersion::V2 => concat!(
                "https://docs.aws.amazon.com/apigateway/latest/developerguide/http-api-develop-integrations-lambda.html",
                "#http-api-develop-integrations-lambda.v2"
            ),
        }
    }
}

impl fmt::Display for PayloadVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An envelope in exactly one payload format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    V1(RestApiEvent),
    V2(HttpApiEvent),
}

impl Envelope {
    pub fn version(&self) -> PayloadVersion {
        match self {
            Envelope::V1(_) => PayloadVersion::V1,
            Envelope::V2(_) => PayloadVersion::V2,
        }
    }
}

/// Build the envelope for an inbound request, stamped with the current time.
pub fn build_envelope(request: &InboundRequest, version: PayloadVersion) -> Envelope {
    build_envelope_at(request, version, RequestTime::now())
}

pub fn build_envelope_at(request: &InboundRequest, version: PayloadVersion, at: RequestTime) -> Envelope {
    match version {
        PayloadVersion::V1 => Envelope::V1(RestApiEvent::new(request, at)),
        PayloadVersion::V2 => Envelope::V2(HttpApiEvent::new(request, at)),
    }
}
