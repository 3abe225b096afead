//! Lifecycle events a WebSocket API sends to its function.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::envelope::context::{self, RequestTime};
use crate::envelope::inbound::{joined_headers, multi_value_headers, query_pairs};

/// Connection lifecycle transition that produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleEvent {
    Connect,
    Message,
    Disconnect,
}

pub const CONNECT_ROUTE: &str = "$connect";
pub const DISCONNECT_ROUTE: &str = "$disconnect";

/// What the gateway knows about a connection when building an event.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub connection_id: String,
    pub connected_at: i64,
    pub source_ip: String,
    pub user_agent: String,
    pub stage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketEvent {
    pub request_context: WebSocketRequestContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_value_headers: Option<BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_string_parameters: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketRequestContext {
    pub route_key: String,
    pub event_type: LifecycleEvent,
    pub extended_request_id: String,
    pub request_time: String,
    pub message_direction: String,
    pub stage: String,
    pub connected_at: i64,
    pub request_time_epoch: i64,
    pub identity: WebSocketIdentity,
    pub request_id: String,
    pub domain_name: String,
    pub connection_id: String,
    pub api_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSocketIdentity {
    pub source_ip: String,
    pub user_agent: String,
}

impl WebSocketEvent {
    fn base(conn: &ConnectionContext, event_type: LifecycleEvent, route_key: String, at: RequestTime) -> Self {
        Self {
            request_context: WebSocketRequestContext {
                route_key,
                event_type,
                extended_request_id: context::REQUEST_ID.to_string(),
                request_time: at.formatted(),
                message_direction: "IN".to_string(),
                stage: conn.stage.clone(),
                connected_at: conn.connected_at,
                request_time_epoch: at.epoch_millis(),
                identity: WebSocketIdentity {
                    source_ip: conn.source_ip.clone(),
                    user_agent: conn.user_agent.clone(),
                },
                request_id: context::REQUEST_ID.to_string(),
                domain_name: context::DOMAIN_NAME.to_string(),
                connection_id: conn.connection_id.clone(),
                api_id: context::API_ID.to_string(),
                message_id: None,
            },
            headers: None,
            multi_value_headers: None,
            query_string_parameters: None,
            body: None,
            is_base64_encoded: false,
        }
    }

    /// `$connect`, carrying the upgrade request's headers and query.
    pub fn connect(conn: &ConnectionContext, headers: &[(String, String)], raw_query: &str) -> Self {
        let mut event = Self::base(conn, LifecycleEvent::Connect, CONNECT_ROUTE.to_string(), RequestTime::now());
        event.headers = Some(joined_headers(headers));
        event.multi_value_headers = Some(multi_value_headers(headers));
        let query: BTreeMap<String, String> = query_pairs(raw_query).into_iter().collect();
        if !query.is_empty() {
            event.query_string_parameters = Some(query);
        }
        event
    }

    /// A client frame routed by its `action`.
    pub fn message(conn: &ConnectionContext, route_key: String, message_id: String, body: String) -> Self {
        let mut event = Self::base(conn, LifecycleEvent::Message, route_key, RequestTime::now());
        event.request_context.message_id = Some(message_id);
        event.body = Some(body);
        event
    }

    pub fn disconnect(conn: &ConnectionContext) -> Self {
        Self::base(conn, LifecycleEvent::Disconnect, DISCONNECT_ROUTE.to_string(), RequestTime::now())
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame is not a JSON object")]
    NotAnObject,
}

/// Decode a client frame to the route key it selects.
/// Objects without a string `action` go to `$default`.
pub fn route_key_for_frame(text: &str) -> Result<String, FrameError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let frame = value.as_object().ok_or(FrameError::NotAnObject)?;
    Ok(frame
        .get("action")
        .and_then(|action| action.as_str())
        .unwrap_or(context::DEFAULT_ROUTE_KEY)
        .to_string())
}
