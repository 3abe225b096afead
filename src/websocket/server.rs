//! WebSocket API listener.
//!
//! Accepts sockets on any path and serves the connection management API
//! functions use to reach connected clients:
//!
//! - `POST   /{stage}/@connections/{connection_id}` push a frame
//! - `GET    /{stage}/@connections/{connection_id}` connection details
//! - `DELETE /{stage}/@connections/{connection_id}` close the socket

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, Path, RawQuery, State,
    },
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use super::lifecycle::{LifecycleDispatcher, UpgradeRequest};
use super::registry::{Delivery, Outbound};
use crate::http::request::header_pairs;
use crate::lifecycle::shutdown::Shutdown;

#[derive(Clone)]
struct WsState {
    dispatcher: LifecycleDispatcher,
    shutdown: Shutdown,
}

/// Router for the WebSocket listener.
pub fn build_router(dispatcher: LifecycleDispatcher, shutdown: Shutdown) -> Router {
    let state = WsState { dispatcher, shutdown };

    Router::new()
        .route(
            "/{stage}/@connections/{connection_id}",
            post(post_to_connection)
                .get(get_connection)
                .delete(delete_connection),
        )
        .fallback(upgrade)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn upgrade(
    State(state): State<WsState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let upgrade = UpgradeRequest {
        source_ip: addr.ip().to_string(),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        headers: header_pairs(&headers),
        raw_query: query.unwrap_or_default(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, upgrade))
}

/// Drive one socket from open to close.
async fn handle_socket(socket: WebSocket, state: WsState, upgrade: UpgradeRequest) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Outbound>();
    let mut shutdown = state.shutdown.subscribe();

    let dispatcher = state.dispatcher;
    let connection_id = dispatcher.on_connect(upgrade, tx);

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let message = match frame {
                Outbound::Text(text) => Message::Text(text.into()),
                Outbound::Close => Message::Close(None),
            };
            let closing = matches!(message, Message::Close(_));
            if sink.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            frame = stream.next() => {
                let text = match frame {
                    Some(Ok(Message::Text(text))) => text.as_str().to_string(),
                    Some(Ok(Message::Binary(bytes))) => String::from_utf8_lossy(&bytes).into_owned(),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "Socket read failed");
                        break;
                    }
                };
                dispatcher.on_message(&connection_id, &text).await;
            }
            _ = shutdown.recv() => {
                dispatcher.registry().close(&connection_id);
                break;
            }
        }
    }

    dispatcher.on_disconnect(&connection_id);
    // The registry held the only sender, so the writer drains and stops.
    let _ = writer.await;
}

async fn post_to_connection(
    State(state): State<WsState>,
    Path((stage, connection_id)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    tracing::info!(stage = %stage, connection_id = %connection_id, "Push to connection");

    let data = String::from_utf8_lossy(&body).into_owned();
    match state.dispatcher.registry().send(&connection_id, data) {
        Delivery::Delivered => (StatusCode::OK, Json(json!({ "ok": true }))).into_response(),
        Delivery::Gone => gone(),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionDetails {
    connected_at: String,
    last_active_at: String,
    identity: ConnectionIdentity,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionIdentity {
    source_ip: String,
    user_agent: String,
}

async fn get_connection(
    State(state): State<WsState>,
    Path((_stage, connection_id)): Path<(String, String)>,
) -> Response {
    match state.dispatcher.registry().info(&connection_id) {
        Some(info) => Json(ConnectionDetails {
            connected_at: info.connected_at.to_rfc3339(),
            last_active_at: info.last_active_at.to_rfc3339(),
            identity: ConnectionIdentity {
                source_ip: info.source_ip,
                user_agent: info.user_agent,
            },
        })
        .into_response(),
        None => gone(),
    }
}

async fn delete_connection(
    State(state): State<WsState>,
    Path((_stage, connection_id)): Path<(String, String)>,
) -> Response {
    match state.dispatcher.registry().close(&connection_id) {
        Delivery::Delivered => StatusCode::NO_CONTENT.into_response(),
        Delivery::Gone => gone(),
    }
}

fn gone() -> Response {
    (StatusCode::GONE, Json(json!({ "error": "Gone" }))).into_response()
}
