//! Connection state transitions and their function dispatch.
//!
//! - open: register, then dispatch CONNECT without waiting for it
//! - message: dispatch MESSAGE and wait for it before reading the next frame
//! - close: unregister first, then dispatch DISCONNECT without waiting
//!
//! Lifecycle dispatch failures are only logged. A failing function never
//! closes the socket.

use tokio::sync::mpsc;

use super::registry::{ConnectionInfo, ConnectionRegistry, Outbound};
use crate::envelope::websocket::{route_key_for_frame, ConnectionContext, WebSocketEvent};
use crate::invoker::Invoker;

/// Transport details captured from the upgrade request.
#[derive(Debug, Clone, Default)]
pub struct UpgradeRequest {
    pub source_ip: String,
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
    pub raw_query: String,
}

/// Dispatches lifecycle events for one WebSocket function.
#[derive(Clone)]
pub struct LifecycleDispatcher {
    invoker: Invoker,
    registry: ConnectionRegistry,
    function: String,
    stage: String,
}

impl LifecycleDispatcher {
    pub fn new(invoker: Invoker, registry: ConnectionRegistry, function: String, stage: String) -> Self {
        Self {
            invoker,
            registry,
            function,
            stage,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// OPEN: register the socket and dispatch CONNECT.
    ///
    /// The CONNECT invocation is queued before this returns, so it always
    /// reaches the function ahead of the connection's first MESSAGE.
    pub fn on_connect(&self, upgrade: UpgradeRequest, tx: mpsc::UnboundedSender<Outbound>) -> String {
        let info = ConnectionInfo::new(upgrade.source_ip, upgrade.user_agent);
        let connection_id = self.registry.open(tx, info.clone());
        tracing::info!(connection_id = %connection_id, source_ip = %info.source_ip, "WebSocket connected");

        let event = WebSocketEvent::connect(
            &self.context(&connection_id, &info),
            &upgrade.headers,
            &upgrade.raw_query,
        );
        self.dispatch_detached(&connection_id, "CONNECT", &event);
        connection_id
    }

    /// MESSAGE: dispatch one client frame and wait for the invocation.
    pub async fn on_message(&self, connection_id: &str, text: &str) {
        self.registry.touch(connection_id);

        let Some(info) = self.registry.info(connection_id) else {
            tracing::warn!(connection_id = %connection_id, "Message on a closed connection dropped");
            return;
        };

        let route_key = match route_key_for_frame(text) {
            Ok(route_key) => route_key,
            Err(e) => {
                tracing::warn!(connection_id = %connection_id, error = %e, "Malformed frame dropped");
                return;
            }
        };

        let event = WebSocketEvent::message(
            &self.context(connection_id, &info),
            route_key,
            uuid::Uuid::new_v4().to_string(),
            text.to_string(),
        );
        if let Err(e) = self.invoker.invoke_websocket(&self.function, &event).await {
            tracing::warn!(
                connection_id = %connection_id,
                function = %self.function,
                error = %e,
                "MESSAGE dispatch failed"
            );
        }
    }

    /// CLOSE: unregister, then dispatch DISCONNECT.
    pub fn on_disconnect(&self, connection_id: &str) {
        let Some(info) = self.registry.unregister(connection_id) else {
            return;
        };
        tracing::info!(connection_id = %connection_id, "WebSocket disconnected");

        let event = WebSocketEvent::disconnect(&self.context(connection_id, &info));
        self.dispatch_detached(connection_id, "DISCONNECT", &event);
    }

    fn context(&self, connection_id: &str, info: &ConnectionInfo) -> ConnectionContext {
        ConnectionContext {
            connection_id: connection_id.to_string(),
            connected_at: info.connected_at.timestamp_millis(),
            source_ip: info.source_ip.clone(),
            user_agent: info.user_agent.clone(),
            stage: self.stage.clone(),
        }
    }

    fn dispatch_detached(&self, connection_id: &str, kind: &'static str, event: &WebSocketEvent) {
        let pending = self.invoker.invoke_websocket(&self.function, event);
        let connection_id = connection_id.to_string();
        let function = self.function.clone();
        tokio::spawn(async move {
            if let Err(e) = pending.await {
                tracing::warn!(
                    connection_id = %connection_id,
                    function = %function,
                    event = kind,
                    error = %e,
                    "Lifecycle dispatch failed"
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ClientConfig;
    use crate::routing::EndpointMap;

    fn dispatcher() -> LifecycleDispatcher {
        // No endpoints: every dispatch fails, which must not affect the connection.
        let invoker = Invoker::new(EndpointMap::default(), &ClientConfig::default()).unwrap();
        LifecycleDispatcher::new(invoker, ConnectionRegistry::new(), "ws".into(), "dev".into())
    }

    #[tokio::test]
    async fn test_connection_survives_failed_dispatch() {
        let dispatcher = dispatcher();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let id = dispatcher.on_connect(UpgradeRequest::default(), tx);
        dispatcher.on_message(&id, r#"{"action":"echo"}"#).await;
        dispatcher.on_message(&id, "not json").await;

        assert!(dispatcher.registry().is_open(&id));
        assert_eq!(
            dispatcher.registry().send(&id, "still here"),
            crate::websocket::Delivery::Delivered
        );
        assert_eq!(rx.recv().await, Some(Outbound::Text("still here".into())));
    }

    #[tokio::test]
    async fn test_disconnect_unregisters_first() {
        let dispatcher = dispatcher();
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = dispatcher.on_connect(UpgradeRequest::default(), tx);
        dispatcher.on_disconnect(&id);

        assert!(!dispatcher.registry().is_open(&id));
        assert_eq!(dispatcher.registry().send(&id, "late"), crate::websocket::Delivery::Gone);
        // A second close is a no-op.
        dispatcher.on_disconnect(&id);
    }
}
