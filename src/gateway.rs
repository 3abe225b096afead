//! Invocation gateway: the composition root.
//!
//! Owns the route table, the invoker and the connection registry, and wires
//! them into the HTTP-triggered and WebSocket-triggered invocation paths.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::envelope::{build_envelope, InboundRequest, PayloadVersion};
use crate::error::{GatewayError, GatewayResult};
use crate::invoker::Invoker;
use crate::response::InvocationResponse;
use crate::routing::{EndpointMap, RouteTable, WILDCARD_PATH};
use crate::websocket::{ConnectionRegistry, LifecycleDispatcher};

pub struct Gateway {
    config: Arc<GatewayConfig>,
    routes: RouteTable,
    invoker: Invoker,
    registry: ConnectionRegistry,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let endpoints = EndpointMap::new(&config.functions);
        let routes = RouteTable::from_config(&config.path_mappings);
        let invoker = Invoker::new(endpoints, &config.client)?;

        Ok(Self {
            config: Arc::new(config),
            routes,
            invoker,
            registry: ConnectionRegistry::new(),
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn invoker(&self) -> &Invoker {
        &self.invoker
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Function bound to an inbound path.
    pub fn resolve_function(&self, path: &str) -> GatewayResult<&str> {
        self.routes
            .resolve_function(path)
            .ok_or_else(|| GatewayError::Routing { path: path.to_string() })
    }

    pub fn payload_version(&self, function: &str) -> PayloadVersion {
        PayloadVersion::for_legacy(self.config.is_legacy_payload(function))
    }

    /// HTTP path: route, build the envelope, invoke, resolve the response.
    pub async fn handle_http(&self, request: InboundRequest) -> GatewayResult<InvocationResponse> {
        let function = self.resolve_function(&request.path)?;
        let version = self.payload_version(function);

        tracing::debug!(
            path = %request.path,
            function = %function,
            payload_version = %version,
            "Routing request"
        );

        let envelope = build_envelope(&request, version);
        self.invoker.invoke_http(function, &envelope).await
    }

    /// Dispatcher for the WebSocket function, if one is configured.
    pub fn websocket_dispatcher(&self) -> Option<LifecycleDispatcher> {
        let function = self.config.websocket.function.clone()?;
        Some(LifecycleDispatcher::new(
            self.invoker.clone(),
            self.registry.clone(),
            function,
            self.config.websocket.stage.clone(),
        ))
    }

    /// Log the effective route table, one binding per line.
    pub fn log_routes(&self) {
        tracing::info!("Path mappings:");
        let wildcard = self.routes.wildcard().map(|function| (WILDCARD_PATH, function));
        let bindings = self
            .routes
            .routes()
            .iter()
            .map(|route| (route.matcher.prefix(), route.function.as_str()))
            .chain(wildcard);

        for (path, function) in bindings {
            tracing::info!("{}", self.describe_binding(path, function));
            if !self.invoker.endpoints().contains(function) {
                tracing::warn!(path = %path, function = %function, "Bound function has no endpoint");
            }
        }
    }

    fn describe_binding(&self, path: &str, function: &str) -> String {
        let origin = self
            .invoker
            .endpoints()
            .origin(function)
            .unwrap_or_else(|| "no endpoint".to_string());
        let mut line = format!("- {path} => {function} ({origin})");
        if self.payload_version(function) == PayloadVersion::V1 {
            line.push_str(" [payload format 1.0]");
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathMapping;

    fn gateway() -> Gateway {
        let mut config = GatewayConfig::default();
        config.functions.insert("api".into(), "http://localhost:9000".into());
        config.functions.insert("rest".into(), "http://localhost:9001".into());
        config.path_mappings = vec![PathMapping::new("/api", "api"), PathMapping::new("/rest", "rest")];
        config.legacy_payload_functions = vec!["rest".into()];
        Gateway::new(config).unwrap()
    }

    #[test]
    fn test_resolve_and_version() {
        let gateway = gateway();
        assert_eq!(gateway.resolve_function("/api/items").unwrap(), "api");
        assert_eq!(gateway.payload_version("api"), PayloadVersion::V2);
        assert_eq!(gateway.payload_version("rest"), PayloadVersion::V1);
        assert!(matches!(
            gateway.resolve_function("/other"),
            Err(GatewayError::Routing { .. })
        ));
    }

    #[test]
    fn test_describe_binding() {
        let gateway = gateway();
        assert_eq!(gateway.describe_binding("/api", "api"), "- /api => api (http://localhost:9000)");
        assert_eq!(
            gateway.describe_binding("/rest", "rest"),
            "- /rest => rest (http://localhost:9001) [payload format 1.0]"
        );
    }

    #[tokio::test]
    async fn test_unroutable_request_is_a_routing_error() {
        let request = InboundRequest {
            method: "GET".into(),
            path: "/nowhere".into(),
            ..Default::default()
        };
        let err = gateway().handle_http(request).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_websocket_dispatcher_requires_function() {
        assert!(gateway().websocket_dispatcher().is_none());
    }
}
