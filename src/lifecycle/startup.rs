//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics exporter when enabled
//! - Build the gateway and log its effective route table
//! - Bind the HTTP, WebSocket and direct invocation listeners
//! - Serve them until the shutdown broadcast fires
//!
//! # Design Decisions
//! - Fail fast: any bind error is fatal
//! - The WebSocket listener is skipped when no WebSocket function is configured
//! - Listeners are bound before anything is served, so callers learn the
//!   real addresses (port 0 binds ephemeral ports)

use axum::Router;
use metrics_exporter_prometheus::BuildError;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinHandle};

use crate::config::GatewayConfig;
use crate::direct;
use crate::gateway::Gateway;
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics::init_metrics;
use crate::websocket;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build function client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error("listener failed: {0}")]
    Serve(#[from] std::io::Error),

    #[error("listener task panicked: {0}")]
    Join(#[from] JoinError),
}

/// Handles to the listeners of a started gateway.
pub struct RunningGateway {
    pub http_addr: SocketAddr,
    pub websocket_addr: Option<SocketAddr>,
    pub invoke_addr: SocketAddr,
    pub gateway: Arc<Gateway>,
    handles: Vec<JoinHandle<Result<(), std::io::Error>>>,
}

impl RunningGateway {
    /// Wait for every listener to stop.
    pub async fn wait(self) -> Result<(), StartupError> {
        for handle in self.handles {
            handle.await??;
        }
        Ok(())
    }
}

/// Bind all listeners and start serving.
///
/// Every listener is bound before any of them serves, so a failed bind
/// leaves nothing running.
pub async fn start(config: GatewayConfig, shutdown: &Shutdown) -> Result<RunningGateway, StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_socket_addr() {
            Some(address) => init_metrics(address)?,
            None => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let http_address = config.listener.http_address();
    let websocket_address = config.listener.websocket_address();
    let invoke_address = config.listener.invoke_address();

    let gateway = Arc::new(Gateway::new(config)?);
    gateway.log_routes();

    let http_listener = bind(&http_address).await?;
    let websocket = match gateway.websocket_dispatcher() {
        Some(dispatcher) => Some((bind(&websocket_address).await?, dispatcher)),
        None => {
            tracing::warn!("WebSocket function is not configured - WebSocket functionality disabled");
            None
        }
    };
    let invoke_listener = bind(&invoke_address).await?;

    let http_addr = http_listener.local_addr()?;
    let invoke_addr = invoke_listener.local_addr()?;
    let websocket_addr = match &websocket {
        Some((listener, _)) => Some(listener.local_addr()?),
        None => None,
    };

    let mut handles = Vec::new();

    let server = HttpServer::new(gateway.clone());
    handles.push(tokio::spawn(server.run(http_listener, shutdown.signalled())));

    if let Some((listener, dispatcher)) = websocket {
        let router = websocket::server::build_router(dispatcher, shutdown.clone());
        handles.push(tokio::spawn(serve("WebSocket API", listener, router, shutdown)));
    }

    let router = direct::build_router(gateway.clone());
    handles.push(tokio::spawn(serve("Direct invocation", invoke_listener, router, shutdown)));

    Ok(RunningGateway {
        http_addr,
        websocket_addr,
        invoke_addr,
        gateway,
        handles,
    })
}

async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address).await.map_err(|source| StartupError::Bind {
        address: address.to_string(),
        source,
    })
}

fn serve(
    name: &'static str,
    listener: TcpListener,
    router: Router,
    shutdown: &Shutdown,
) -> impl std::future::Future<Output = Result<(), std::io::Error>> + Send + 'static {
    let signalled = shutdown.signalled();
    async move {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "{name} listening");

        let app = router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app).with_graceful_shutdown(signalled).await?;

        tracing::info!("{name} stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ListenerConfig;

    fn ephemeral() -> GatewayConfig {
        GatewayConfig {
            listener: ListenerConfig {
                host: "127.0.0.1".to_string(),
                base_port: 0,
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_websocket_listener_skipped_without_function() {
        let shutdown = Shutdown::new();
        let running = start(ephemeral(), &shutdown).await.unwrap();
        assert!(running.websocket_addr.is_none());
        assert_ne!(running.http_addr.port(), 0);

        shutdown.trigger();
        running.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_bind_leaves_nothing_serving() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        // The HTTP port is free, the direct invocation port (+2) is not.
        let mut config = ephemeral();
        config.listener.base_port = port - 2;
        let http_address = config.listener.http_address();

        let shutdown = Shutdown::new();
        let err = match start(config, &shutdown).await {
            Ok(_) => panic!("bind of a taken port succeeded"),
            Err(e) => e,
        };
        assert!(matches!(err, StartupError::Bind { .. }));
        assert_eq!(shutdown.receiver_count(), 0);

        // Nothing kept the HTTP port.
        assert!(TcpListener::bind(&http_address).await.is_ok());
    }

    #[tokio::test]
    async fn test_bind_error_names_address() {
        let err = bind("256.0.0.1:1").await.unwrap_err();
        assert!(err.to_string().contains("256.0.0.1:1"));
    }
}
