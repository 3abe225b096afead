//! HTTP API listener.
//!
//! # Responsibilities
//! - Accept any method on any path
//! - Reject browser favicon probes outright
//! - Hand every other request to the gateway and render its answer
//! - Wire up middleware (CORS, request ID, tracing, body limit)

use axum::{
    body::Bytes,
    extract::{ConnectInfo, DefaultBodyLimit, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::schema::CorsConfig;
use crate::gateway::Gateway;
use crate::http::request::{inbound_request, request_id};
use crate::http::response::render;

/// Paths browsers probe on their own. They never reach a function.
pub const IGNORED_PATHS: &[&str] = &["/favicon.ico", "/favicon.png"];

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

/// HTTP server for the gateway's HTTP API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        let router = Self::build_router(gateway);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(gateway: Arc<Gateway>) -> Router {
        let config = gateway.config();
        let body_limit = config.limits.max_body_bytes;
        let cors = cors_layer(&config.cors);

        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(AppState { gateway })
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(cors)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve until `shutdown` resolves.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP API listening");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP API stopped");
        Ok(())
    }
}

/// Credentialed CORS for the configured origins. Requests without an
/// `Origin` header are unaffected.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let allowed: Vec<HeaderValue> = config
        .allow_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            allowed.contains(origin)
        }))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn gateway_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if IGNORED_PATHS.contains(&uri.path()) {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    }

    tracing::debug!(
        request_id = %request_id(&headers),
        method = %method,
        path = %uri.path(),
        "Gateway request"
    );

    let request = inbound_request(&method, &uri, version, &headers, body, Some(peer));
    match state.gateway.handle_http(request).await {
        Ok(invocation) => render(invocation),
        Err(e) => e.into_response(),
    }
}
