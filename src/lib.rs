//! Local API gateway for function runtimes.
//!
//! Turns HTTP requests and WebSocket traffic into function invocations,
//! forwards them to locally running function processes, and translates
//! their output back into HTTP responses.

// Core subsystems
pub mod config;
pub mod envelope;
pub mod gateway;
pub mod invoker;
pub mod response;
pub mod routing;

// Listeners
pub mod direct;
pub mod http;
pub mod websocket;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::schema::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
