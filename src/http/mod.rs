//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, CORS, request ID, favicon filter)
//!     → request.rs (capture InboundRequest)
//!     → gateway (route, envelope, invoke, resolve)
//!     → response.rs (headers, cookies, base64 body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
