//! Direct function invocation (base port + 2).
//!
//! # Data Flow
//! ```text
//! SDK / CLI invoke ──► server.rs ──► Invoker::invoke_raw ──► queue lane ──► runtime
//!                                          │
//!                       RequestResponse ◄──┘ reply passed through unchanged
//! ```
//!
//! Payloads are forwarded as-is. No envelope is built and no response
//! inference happens on this path.

pub mod server;

pub use server::build_router;
