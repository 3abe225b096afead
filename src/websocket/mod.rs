//! WebSocket API subsystem.
//!
//! # Data Flow
//! ```text
//! socket open ──► lifecycle::on_connect ──► registry.open ──► CONNECT (detached)
//! text frame  ──► lifecycle::on_message ──► MESSAGE (awaited, per-socket order)
//! socket close ─► lifecycle::on_disconnect ─► registry.unregister ─► DISCONNECT (detached)
//!
//! function ──► POST /{stage}/@connections/{id} ──► registry.send ──► writer task ──► socket
//! ```

pub mod lifecycle;
pub mod registry;
pub mod server;

pub use lifecycle::{LifecycleDispatcher, UpgradeRequest};
pub use registry::{ConnectionInfo, ConnectionRegistry, Delivery, Outbound};
