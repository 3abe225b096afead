//! Gateway configuration.
//!
//! # Data Flow
//! ```text
//! --config <file.toml>            PORT, FUNCTION_ENDPOINT, PATH_MAPPING, ...
//!     → loader::load_config           → loader::from_env
//!              └──────────┬──────────────────┘
//!                         ▼
//!                validation.rs (every semantic error at once)
//!                         ▼
//!                GatewayConfig, read once at startup
//! ```
//!
//! There is no reload. Function endpoints, path bindings and listener ports
//! are fixed for the life of the process.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{GatewayConfig, ListenerConfig, ObservabilityConfig, PathMapping};
