//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check function origins are absolute http(s) URLs
//! - Check path bindings are well formed
//! - Check the base port leaves room for the `+1` and `+2` listeners
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - A binding to a function without an endpoint is allowed; it fails per request

use std::fmt;
use url::Url;

use crate::config::schema::GatewayConfig;

/// Highest base port that still fits `base_port + 2`.
pub const MAX_BASE_PORT: u16 = u16::MAX - 2;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    BasePortTooHigh { port: u16 },
    EmptyFunctionName,
    InvalidOrigin { function: String, origin: String },
    InvalidPath { path: String },
    UnboundPath { path: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::BasePortTooHigh { port } => {
                write!(
                    f,
                    "base port {} leaves no room for the WebSocket and invoke ports (max {})",
                    port, MAX_BASE_PORT
                )
            }
            ValidationError::EmptyFunctionName => write!(f, "function name must not be empty"),
            ValidationError::InvalidOrigin { function, origin } => {
                write!(f, "function {} has invalid origin {:?}", function, origin)
            }
            ValidationError::InvalidPath { path } => {
                write!(f, "path mapping {:?} must start with '/'", path)
            }
            ValidationError::UnboundPath { path } => {
                write!(f, "path mapping {:?} has no function", path)
            }
        }
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.base_port > MAX_BASE_PORT {
        errors.push(ValidationError::BasePortTooHigh {
            port: config.listener.base_port,
        });
    }

    for (function, origin) in &config.functions {
        if function.is_empty() {
            errors.push(ValidationError::EmptyFunctionName);
        }
        let valid = Url::parse(origin)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidOrigin {
                function: function.clone(),
                origin: origin.clone(),
            });
        }
    }

    for mapping in &config.path_mappings {
        if !mapping.path.starts_with('/') {
            errors.push(ValidationError::InvalidPath {
                path: mapping.path.clone(),
            });
        }
        if mapping.function.is_empty() {
            errors.push(ValidationError::UnboundPath {
                path: mapping.path.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
