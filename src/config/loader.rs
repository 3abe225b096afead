//! Configuration loading from disk or the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{GatewayConfig, PathMapping};
use crate::config::validation::{validate_config, ValidationError};

/// Delimiter for list-valued environment variables.
const LIST_DELIMITER: char = ',';

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    InvalidEntry { variable: &'static str, entry: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::InvalidEntry { variable, entry } => {
                write!(f, "Invalid {} format found: {}", variable, entry)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: GatewayConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from the process environment.
pub fn from_env() -> Result<GatewayConfig, ConfigError> {
    from_vars(|key| std::env::var(key).ok())
}

/// Build a configuration from `KEY=value` style variables.
///
/// Recognized variables:
/// - `PORT`: base port (HTTP API; WebSocket is +1, direct invocation +2)
/// - `FUNCTION_ENDPOINT`: `name=http://origin,...`
/// - `PATH_MAPPING`: `/path=name,...` (`/*` is the wildcard)
/// - `HTTP_V1_PAYLOAD_FUNCTIONS`: `name,...`
/// - `CORS_ALLOW_ORIGIN`: `origin,...`
/// - `WS_FUNCTION`, `WS_STAGE`
/// - `LOG_LEVEL`, `METRICS_ADDRESS`
pub fn from_vars<F>(lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = GatewayConfig::default();

    if let Some(port) = lookup("PORT") {
        config.listener.base_port = port.trim().parse().map_err(|_| ConfigError::InvalidEntry {
            variable: "PORT",
            entry: port.clone(),
        })?;
    }

    if let Some(raw) = lookup("FUNCTION_ENDPOINT") {
        for entry in split_list(&raw) {
            let (name, origin) = split_pair("FUNCTION_ENDPOINT", entry)?;
            config.functions.insert(name.to_string(), origin.to_string());
        }
    }

    if let Some(raw) = lookup("PATH_MAPPING") {
        for entry in split_list(&raw) {
            let (path, function) = split_pair("PATH_MAPPING", entry)?;
            config.path_mappings.push(PathMapping::new(path, function));
        }
    }

    if let Some(raw) = lookup("HTTP_V1_PAYLOAD_FUNCTIONS") {
        config.legacy_payload_functions = split_list(&raw).map(str::to_string).collect();
    }

    if let Some(raw) = lookup("CORS_ALLOW_ORIGIN") {
        config.cors.allow_origins = split_list(&raw).map(str::to_string).collect();
    }

    config.websocket.function = lookup("WS_FUNCTION").filter(|f| !f.is_empty());
    if let Some(stage) = lookup("WS_STAGE").filter(|s| !s.is_empty()) {
        config.websocket.stage = stage;
    }

    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(address) = lookup("METRICS_ADDRESS") {
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = address;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(LIST_DELIMITER).map(str::trim).filter(|s| !s.is_empty())
}

fn split_pair<'a>(variable: &'static str, entry: &'a str) -> Result<(&'a str, &'a str), ConfigError> {
    match entry.split_once('=') {
        Some((key, value)) if !key.is_empty() && !value.is_empty() => Ok((key, value)),
        _ => Err(ConfigError::InvalidEntry {
            variable,
            entry: entry.to_string(),
        }),
    }
}
