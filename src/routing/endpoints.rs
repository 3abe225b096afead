//! Function name to invocation endpoint mapping.

use std::collections::HashMap;
use url::Url;

use crate::error::{GatewayError, GatewayResult};

/// Path the local function runtime serves invocations on.
pub const INVOCATION_PATH: &str = "/2015-03-31/functions/function/invocations";

/// Immutable map of logical function name -> invocation URL.
#[derive(Debug, Clone, Default)]
pub struct EndpointMap {
    endpoints: HashMap<String, Url>,
}

impl EndpointMap {
    /// Build from `name -> origin` pairs. Origins that do not parse are skipped
    /// with a warning; validation rejects them before this point.
    pub fn new<'a>(origins: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        let mut endpoints = HashMap::new();
        for (name, origin) in origins {
            match Url::parse(origin).and_then(|base| base.join(INVOCATION_PATH)) {
                Ok(url) => {
                    endpoints.insert(name.clone(), url);
                }
                Err(e) => tracing::warn!(function = %name, origin = %origin, error = %e, "Invalid function origin"),
            }
        }
        Self { endpoints }
    }

    /// Invocation URL for a function. Unknown names signal misconfiguration.
    pub fn resolve_endpoint(&self, function: &str) -> GatewayResult<&Url> {
        self.endpoints
            .get(function)
            .ok_or_else(|| GatewayError::FunctionNotFound {
                function: function.to_string(),
            })
    }

    pub fn contains(&self, function: &str) -> bool {
        self.endpoints.contains_key(function)
    }

    /// Origin (scheme, host, port) of a configured function.
    pub fn origin(&self, function: &str) -> Option<String> {
        self.endpoints
            .get(function)
            .map(|url| url.origin().ascii_serialization())
    }
}
