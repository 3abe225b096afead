//! Function responses.
//!
//! # Data Flow
//! ```text
//! downstream bytes ──► parse_output ──► serde_json::Value
//!                                            │
//!                                            ▼
//!                     resolve_response(value, payload version)
//!                         │ valid shape ──► returned unchanged
//!                         │ 2.0 + inferable ──► synthesized 200
//!                         └ otherwise ──► GatewayError::Format
//! ```

pub mod resolver;

use base64::Engine;
use serde::Serialize;
use std::collections::BTreeMap;

pub use resolver::{infer, is_inferable, is_invocation_response, parse_output, resolve_response};

/// The only response shape the caller-facing HTTP layer accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    pub body: String,
    pub is_base64_encoded: bool,
    /// 2.0 responses may set cookies separately from headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<String>>,
    /// 1.0 responses may repeat headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_value_headers: Option<BTreeMap<String, Vec<String>>>,
}

impl InvocationResponse {
    /// Body bytes as the caller should receive them.
    pub fn decoded_body(&self) -> Result<Vec<u8>, base64::DecodeError> {
        if self.is_base64_encoded {
            base64::engine::general_purpose::STANDARD.decode(self.body.as_bytes())
        } else {
            Ok(self.body.clone().into_bytes())
        }
    }
}
