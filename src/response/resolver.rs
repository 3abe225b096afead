//! Validation and inference of raw function output.
//!
//! The shape check is structural: any JSON object with a whole-number
//! `statusCode`, a boolean `isBase64Encoded`, a string `body` and, when
//! present, a `headers` object of strings is a response. Extra fields are
//! ignored. Whether the status is a usable HTTP status and whether a
//! base64 body decodes is decided when the response is rendered.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::InvocationResponse;
use crate::envelope::PayloadVersion;
use crate::error::{GatewayError, GatewayResult};

const INFERRED_CONTENT_TYPE: &str = "application/json";

/// Decode a downstream reply body: JSON when it parses, a string otherwise.
pub fn parse_output(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

pub fn is_invocation_response(output: &Value) -> bool {
    as_invocation_response(output).is_some()
}

/// Output the 2.0 format lets a function return bare.
///
/// A `statusCode` field means the function meant to return the structured
/// shape, so such objects are never inferred.
pub fn is_inferable(output: &Value) -> bool {
    match output {
        Value::String(_) => true,
        Value::Object(fields) => !fields.contains_key("statusCode"),
        _ => false,
    }
}

/// Wrap bare output in a 200 JSON response.
pub fn infer(output: &Value) -> InvocationResponse {
    let body = match output {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };

    InvocationResponse {
        status_code: 200,
        headers: Some(BTreeMap::from([(
            "Content-Type".to_string(),
            INFERRED_CONTENT_TYPE.to_string(),
        )])),
        body,
        is_base64_encoded: false,
        cookies: None,
        multi_value_headers: None,
    }
}

/// Turn raw function output into the caller-facing response.
///
/// 1.0 output must already be a response. 2.0 output is returned unchanged
/// when it is one and inferred when it can be.
pub fn resolve_response(
    output: &Value,
    version: PayloadVersion,
    function: &str,
    endpoint: &str,
) -> GatewayResult<InvocationResponse> {
    let format_error = || GatewayError::Format {
        function: function.to_string(),
        endpoint: endpoint.to_string(),
        version,
    };

    if let Some(response) = as_invocation_response(output) {
        return Ok(response);
    }

    if version == PayloadVersion::V2 && is_inferable(output) {
        return Ok(infer(output));
    }

    Err(format_error())
}

fn as_invocation_response(output: &Value) -> Option<InvocationResponse> {
    let fields = output.as_object()?;

    let status_code = status_code(fields.get("statusCode")?)?;
    let is_base64_encoded = fields.get("isBase64Encoded")?.as_bool()?;
    let body = fields.get("body")?.as_str()?.to_string();

    let headers = match fields.get("headers") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(string_map(map)?),
        Some(_) => return None,
    };

    Some(InvocationResponse {
        status_code,
        headers,
        body,
        is_base64_encoded,
        cookies: fields.get("cookies").and_then(string_list),
        multi_value_headers: fields
            .get("multiValueHeaders")
            .and_then(Value::as_object)
            .and_then(|map| {
                map.iter()
                    .map(|(name, values)| Some((name.clone(), string_list(values)?)))
                    .collect()
            }),
    })
}

/// Any JSON number with a whole value that fits a `u16`, so `200.0` counts.
fn status_code(value: &Value) -> Option<u16> {
    if let Some(code) = value.as_u64() {
        return u16::try_from(code).ok();
    }
    let code = value.as_f64()?;
    if code.fract() == 0.0 && (0.0..=f64::from(u16::MAX)).contains(&code) {
        Some(code as u16)
    } else {
        None
    }
}

fn string_map(map: &Map<String, Value>) -> Option<BTreeMap<String, String>> {
    map.iter()
        .map(|(name, value)| Some((name.clone(), value.as_str()?.to_string())))
        .collect()
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}
