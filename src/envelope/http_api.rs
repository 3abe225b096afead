//! Payload format 2.0: the event an HTTP API sends to a function.
//!
//! See <https://docs.aws.amazon.com/apigateway/latest/developerguide/http-api-develop-integrations-lambda.html>

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::envelope::context::{self, RequestTime};
use crate::envelope::inbound::{joined_headers, query_pairs, InboundRequest};

const STAGE: &str = "dev";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpApiEvent {
    pub version: String,
    pub route_key: String,
    pub raw_path: String,
    pub raw_query_string: String,
    pub cookies: Vec<String>,
    pub headers: BTreeMap<String, String>,
    pub query_string_parameters: BTreeMap<String, String>,
    pub path_parameters: BTreeMap<String, String>,
    pub stage_variables: BTreeMap<String, String>,
    pub request_context: HttpApiRequestContext,
    pub body: String,
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpApiRequestContext {
    pub account_id: String,
    pub api_id: String,
    pub domain_name: String,
    pub domain_prefix: String,
    pub http: HttpDescription,
    pub request_id: String,
    pub route_key: String,
    pub stage: String,
    pub time: String,
    pub time_epoch: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpDescription {
    pub method: String,
    pub path: String,
    pub protocol: String,
    pub source_ip: String,
    pub user_agent: String,
}

impl HttpApiEvent {
    pub fn new(request: &InboundRequest, at: RequestTime) -> Self {
        let (body, is_base64_encoded) = request.body_string();

        // All cookie lines travel as one entry; they are not split per cookie.
        let cookies = request.cookie().map(|cookie| vec![cookie]).unwrap_or_default();

        let mut query_string_parameters: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in query_pairs(&request.raw_query) {
            query_string_parameters
                .entry(key)
                .and_modify(|existing| {
                    existing.push(',');
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        Self {
            version: "2.0".to_string(),
            route_key: context::DEFAULT_ROUTE_KEY.to_string(),
            raw_path: request.path.clone(),
            raw_query_string: request.raw_query.clone(),
            cookies,
            headers: joined_headers(&request.headers),
            query_string_parameters,
            path_parameters: BTreeMap::new(),
            stage_variables: BTreeMap::new(),
            request_context: HttpApiRequestContext {
                account_id: context::ACCOUNT_ID.to_string(),
                api_id: context::API_ID.to_string(),
                domain_name: context::DOMAIN_NAME.to_string(),
                domain_prefix: context::API_ID.to_string(),
                http: HttpDescription {
                    method: request.method.clone(),
                    path: request.path.clone(),
                    protocol: request.protocol().to_string(),
                    source_ip: request.source_ip(),
                    user_agent: request.user_agent(),
                },
                request_id: context::REQUEST_ID.to_string(),
                route_key: context::DEFAULT_ROUTE_KEY.to_string(),
                stage: STAGE.to_string(),
                time: at.formatted(),
                time_epoch: at.epoch_millis(),
            },
            body,
            is_base64_encoded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> InboundRequest {
        InboundRequest {
            method: "POST".into(),
            path: "/api/items%2Fraw".into(),
            raw_query: "tag=a&tag=b&q=x%20y".into(),
            protocol: "HTTP/1.1".into(),
            headers: vec![
                ("content-type".into(), "application/json".into()),
                ("cookie".into(), "a=1; b=2".into()),
                ("user-agent".into(), "curl/8.0".into()),
            ],
            body: r#"{"hello": "world"}"#.into(),
            source_ip: Some("10.0.0.7".parse().unwrap()),
        }
    }

    #[test]
    fn test_builds_v2_event() {
        let event = HttpApiEvent::new(&request(), RequestTime::now());

        assert_eq!(event.version, "2.0");
        assert_eq!(event.route_key, "$default");
        assert_eq!(event.raw_path, "/api/items%2Fraw");
        assert_eq!(event.raw_query_string, "tag=a&tag=b&q=x%20y");
        assert_eq!(event.cookies, vec!["a=1; b=2"]);
        assert_eq!(event.headers["cookie"], "a=1; b=2");
        assert_eq!(event.query_string_parameters["tag"], "a,b");
        assert_eq!(event.query_string_parameters["q"], "x y");
        assert_eq!(event.body, r#"{"hello":"world"}"#);
        assert!(!event.is_base64_encoded);
        assert_eq!(event.request_context.http.method, "POST");
        assert_eq!(event.request_context.http.source_ip, "10.0.0.7");
        assert_eq!(event.request_context.http.user_agent, "curl/8.0");
    }

    #[test]
    fn test_cookie_lines_are_merged() {
        let mut request = request();
        request.headers.retain(|(name, _)| name != "cookie");
        request.headers.push(("cookie".into(), "a=1".into()));
        request.headers.push(("cookie".into(), "b=2".into()));

        let event = HttpApiEvent::new(&request, RequestTime::now());
        assert_eq!(event.cookies, vec!["a=1; b=2"]);
        assert_eq!(event.headers["cookie"], "a=1; b=2");
    }

    #[test]
    fn test_defaults_without_transport_details() {
        let event = HttpApiEvent::new(&InboundRequest::default(), RequestTime::now());
        assert!(event.cookies.is_empty());
        assert_eq!(event.body, "");
        assert_eq!(event.request_context.http.source_ip, "127.0.0.1");
        assert_eq!(event.request_context.http.user_agent, "");
    }

    #[test]
    fn test_identity_is_stable() {
        let first = HttpApiEvent::new(&request(), RequestTime::now());
        let second = HttpApiEvent::new(&request(), RequestTime::now());
        assert_eq!(first.request_context.account_id, second.request_context.account_id);
        assert_eq!(first.request_context.api_id, "dIipa");
        assert_eq!(first.request_context.request_id, second.request_context.request_id);
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(HttpApiEvent::new(&request(), RequestTime::now())).unwrap();
        assert_eq!(value["rawPath"], "/api/items%2Fraw");
        assert_eq!(value["isBase64Encoded"], false);
        assert_eq!(value["requestContext"]["http"]["sourceIp"], "10.0.0.7");
        assert!(value["requestContext"]["timeEpoch"].is_i64());
    }
}
