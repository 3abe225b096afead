//! Payload format 1.0: the event a REST API sends to a function.
//!
//! There is no dedicated cookie field; cookies travel as an ordinary header.
//! See <https://docs.aws.amazon.com/apigateway/latest/developerguide/set-up-lambda-proxy-integrations.html>

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::envelope::context::{self, RequestTime};
use crate::envelope::inbound::{last_value_headers, multi_value_headers, query_pairs, InboundRequest};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestApiEvent {
    pub version: String,
    pub resource: String,
    pub path: String,
    pub http_method: String,
    pub headers: BTreeMap<String, String>,
    pub multi_value_headers: BTreeMap<String, Vec<String>>,
    pub query_string_parameters: BTreeMap<String, String>,
    pub multi_value_query_string_parameters: BTreeMap<String, Vec<String>>,
    pub request_context: RestApiRequestContext,
    pub path_parameters: BTreeMap<String, String>,
    pub stage_variables: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestApiRequestContext {
    pub account_id: String,
    pub api_id: String,
    pub domain_name: String,
    pub domain_prefix: String,
    pub extended_request_id: String,
    pub http_method: String,
    pub identity: Identity,
    pub path: String,
    pub protocol: String,
    pub request_id: String,
    pub request_time: String,
    pub request_time_epoch: i64,
    pub resource_id: Option<String>,
    pub resource_path: String,
    pub stage: String,
}

/// Caller identity. Only the network fields are known locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub access_key: Option<String>,
    pub account_id: Option<String>,
    pub caller: Option<String>,
    pub cognito_authentication_provider: Option<String>,
    pub cognito_authentication_type: Option<String>,
    pub cognito_identity_id: Option<String>,
    pub cognito_identity_pool_id: Option<String>,
    pub principal_org_id: Option<String>,
    pub source_ip: String,
    pub user: Option<String>,
    pub user_agent: String,
    pub user_arn: Option<String>,
    pub client_cert: ClientCert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCert {
    pub client_cert_pem: String,
    #[serde(rename = "subjectDN")]
    pub subject_dn: String,
    #[serde(rename = "issuerDN")]
    pub issuer_dn: String,
    pub serial_number: String,
    pub validity: CertValidity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertValidity {
    pub not_before: String,
    pub not_after: String,
}

impl Default for ClientCert {
    fn default() -> Self {
        Self {
            client_cert_pem: "SOME_CERT_CONTENT".to_string(),
            subject_dn: "www.example.com".to_string(),
            issuer_dn: "Some issuer".to_string(),
            serial_number: "a1:a1:a1:a1:a1:a1:a1:a1:a1:a1:a1:a1:a1:a1:a1:a1".to_string(),
            validity: CertValidity {
                not_before: "May 28 12:30:02 2019 GMT".to_string(),
                not_after: "Aug 5 09:36:04 2021 GMT".to_string(),
            },
        }
    }
}

impl Identity {
    fn network(source_ip: String, user_agent: String) -> Self {
        Self {
            access_key: None,
            account_id: None,
            caller: None,
            cognito_authentication_provider: None,
            cognito_authentication_type: None,
            cognito_identity_id: None,
            cognito_identity_pool_id: None,
            principal_org_id: None,
            source_ip,
            user: None,
            user_agent,
            user_arn: None,
            client_cert: ClientCert::default(),
        }
    }
}

impl RestApiEvent {
    pub fn new(request: &InboundRequest, at: RequestTime) -> Self {
        let (body, is_base64_encoded) = request.body_string();

        let pairs = query_pairs(&request.raw_query);
        let mut multi_value_query_string_parameters: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in &pairs {
            multi_value_query_string_parameters
                .entry(key.clone())
                .or_default()
                .push(value.clone());
        }

        Self {
            version: "1.0".to_string(),
            resource: request.path.clone(),
            path: request.path.clone(),
            http_method: request.method.clone(),
            headers: last_value_headers(&request.headers),
            multi_value_headers: multi_value_headers(&request.headers),
            query_string_parameters: pairs.into_iter().collect(),
            multi_value_query_string_parameters,
            request_context: RestApiRequestContext {
                account_id: context::ACCOUNT_ID.to_string(),
                api_id: context::API_ID.to_string(),
                domain_name: context::DOMAIN_NAME.to_string(),
                domain_prefix: context::API_ID.to_string(),
                extended_request_id: context::REQUEST_ID.to_string(),
                http_method: request.method.clone(),
                identity: Identity::network(request.source_ip(), request.user_agent()),
                path: request.path.clone(),
                protocol: request.protocol().to_string(),
                request_id: context::REQUEST_ID.to_string(),
                request_time: at.formatted(),
                request_time_epoch: at.epoch_millis(),
                resource_id: None,
                resource_path: request.path.clone(),
                stage: context::DEFAULT_ROUTE_KEY.to_string(),
            },
            path_parameters: BTreeMap::new(),
            stage_variables: BTreeMap::new(),
            body,
            is_base64_encoded,
        }
    }
}
