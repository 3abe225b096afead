//! Placeholder identity and timing shared by every synthesized request context.
//!
//! The identity values are fixed for the whole process so assertions on the
//! request context stay deterministic. They do not match production values.

use chrono::{DateTime, Utc};

pub const ACCOUNT_ID: &str = "123456789012";
pub const API_ID: &str = "dIipa";
pub const DOMAIN_NAME: &str = "dIipa.execute-api.us-east-1.amazonaws.com";
pub const REQUEST_ID: &str = "c6af9ac6-7b61-11e6-9a41-93e8deadbeef";
pub const DEFAULT_ROUTE_KEY: &str = "$default";

/// The instant a request was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTime(pub DateTime<Utc>);

impl RequestTime {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Platform log format, e.g. `12/Mar/2020:19:03:58 +0000`.
    pub fn formatted(&self) -> String {
        self.0.format("%d/%b/%Y:%H:%M:%S %z").to_string()
    }

    pub fn epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }
}
