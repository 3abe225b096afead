//! Function invocation.
//!
//! # Data Flow
//! ```text
//! gateway / websocket / direct
//!     → Invoker (resolve endpoint, serialize payload)
//!     → InvocationQueue lane for the function (one in flight, FIFO)
//!     → reqwest POST <origin>/2015-03-31/functions/function/invocations
//!     → RawReply ──► response resolver (HTTP trigger only)
//! ```
//!
//! The local function runtime accepts one invocation at a time, so every
//! call to a function goes through that function's queue lane.

pub mod client;
pub mod queue;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use client::{Invoker, RawReply};
pub use queue::{InvocationQueue, QueueError};

/// Header selecting synchronous or asynchronous invocation.
pub const INVOCATION_TYPE_HEADER: &str = "x-amz-invocation-type";

/// Header the runtime sets when the function raised.
pub const FUNCTION_ERROR_HEADER: &str = "x-amz-function-error";

/// How the caller wants a function invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationType {
    /// Wait for the function's result.
    #[default]
    RequestResponse,
    /// Fire and forget.
    Event,
    /// Check the function exists without running it.
    DryRun,
}

impl InvocationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationType::RequestResponse => "RequestResponse",
            InvocationType::Event => "Event",
            InvocationType::DryRun => "DryRun",
        }
    }
}

impl fmt::Display for InvocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown invocation type: {0}")]
pub struct UnknownInvocationType(pub String);

impl FromStr for InvocationType {
    type Err = UnknownInvocationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RequestResponse" => Ok(Self::RequestResponse),
            "Event" => Ok(Self::Event),
            "DryRun" => Ok(Self::DryRun),
            other => Err(UnknownInvocationType(other.to_string())),
        }
    }
}
