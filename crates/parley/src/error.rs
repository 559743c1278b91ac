// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure while handling one inbound event.
///
/// Every variant is contained to the event that produced it: it is logged,
/// reported to the caller, and never turned into a redelivery request.
#[derive(Debug)]
pub enum EventError {
    /// The inbound payload did not decode into the expected shape.
    Decode(serde_json::Error),
    /// The state store rejected a write. The in-memory registry keeps the upsert.
    StateStore(String),
    /// The generation service timed out, was unreachable, or answered non-2xx.
    Downstream(String),
}

impl EventError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decode(_) => "DECODE_ERROR",
            Self::StateStore(_) => "STATE_STORE_ERROR",
            Self::Downstream(_) => "DOWNSTREAM_ERROR",
        }
    }

    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: self.detail() }
    }

    fn detail(&self) -> String {
        match self {
            Self::Decode(e) => e.to_string(),
            Self::StateStore(msg) | Self::Downstream(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for EventError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.as_str(), self.detail())
    }
}

impl std::error::Error for EventError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EventError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e)
    }
}

/// Acknowledgement returned to the pub/sub collaborator. Neither variant
/// asks for redelivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    /// The event was handled (possibly with a logged downstream failure).
    Success,
    /// The event was rejected and must not be redelivered.
    Drop,
}

/// Push-delivery response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResponse {
    pub status: Disposition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl DeliveryResponse {
    pub fn success() -> Self {
        Self { status: Disposition::Success, error: None }
    }

    pub fn drop_with(err: &EventError) -> Self {
        Self { status: Disposition::Drop, error: Some(err.to_error_body()) }
    }
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
