// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire types for agent and conversation events.
//!
//! Inbound payloads arrive either bare or wrapped in a CloudEvent envelope
//! (push-delivery sidecars wrap them, NATS publishers usually do not).
//! [`decode_payload`] accepts both.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A named participant whose tea amount gates eligibility for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// A missing amount decodes as zero: registered, never selectable.
    #[serde(rename = "tea_amount_ml", default)]
    pub tea_amount: i64,
}

impl Agent {
    pub fn new(name: impl Into<String>, description: impl Into<String>, tea_amount: i64) -> Self {
        Self { name: name.into(), description: description.into(), tea_amount }
    }

    /// An agent with no tea left never responds.
    pub fn is_available(&self) -> bool {
        self.tea_amount > 0
    }

    /// Public profile forwarded to the generation service.
    pub fn profile(&self) -> AgentProfile {
        AgentProfile {
            name: self.name.clone(),
            description: self.description.clone(),
            tea_amount: self.tea_amount,
        }
    }
}

/// Agent fields sent downstream. Note the key is `tea_amount`, not the
/// inbound `tea_amount_ml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub name: String,
    pub description: String,
    pub tea_amount: i64,
}

/// One inbound message and the name of the agent it came from.
///
/// A turn without a sender decodes with an empty `name` and excludes nobody.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    #[serde(default)]
    pub name: String,
    pub message: String,
}

/// Decode an event payload, unwrapping a CloudEvent envelope if present.
///
/// An envelope is recognised by a top-level `specversion` alongside `data`.
/// String-valued `data` is parsed again as JSON.
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_slice(payload)?;
    let inner = match value {
        serde_json::Value::Object(mut obj)
            if obj.contains_key("specversion") && obj.contains_key("data") =>
        {
            match obj.remove("data") {
                Some(serde_json::Value::String(s)) => serde_json::from_str(&s)?,
                Some(data) => data,
                None => serde_json::Value::Null,
            }
        }
        other => other,
    };
    serde_json::from_value(inner)
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
