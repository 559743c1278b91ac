// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the downstream generation service.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::agent::AgentProfile;
use crate::error::EventError;

/// Body of one downstream generate call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub agent: AgentProfile,
    pub message: String,
}

/// Boxed future returned by [`Generator::generate`].
pub type GenerateFuture<'a> = Pin<Box<dyn Future<Output = Result<String, EventError>> + Send + 'a>>;

/// Something that turns a selected agent and a message into a reply.
///
/// Object-safe for use as `Arc<dyn Generator>`. Resolves to the raw
/// response body on success.
pub trait Generator: Send + Sync {
    fn generate(&self, request: &GenerateRequest) -> GenerateFuture<'_>;
}

/// Generator reached over HTTP through a service invocation URL.
pub struct HttpGenerator {
    invoke_url: String,
    client: Client,
}

impl HttpGenerator {
    /// Build a client whose every call is bounded by `timeout`.
    pub fn new(invoke_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { invoke_url, client })
    }

    pub fn invoke_url(&self) -> &str {
        &self.invoke_url
    }

    async fn post(&self, body: &GenerateRequest) -> Result<String, EventError> {
        let resp = self
            .client
            .post(&self.invoke_url)
            .json(body)
            .send()
            .await
            .map_err(|e| EventError::Downstream(describe(&e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| EventError::Downstream(format!("reading response body: {e}")))?;
        if !status.is_success() {
            return Err(EventError::Downstream(format!("status {status}: {text}")));
        }
        Ok(text)
    }
}

impl Generator for HttpGenerator {
    fn generate(&self, request: &GenerateRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move { self.post(&request).await })
    }
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}
