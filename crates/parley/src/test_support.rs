// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: config builder and recording doubles for the
//! generator and state store seams.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::RouterConfig;
use crate::error::EventError;
use crate::generator::{GenerateFuture, GenerateRequest, Generator};
use crate::state::RouterState;
use crate::store::{AgentStore, SaveFuture};

/// Router config with defaults and NATS disabled.
pub fn test_config() -> RouterConfig {
    RouterConfig {
        host: "127.0.0.1".into(),
        port: 0,
        nats_url: None,
        nats_token: None,
        pubsub_name: "pubsub".into(),
        agents_topic: "agents".into(),
        conversations_topic: "conversations".into(),
        state_bucket: "statestore".into(),
        generator_url: "http://127.0.0.1:0".into(),
        generator_app_id: "dialogue-generator".into(),
        generator_method: "generate".into(),
        generator_timeout_ms: 15000,
        subscriber_capacity: 16,
    }
}

/// Router state wired to the given doubles.
pub fn test_state(
    generator: Arc<dyn Generator>,
    store: Option<Arc<dyn AgentStore>>,
) -> Arc<RouterState> {
    Arc::new(RouterState::new(test_config(), CancellationToken::new(), generator, store))
}

/// Generator double that records every request and answers with a fixed result.
pub struct RecordingGenerator {
    requests: Mutex<Vec<GenerateRequest>>,
    reply: Result<String, String>,
}

impl RecordingGenerator {
    /// Answers every call with `reply`.
    pub fn ok(reply: &str) -> Arc<Self> {
        Arc::new(Self { requests: Mutex::new(Vec::new()), reply: Ok(reply.to_owned()) })
    }

    /// Fails every call with a downstream error carrying `message`.
    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self { requests: Mutex::new(Vec::new()), reply: Err(message.to_owned()) })
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Generator for RecordingGenerator {
    fn generate(&self, request: &GenerateRequest) -> GenerateFuture<'_> {
        self.requests.lock().push(request.clone());
        let reply = self.reply.clone().map_err(EventError::Downstream);
        Box::pin(async move { reply })
    }
}

/// In-memory state store double. Records writes in completion order and can
/// be switched to reject them or to stall the first one.
#[derive(Default)]
pub struct MemoryStore {
    writes: Mutex<Vec<(String, Bytes)>>,
    reject: bool,
    first_write_delay: Mutex<Option<Duration>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A store whose every write fails.
    pub fn rejecting() -> Arc<Self> {
        Arc::new(Self { reject: true, ..Self::default() })
    }

    /// A store whose first write completes only after `delay`.
    pub fn slow_first_write(delay: Duration) -> Arc<Self> {
        Arc::new(Self { first_write_delay: Mutex::new(Some(delay)), ..Self::default() })
    }

    pub fn writes(&self) -> Vec<(String, Bytes)> {
        self.writes.lock().clone()
    }
}

impl AgentStore for MemoryStore {
    fn save(&self, key: String, value: Bytes) -> SaveFuture<'_> {
        let delay = self.first_write_delay.lock().take();
        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.reject {
                return Err(EventError::StateStore(format!("put {key}: store unavailable")));
            }
            self.writes.lock().push((key, value));
            Ok(())
        })
    }
}
