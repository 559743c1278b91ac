// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Configuration for the parley router.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "parley", about = "Routes conversation events between agents")]
pub struct RouterConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "PARLEY_HOST")]
    pub host: String,

    /// Port to listen on (push ingress and the event stream).
    #[arg(long, default_value_t = 5300, env = "PARLEY_PORT")]
    pub port: u16,

    /// NATS server URL. If unset, NATS ingress and the state store are disabled.
    #[arg(long, env = "PARLEY_NATS_URL")]
    pub nats_url: Option<String>,

    /// Auth token for the NATS connection.
    #[arg(long, env = "PARLEY_NATS_TOKEN")]
    pub nats_token: Option<String>,

    /// Pub/sub component name advertised to push-delivery sidecars.
    #[arg(long, default_value = "pubsub", env = "PARLEY_PUBSUB_NAME")]
    pub pubsub_name: String,

    /// Topic carrying agent registrations.
    #[arg(long, default_value = "agents", env = "PARLEY_AGENTS_TOPIC")]
    pub agents_topic: String,

    /// Topic carrying conversation turns.
    #[arg(long, default_value = "conversations", env = "PARLEY_CONVERSATIONS_TOPIC")]
    pub conversations_topic: String,

    /// JetStream key-value bucket used as the agent state store.
    #[arg(long, default_value = "statestore", env = "PARLEY_STATE_BUCKET")]
    pub state_bucket: String,

    /// Base URL of the service invocation sidecar.
    #[arg(long, default_value = "http://localhost:3500", env = "PARLEY_GENERATOR_URL")]
    pub generator_url: String,

    /// Downstream service that generates agent replies.
    #[arg(long, default_value = "dialogue-generator", env = "PARLEY_GENERATOR_APP_ID")]
    pub generator_app_id: String,

    /// Method invoked on the downstream service.
    #[arg(long, default_value = "generate", env = "PARLEY_GENERATOR_METHOD")]
    pub generator_method: String,

    /// Downstream invocation timeout in milliseconds.
    #[arg(long, default_value_t = 15000, env = "PARLEY_GENERATOR_TIMEOUT_MS")]
    pub generator_timeout_ms: u64,

    /// Queue depth per stream subscriber; events beyond it are dropped for that subscriber.
    #[arg(long, default_value_t = 64, env = "PARLEY_SUBSCRIBER_CAPACITY")]
    pub subscriber_capacity: usize,
}

impl RouterConfig {
    /// Reject settings the router cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.subscriber_capacity == 0 {
            anyhow::bail!("--subscriber-capacity must be at least 1");
        }
        if self.generator_timeout_ms == 0 {
            anyhow::bail!("--generator-timeout-ms must be at least 1");
        }
        if self.agents_topic.is_empty() || self.conversations_topic.is_empty() {
            anyhow::bail!("topic names must not be empty");
        }
        Ok(())
    }

    pub fn generator_timeout(&self) -> Duration {
        Duration::from_millis(self.generator_timeout_ms)
    }

    /// Full URL of the downstream generate call.
    pub fn generator_invoke_url(&self) -> String {
        format!(
            "{}/v1.0/invoke/{}/method/{}",
            self.generator_url.trim_end_matches('/'),
            self.generator_app_id,
            self.generator_method
        )
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
