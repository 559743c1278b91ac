// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! NATS ingress for agent and conversation events.
//!
//! Subscribes to the agents and conversations subjects on a core NATS
//! connection. Agent events are applied in arrival order on the subscriber
//! task so the last delivered registration wins. Each conversation event
//! runs on its own task, since routing it waits on the generation service.
//!
//! Core NATS delivers at most once, so nothing here can trigger a
//! redelivery. When a publisher used request/reply, the reply subject
//! receives the [`DeliveryResponse`].

use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::error::DeliveryResponse;
use crate::state::RouterState;
use crate::NatsConfig;

/// Connect to the NATS server.
pub async fn connect(config: &NatsConfig) -> anyhow::Result<async_nats::Client> {
    let mut opts = async_nats::ConnectOptions::new();
    if let Some(ref token) = config.token {
        opts = opts.token(token.clone());
    }
    opts = opts.retry_on_initial_connect();

    tracing::info!(url = %config.url, "connecting to NATS");
    let client = opts.connect(&config.url).await?;
    tracing::info!("NATS connected");
    Ok(client)
}

/// Live subscriptions on both event subjects.
pub struct NatsIngress {
    client: async_nats::Client,
    agents: async_nats::Subscriber,
    conversations: async_nats::Subscriber,
}

impl NatsIngress {
    /// Subscribe to `agents_subject` and `conversations_subject`.
    pub async fn subscribe(
        client: async_nats::Client,
        agents_subject: &str,
        conversations_subject: &str,
    ) -> anyhow::Result<Self> {
        let agents = client.subscribe(agents_subject.to_owned()).await?;
        let conversations = client.subscribe(conversations_subject.to_owned()).await?;
        tracing::info!(
            agents = agents_subject,
            conversations = conversations_subject,
            "nats ingress subscribed"
        );
        Ok(Self { client, agents, conversations })
    }

    /// Run the ingress loop as a background task until shutdown.
    pub fn spawn(self, state: Arc<RouterState>) {
        let shutdown = state.shutdown.clone();
        tokio::spawn(self.run(state, shutdown));
    }

    async fn run(mut self, state: Arc<RouterState>, shutdown: CancellationToken) {
        let mut agents_open = true;
        let mut conversations_open = true;
        while agents_open || conversations_open {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                msg = self.agents.next(), if agents_open => {
                    let Some(msg) = msg else {
                        tracing::warn!("nats: agents subscription closed");
                        agents_open = false;
                        continue;
                    };
                    let response = handle_agent_message(&state, &msg.payload).await;
                    acknowledge(&self.client, msg.reply, &response).await;
                }
                msg = self.conversations.next(), if conversations_open => {
                    let Some(msg) = msg else {
                        tracing::warn!("nats: conversations subscription closed");
                        conversations_open = false;
                        continue;
                    };
                    let state = Arc::clone(&state);
                    let client = self.client.clone();
                    tokio::spawn(async move {
                        let response = handle_conversation_message(&state, &msg.payload).await;
                        acknowledge(&client, msg.reply, &response).await;
                    });
                }
            }
        }
        tracing::info!("nats ingress stopped");
    }
}

/// Handle one agent message payload.
pub async fn handle_agent_message(state: &RouterState, payload: &Bytes) -> DeliveryResponse {
    tracing::trace!(len = payload.len(), "nats: agent event");
    state.dispatch_agent(payload).await
}

/// Handle one conversation message payload.
pub async fn handle_conversation_message(
    state: &RouterState,
    payload: &Bytes,
) -> DeliveryResponse {
    tracing::trace!(len = payload.len(), "nats: conversation event");
    state.dispatch_conversation(payload).await
}

async fn acknowledge(
    client: &async_nats::Client,
    reply: Option<async_nats::Subject>,
    response: &DeliveryResponse,
) {
    let Some(reply) = reply else { return };
    match serde_json::to_vec(response) {
        Ok(json) => {
            if let Err(e) = client.publish(reply, json.into()).await {
                tracing::debug!(err = %e, "nats: reply publish failed");
            }
        }
        Err(e) => tracing::debug!(err = %e, "nats: reply encode failed"),
    }
}

#[cfg(test)]
#[path = "nats_sub_tests.rs"]
mod tests;
