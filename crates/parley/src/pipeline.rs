// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event-to-invocation pipeline.
//!
//! Agent events update the registry (and the state store when one is
//! configured). Each decoded conversation turn runs once through
//! select, build request, invoke, log. There are no retries here and a
//! redelivered turn is simply routed again.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::agent::{decode_payload, Agent, ConversationTurn};
use crate::error::{Disposition, EventError};
use crate::generator::{GenerateRequest, Generator};
use crate::registry::AgentRegistry;
use crate::selection::select_candidate;
use crate::store::{encode_record, AgentStore};

/// How one conversation turn ended. All outcomes count as handled.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The chosen agent's request was accepted downstream.
    Forwarded { agent: String, response: String },
    /// Nobody was eligible; no downstream call was made.
    NoCandidate,
    /// The downstream call failed for the chosen agent.
    Failed { agent: String, error: EventError },
}

impl TurnOutcome {
    pub fn disposition(&self) -> Disposition {
        Disposition::Success
    }

    /// Name of the selected responder, if one was chosen.
    pub fn agent(&self) -> Option<&str> {
        match self {
            Self::Forwarded { agent, .. } | Self::Failed { agent, .. } => Some(agent.as_str()),
            Self::NoCandidate => None,
        }
    }
}

/// Routes agent and conversation events to the registry and the generator.
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    generator: Arc<dyn Generator>,
    store: Option<Arc<dyn AgentStore>>,
    apply_lock: tokio::sync::Mutex<()>,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<AgentRegistry>,
        generator: Arc<dyn Generator>,
        store: Option<Arc<dyn AgentStore>>,
    ) -> Self {
        Self { registry, generator, store, apply_lock: tokio::sync::Mutex::new(()) }
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Decode and apply an agent event.
    ///
    /// The registry upsert happens before the store write and is kept even
    /// when the store write fails.
    pub async fn handle_agent(&self, payload: &[u8]) -> Result<Agent, EventError> {
        let agent: Agent = decode_payload(payload)?;
        self.apply_agent(agent).await
    }

    /// Upsert `agent` and persist it.
    ///
    /// Applies are serialized, so the store sees agent records in the same
    /// order as the registry and its last write for a name matches the
    /// registry entry.
    pub async fn apply_agent(&self, agent: Agent) -> Result<Agent, EventError> {
        let _ordered = self.apply_lock.lock().await;
        self.registry.upsert(agent.clone());
        debug!(agent = %agent.name, tea_amount = agent.tea_amount, "agent upserted");

        if let Some(ref store) = self.store {
            let (key, value) = encode_record(&agent)?;
            store.save(key, value).await?;
            info!(agent = %agent.name, "agent state saved");
        }
        Ok(agent)
    }

    /// Select a responder for `turn` and forward it downstream, at most once.
    pub async fn route_turn(&self, turn: &ConversationTurn) -> TurnOutcome {
        let Some(agent) = select_candidate(&self.registry, &turn.name) else {
            info!(from = %turn.name, "no available agent to handle the conversation");
            return TurnOutcome::NoCandidate;
        };

        let request = GenerateRequest { agent: agent.profile(), message: turn.message.clone() };
        match self.generator.generate(&request).await {
            Ok(response) => {
                info!(
                    from = %turn.name,
                    agent = %agent.name,
                    response = %response,
                    "generator responded"
                );
                TurnOutcome::Forwarded { agent: agent.name, response }
            }
            Err(error) => {
                warn!(
                    from = %turn.name,
                    agent = %agent.name,
                    err = %error,
                    "generator invocation failed"
                );
                TurnOutcome::Failed { agent: agent.name, error }
            }
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
