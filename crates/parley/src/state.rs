// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::agent::{decode_payload, ConversationTurn};
use crate::config::RouterConfig;
use crate::error::{DeliveryResponse, EventError};
use crate::generator::Generator;
use crate::hub::BroadcastHub;
use crate::pipeline::{Orchestrator, TurnOutcome};
use crate::registry::AgentRegistry;
use crate::store::AgentStore;

/// Shared router state.
pub struct RouterState {
    pub config: RouterConfig,
    pub shutdown: CancellationToken,
    pub registry: Arc<AgentRegistry>,
    /// Live stream subscribers for conversation turns.
    pub hub: BroadcastHub<ConversationTurn>,
    pub orchestrator: Orchestrator,
}

impl RouterState {
    pub fn new(
        config: RouterConfig,
        shutdown: CancellationToken,
        generator: Arc<dyn Generator>,
        store: Option<Arc<dyn AgentStore>>,
    ) -> Self {
        let registry = Arc::new(AgentRegistry::new());
        let hub = BroadcastHub::new(config.subscriber_capacity);
        let orchestrator = Orchestrator::new(Arc::clone(&registry), generator, store);
        Self { config, shutdown, registry, hub, orchestrator }
    }

    /// Handle one agent event from any ingress.
    pub async fn dispatch_agent(&self, payload: &[u8]) -> DeliveryResponse {
        match self.orchestrator.handle_agent(payload).await {
            Ok(_) => DeliveryResponse::success(),
            Err(e) => {
                warn!(err = %e, "agent event dropped");
                DeliveryResponse::drop_with(&e)
            }
        }
    }

    /// Handle one conversation event from any ingress.
    ///
    /// The turn goes to both consumers: it is fanned out to stream
    /// subscribers first, then routed to a responder.
    pub async fn dispatch_conversation(&self, payload: &[u8]) -> DeliveryResponse {
        match self.fan_out_and_route(payload).await {
            Ok(outcome) => {
                debug!(agent = outcome.agent().unwrap_or("-"), "conversation event handled");
                DeliveryResponse { status: outcome.disposition(), error: None }
            }
            Err(e) => {
                warn!(err = %e, "conversation event dropped");
                DeliveryResponse::drop_with(&e)
            }
        }
    }

    async fn fan_out_and_route(&self, payload: &[u8]) -> Result<TurnOutcome, EventError> {
        let turn: ConversationTurn = decode_payload(payload)?;
        let report = self.hub.publish(&turn);
        debug!(
            delivered = report.delivered,
            dropped = report.dropped,
            "conversation turn broadcast"
        );
        Ok(self.orchestrator.route_turn(&turn).await)
    }
}
