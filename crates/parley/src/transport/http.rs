// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for operator endpoints and push-delivered events.
//!
//! Push routes always answer `200`; the body's `status` tells the sidecar
//! whether the event was handled or dropped. Neither asks for redelivery.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::state::RouterState;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub agent_count: usize,
    pub subscriber_count: usize,
}

/// One topic subscription advertised to a push-delivery sidecar.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub pubsubname: String,
    pub topic: String,
    pub route: String,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<RouterState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "running".to_owned(),
        agent_count: s.registry.len(),
        subscriber_count: s.hub.subscriber_count(),
    })
}

/// `GET /api/v1/agents`: every registered agent, eligible or not.
pub async fn list_agents(State(s): State<Arc<RouterState>>) -> Json<Vec<Agent>> {
    Json(s.registry.list())
}

/// `GET /dapr/subscribe`: topics this router consumes and where to push them.
pub async fn subscriptions(State(s): State<Arc<RouterState>>) -> Json<Vec<SubscriptionInfo>> {
    let pubsub = &s.config.pubsub_name;
    Json(vec![
        SubscriptionInfo {
            pubsubname: pubsub.clone(),
            topic: s.config.agents_topic.clone(),
            route: "/agents".to_owned(),
        },
        SubscriptionInfo {
            pubsubname: pubsub.clone(),
            topic: s.config.conversations_topic.clone(),
            route: "/conversations".to_owned(),
        },
    ])
}

/// `POST /agents`: push-delivered agent event.
pub async fn push_agent(State(s): State<Arc<RouterState>>, body: Bytes) -> impl IntoResponse {
    Json(s.dispatch_agent(&body).await)
}

/// `POST /conversations`: push-delivered conversation event.
pub async fn push_conversation(
    State(s): State<Arc<RouterState>>,
    body: Bytes,
) -> impl IntoResponse {
    Json(s.dispatch_conversation(&body).await)
}
