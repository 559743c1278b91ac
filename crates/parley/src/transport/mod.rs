// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbound transports: NATS subscriptions, HTTP push delivery, and the
//! event stream.

pub mod http;
pub mod nats_sub;
pub mod sse;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::RouterState;

/// Build the axum `Router` with all routes.
pub fn build_router(state: Arc<RouterState>) -> Router {
    Router::new()
        // Operator endpoints
        .route("/api/v1/health", get(http::health))
        .route("/api/v1/agents", get(http::list_agents))
        // Push delivery
        .route("/dapr/subscribe", get(http::subscriptions))
        .route("/agents", post(http::push_agent))
        .route("/conversations", post(http::push_conversation))
        // Live stream
        .route("/events", get(sse::events))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
