// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the router HTTP API and push delivery.
//!
//! Uses `axum_test::TestServer`: no real TCP needed.

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;

use parley::agent::Agent;
use parley::error::{DeliveryResponse, Disposition};
use parley::state::RouterState;
use parley::store::AgentStore;
use parley::test_support::{test_state, MemoryStore, RecordingGenerator};
use parley::transport::build_router;
use parley::transport::http::{HealthResponse, SubscriptionInfo};

fn test_server(state: Arc<RouterState>) -> anyhow::Result<TestServer> {
    let router = build_router(state);
    Ok(TestServer::new(router)?)
}

// -- Operator endpoints -------------------------------------------------------

#[tokio::test]
async fn health_reports_counts() -> anyhow::Result<()> {
    let state = test_state(RecordingGenerator::ok("ok"), None);
    state.registry.upsert(Agent::new("John", "", 300));
    state.registry.upsert(Agent::new("Empty", "", 0));
    let _sub = state.hub.register();

    let server = test_server(state)?;
    let resp = server.get("/api/v1/health").await;
    resp.assert_status_ok();

    let body: HealthResponse = resp.json();
    assert_eq!(body.status, "running");
    assert_eq!(body.agent_count, 2);
    assert_eq!(body.subscriber_count, 1);
    Ok(())
}

#[tokio::test]
async fn list_agents_includes_unavailable() -> anyhow::Result<()> {
    let state = test_state(RecordingGenerator::ok("ok"), None);
    state.registry.upsert(Agent::new("John", "A reliable agent", 300));
    state.registry.upsert(Agent::new("Empty", "Out of tea", 0));

    let server = test_server(state)?;
    let resp = server.get("/api/v1/agents").await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(
        body,
        json!([
            {"name": "John", "description": "A reliable agent", "tea_amount_ml": 300},
            {"name": "Empty", "description": "Out of tea", "tea_amount_ml": 0}
        ])
    );
    Ok(())
}

#[tokio::test]
async fn subscriptions_advertise_both_topics() -> anyhow::Result<()> {
    let server = test_server(test_state(RecordingGenerator::ok("ok"), None))?;

    let resp = server.get("/dapr/subscribe").await;
    resp.assert_status_ok();

    let subs: Vec<SubscriptionInfo> = resp.json();
    assert_eq!(subs.len(), 2);
    assert!(subs.iter().all(|s| s.pubsubname == "pubsub"));
    assert!(subs.iter().any(|s| s.topic == "agents" && s.route == "/agents"));
    assert!(subs.iter().any(|s| s.topic == "conversations" && s.route == "/conversations"));
    Ok(())
}

// -- Agent push delivery ------------------------------------------------------

#[tokio::test]
async fn push_agent_upserts_and_persists() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let state =
        test_state(RecordingGenerator::ok("ok"), Some(Arc::clone(&store) as Arc<dyn AgentStore>));
    let server = test_server(Arc::clone(&state))?;

    let resp = server
        .post("/agents")
        .json(&json!({"name": "John", "description": "A reliable agent", "tea_amount_ml": 300}))
        .await;
    resp.assert_status_ok();

    let body: DeliveryResponse = resp.json();
    assert_eq!(body.status, Disposition::Success);
    assert_eq!(state.registry.get("John").map(|a| a.tea_amount), Some(300));
    let writes = store.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, "agent_John");
    Ok(())
}

#[tokio::test]
async fn push_agent_accepts_cloudevent_envelope() -> anyhow::Result<()> {
    let state = test_state(RecordingGenerator::ok("ok"), None);
    let server = test_server(Arc::clone(&state))?;

    let resp = server
        .post("/agents")
        .json(&json!({
            "specversion": "1.0",
            "id": "1",
            "source": "user-interface",
            "type": "com.dapr.event.sent",
            "pubsubname": "pubsub",
            "topic": "agents",
            "datacontenttype": "application/json",
            "data": "{\"id\":\"x\",\"name\":\"Alice\",\"description\":\"curious\",\"tea_amount_ml\":50}"
        }))
        .await;
    resp.assert_status_ok();

    let body: DeliveryResponse = resp.json();
    assert_eq!(body.status, Disposition::Success);
    assert_eq!(state.registry.get("Alice"), Some(Agent::new("Alice", "curious", 50)));
    Ok(())
}

#[tokio::test]
async fn push_malformed_agent_is_dropped_not_retried() -> anyhow::Result<()> {
    let state = test_state(RecordingGenerator::ok("ok"), None);
    let server = test_server(Arc::clone(&state))?;

    let resp = server.post("/agents").text("bad json").await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "DROP");
    assert_eq!(body["error"]["code"], "DECODE_ERROR");
    assert!(state.registry.is_empty());
    Ok(())
}

#[tokio::test]
async fn push_agent_store_failure_is_dropped() -> anyhow::Result<()> {
    let state = test_state(
        RecordingGenerator::ok("ok"),
        Some(MemoryStore::rejecting() as Arc<dyn AgentStore>),
    );
    let server = test_server(Arc::clone(&state))?;

    let resp = server.post("/agents").json(&json!({"name": "John", "tea_amount_ml": 3})).await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "DROP");
    assert_eq!(body["error"]["code"], "STATE_STORE_ERROR");
    assert!(state.registry.get("John").is_some());
    Ok(())
}

#[tokio::test]
async fn push_agent_without_amount_is_registered_but_unavailable() -> anyhow::Result<()> {
    let state = test_state(RecordingGenerator::ok("ok"), None);
    let server = test_server(Arc::clone(&state))?;

    let resp = server.post("/agents").json(&json!({"name": "John", "description": "dry"})).await;
    resp.assert_status_ok();

    let body: DeliveryResponse = resp.json();
    assert_eq!(body.status, Disposition::Success);
    assert_eq!(state.registry.get("John"), Some(Agent::new("John", "dry", 0)));
    assert!(state.registry.snapshot("Doe").is_empty());
    Ok(())
}

// -- Conversation push delivery -----------------------------------------------

#[tokio::test]
async fn conversation_is_forwarded_to_only_eligible_agent() -> anyhow::Result<()> {
    let generator = RecordingGenerator::ok("Success");
    let state = test_state(generator.clone(), None);
    let server = test_server(Arc::clone(&state))?;

    server
        .post("/agents")
        .json(&json!({"name": "John", "description": "A reliable agent", "tea_amount_ml": 300}))
        .await
        .assert_status_ok();
    let resp =
        server.post("/conversations").json(&json!({"name": "Doe", "message": "Hello, world!"})).await;
    resp.assert_status_ok();

    let body: DeliveryResponse = resp.json();
    assert_eq!(body.status, Disposition::Success);
    let requests = generator.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].agent.name, "John");
    assert_eq!(requests[0].message, "Hello, world!");
    Ok(())
}

#[tokio::test]
async fn conversation_with_empty_registry_makes_no_call() -> anyhow::Result<()> {
    let generator = RecordingGenerator::ok("unused");
    let server = test_server(test_state(generator.clone(), None))?;

    let resp = server.post("/conversations").json(&json!({"name": "Doe", "message": "hi"})).await;
    resp.assert_status_ok();

    let body: DeliveryResponse = resp.json();
    assert_eq!(body.status, Disposition::Success);
    assert!(body.error.is_none());
    assert_eq!(generator.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn conversation_downstream_failure_is_still_handled() -> anyhow::Result<()> {
    let generator = RecordingGenerator::failing("status 503 Service Unavailable: down");
    let state = test_state(generator.clone(), None);
    state.registry.upsert(Agent::new("John", "", 300));
    let server = test_server(state)?;

    let resp = server.post("/conversations").json(&json!({"name": "Doe", "message": "hi"})).await;
    resp.assert_status_ok();

    let body: DeliveryResponse = resp.json();
    assert_eq!(body.status, Disposition::Success);
    assert_eq!(generator.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn conversation_without_sender_can_reach_any_agent() -> anyhow::Result<()> {
    let generator = RecordingGenerator::ok("ok");
    let state = test_state(generator.clone(), None);
    state.registry.upsert(Agent::new("John", "", 300));
    let server = test_server(state)?;

    let resp = server.post("/conversations").json(&json!({"message": "who is there?"})).await;
    resp.assert_status_ok();

    let body: DeliveryResponse = resp.json();
    assert_eq!(body.status, Disposition::Success);
    let requests = generator.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].agent.name, "John");
    Ok(())
}

#[tokio::test]
async fn malformed_conversation_is_dropped() -> anyhow::Result<()> {
    let generator = RecordingGenerator::ok("ok");
    let state = test_state(generator.clone(), None);
    state.registry.upsert(Agent::new("John", "", 300));
    let mut sub = state.hub.register();
    let server = test_server(Arc::clone(&state))?;

    let resp = server.post("/conversations").text("{\"name\":\"Doe\"}").await;
    resp.assert_status_ok();

    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "DROP");
    assert_eq!(generator.call_count(), 0);
    assert!(sub.try_recv().is_none());
    Ok(())
}

#[tokio::test]
async fn conversation_is_broadcast_to_subscribers() -> anyhow::Result<()> {
    let state = test_state(RecordingGenerator::ok("ok"), None);
    let mut a = state.hub.register();
    let mut b = state.hub.register();
    let server = test_server(Arc::clone(&state))?;

    server
        .post("/conversations")
        .json(&json!({"name": "Doe", "message": "e1"}))
        .await
        .assert_status_ok();
    assert_eq!(a.try_recv().map(|t| t.message), Some("e1".to_owned()));
    assert_eq!(b.try_recv().map(|t| t.message), Some("e1".to_owned()));

    drop(b);
    server
        .post("/conversations")
        .json(&json!({"name": "Doe", "message": "e2"}))
        .await
        .assert_status_ok();
    assert_eq!(a.try_recv().map(|t| t.message), Some("e2".to_owned()));
    assert_eq!(state.hub.subscriber_count(), 1);
    Ok(())
}
