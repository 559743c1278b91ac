// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable agent state store.
//!
//! Written on every agent event, never read back for selection: the
//! in-memory registry is authoritative and the store is an audit copy.

use std::future::Future;
use std::pin::Pin;

use async_nats::jetstream::kv;
use bytes::Bytes;
use tracing::info;

use crate::agent::Agent;
use crate::error::EventError;

/// Boxed future returned by [`AgentStore::save`].
pub type SaveFuture<'a> = Pin<Box<dyn Future<Output = Result<(), EventError>> + Send + 'a>>;

/// Write-only sink for agent records. Object-safe for `Arc<dyn AgentStore>`.
pub trait AgentStore: Send + Sync {
    fn save(&self, key: String, value: Bytes) -> SaveFuture<'_>;
}

/// Store key for an agent.
pub fn state_key(name: &str) -> String {
    format!("agent_{name}")
}

/// Encode an agent as its store key and JSON value.
pub fn encode_record(agent: &Agent) -> Result<(String, Bytes), EventError> {
    let value = serde_json::to_vec(agent)
        .map_err(|e| EventError::StateStore(format!("encoding agent {}: {e}", agent.name)))?;
    Ok((state_key(&agent.name), Bytes::from(value)))
}

/// Agent store backed by a NATS JetStream key-value bucket.
pub struct KvAgentStore {
    store: kv::Store,
}

impl KvAgentStore {
    /// Open `bucket`, creating it if it does not exist yet.
    pub async fn open(client: async_nats::Client, bucket: &str) -> anyhow::Result<Self> {
        let js = async_nats::jetstream::new(client);
        let store = match js.get_key_value(bucket).await {
            Ok(store) => store,
            Err(e) => {
                info!(bucket, err = %e, "state bucket not found, creating");
                js.create_key_value(kv::Config { bucket: bucket.to_owned(), ..Default::default() })
                    .await?
            }
        };
        info!(bucket, "state store ready");
        Ok(Self { store })
    }
}

impl AgentStore for KvAgentStore {
    fn save(&self, key: String, value: Bytes) -> SaveFuture<'_> {
        Box::pin(async move {
            self.store
                .put(key.as_str(), value)
                .await
                .map(|_revision| ())
                .map_err(|e| EventError::StateStore(format!("put {key}: {e}")))
        })
    }
}
