// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory agent registry.
//!
//! The registry owns its lock. Every operation is one short critical
//! section, so a snapshot always reflects the latest completed upsert and
//! never a half-written entry.

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::agent::Agent;

/// Known agents keyed by name. Entries are inserted or overwritten, never removed.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: Mutex<IndexMap<String, Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `agent.name` (last write wins).
    ///
    /// Returns the previous entry, if any. An overwritten agent keeps its
    /// original position in listing order.
    pub fn upsert(&self, agent: Agent) -> Option<Agent> {
        self.agents.lock().insert(agent.name.clone(), agent)
    }

    /// Agents eligible to answer a turn from `exclude_name`: every agent
    /// with a different name and a positive tea amount.
    pub fn snapshot(&self, exclude_name: &str) -> Vec<Agent> {
        self.agents
            .lock()
            .values()
            .filter(|a| a.name != exclude_name && a.is_available())
            .cloned()
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Agent> {
        self.agents.lock().get(name).cloned()
    }

    /// Every registered agent, including unavailable ones, in insertion order.
    pub fn list(&self) -> Vec<Agent> {
        self.agents.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
