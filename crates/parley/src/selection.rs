// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Responder selection: uniform choice among eligible agents.

use rand::Rng;

use crate::agent::Agent;
use crate::registry::AgentRegistry;

/// Pick a responder for a turn from `exclude_name`, or `None` if nobody is
/// eligible. Every eligible agent is equally likely, whatever its tea amount.
pub fn select_candidate(registry: &AgentRegistry, exclude_name: &str) -> Option<Agent> {
    let candidates = registry.snapshot(exclude_name);
    choose_uniform(candidates, &mut rand::rng())
}

/// Take one element of `candidates` uniformly at random.
pub fn choose_uniform<R: Rng + ?Sized>(candidates: Vec<Agent>, rng: &mut R) -> Option<Agent> {
    if candidates.is_empty() {
        return None;
    }
    let idx = rng.random_range(0..candidates.len());
    candidates.into_iter().nth(idx)
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
