// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event stream endpoint: one `data: <json>` frame per conversation turn.
//!
//! Each connection owns one hub [`Subscription`]. The subscription lives in
//! the stream's state and is released however the stream ends, including
//! when the client goes away and axum drops the body.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use tokio_util::sync::CancellationToken;

use crate::agent::ConversationTurn;
use crate::hub::Subscription;
use crate::state::RouterState;

/// `GET /events`: long-lived `text/event-stream` of conversation turns.
pub async fn events(
    State(state): State<Arc<RouterState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.hub.register();
    tracing::debug!(subscriber = %subscription.id(), "event stream opened");
    let cancel = state.shutdown.child_token();
    Sse::new(turn_stream(subscription, cancel)).keep_alive(KeepAlive::default())
}

/// Stream delivered turns until `cancel` fires or the subscription closes.
pub fn turn_stream(
    subscription: Subscription<ConversationTurn>,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<Event, Infallible>> {
    futures_util::stream::unfold((subscription, cancel), |(mut sub, cancel)| async move {
        let turn = tokio::select! {
            _ = cancel.cancelled() => None,
            turn = sub.recv() => turn,
        };
        let Some(turn) = turn else {
            tracing::debug!(subscriber = %sub.id(), "event stream closed");
            return None;
        };
        match Event::default().json_data(&turn) {
            Ok(event) => Some((Ok(event), (sub, cancel))),
            Err(e) => {
                tracing::warn!(subscriber = %sub.id(), err = %e, "failed to encode turn");
                None
            }
        }
    })
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
