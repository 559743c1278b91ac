// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parley: routes conversation events between tea-drinking agents.
//!
//! Agent events keep an in-memory registry current. Each conversation turn
//! is fanned out to live `/events` stream subscribers and forwarded, with a
//! randomly chosen responder's profile, to the generation service.

pub mod agent;
pub mod config;
pub mod error;
pub mod generator;
pub mod hub;
pub mod pipeline;
pub mod registry;
pub mod selection;
pub mod state;
pub mod store;
pub mod test_support;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::RouterConfig;
use crate::generator::HttpGenerator;
use crate::state::RouterState;
use crate::store::{AgentStore, KvAgentStore};
use crate::transport::build_router;
use crate::transport::nats_sub::NatsIngress;

/// NATS connection settings, split out of [`RouterConfig`] once a URL is set.
pub struct NatsConfig {
    pub url: String,
    pub token: Option<String>,
}

impl NatsConfig {
    pub fn from_router_config(config: &RouterConfig) -> Option<Self> {
        config
            .nats_url
            .as_ref()
            .map(|url| Self { url: url.clone(), token: config.nats_token.clone() })
    }
}

/// Run the router until shutdown.
///
/// Every collaborator is built here, once; any failure to build one is
/// returned before the first event is accepted.
pub async fn run(config: RouterConfig) -> anyhow::Result<()> {
    config.validate()?;
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let generator =
        Arc::new(HttpGenerator::new(config.generator_invoke_url(), config.generator_timeout())?);
    tracing::info!(url = generator.invoke_url(), "generator configured");

    let mut ingress = None;
    let mut store: Option<Arc<dyn AgentStore>> = None;
    if let Some(nats) = NatsConfig::from_router_config(&config) {
        let client = transport::nats_sub::connect(&nats).await?;
        store = Some(Arc::new(KvAgentStore::open(client.clone(), &config.state_bucket).await?));
        ingress = Some(
            NatsIngress::subscribe(client, &config.agents_topic, &config.conversations_topic)
                .await?,
        );
    } else {
        tracing::info!("no NATS url configured, accepting push delivery only");
    }

    let state = Arc::new(RouterState::new(config, shutdown.clone(), generator, store));
    if let Some(ingress) = ingress {
        ingress.spawn(Arc::clone(&state));
    }

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("parley listening on {addr}");
    spawn_signal_handler(shutdown.clone());

    let router = build_router(state);
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}

/// Install the ring crypto provider for reqwest/rustls. Only the first
/// call has effect.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = term.recv() => {}
                    }
                }
                Err(e) => {
                    tracing::warn!(err = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }
        tracing::info!("shutdown requested");
        shutdown.cancel();
    });
}
