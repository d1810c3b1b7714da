// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP server wiring

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fleet_core::application::{ActionResolver, EventClassifier, PolicyReconciler, StandardAckService};
use fleet_core::domain::action::ActionCache;
use fleet_core::domain::config::FleetServerConfig;
use fleet_core::domain::repository::{ActionRepository, AgentRepository, Bulker};
use fleet_core::infrastructure::action_cache::LruActionCache;
use fleet_core::infrastructure::db::Database;
use fleet_core::infrastructure::policy_writer::BulkPolicyPositionWriter;
use fleet_core::infrastructure::repositories::{InMemoryDocumentStore, PostgresDocumentStore};
use fleet_core::presentation::api::{app, AppState};

struct Stores {
    agents: Arc<dyn AgentRepository>,
    actions: Arc<dyn ActionRepository>,
    bulker: Arc<dyn Bulker>,
}

async fn build_stores(config: &FleetServerConfig) -> Result<Stores> {
    match Database::from_config(&config.spec.database).await? {
        Some(db) => {
            db.migrate().await?;
            let store = Arc::new(PostgresDocumentStore::new(db.get_pool().clone()));
            info!("Using PostgreSQL document store");
            Ok(Stores {
                agents: store.clone(),
                actions: store.clone(),
                bulker: store,
            })
        }
        None => {
            warn!("No database configured, using in-memory document store");
            let store = Arc::new(InMemoryDocumentStore::new());
            Ok(Stores {
                agents: store.clone(),
                actions: store.clone(),
                bulker: store,
            })
        }
    }
}

pub async fn run(config: FleetServerConfig) -> Result<()> {
    let metrics_config = &config.spec.observability.metrics;
    if metrics_config.enabled {
        let addr = SocketAddr::from(([0, 0, 0, 0], metrics_config.port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Metrics listening on {}", addr);
    }

    let stores = build_stores(&config).await?;

    // Shared with action distribution, which populates it.
    let cache_config = &config.spec.action_cache;
    let cache: Arc<dyn ActionCache> = Arc::new(LruActionCache::new(cache_config.capacity, cache_config.ttl()));

    let classifier = EventClassifier::new(ActionResolver::new(cache, stores.actions));
    let reconciler = PolicyReconciler::new(Arc::new(BulkPolicyPositionWriter::new(stores.bulker)));
    let ack_service = Arc::new(StandardAckService::new(classifier, reconciler));

    let shutdown = CancellationToken::new();
    let router = app(AppState {
        agents: stores.agents,
        ack_service,
        shutdown: shutdown.clone(),
    });

    let addr = format!("{}:{}", config.spec.network.bind_address, config.spec.network.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Fleet server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("HTTP server failed")?;

    info!("Fleet server shutting down");

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    shutdown.cancel();
}
