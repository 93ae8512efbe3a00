// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Foreground HTTP server
//!
//! Wires the core services from an [`OrchestratorConfigManifest`] and serves
//! the router until Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use unison_core::{
    application::{coordinator::Coordinator, introspection::IntrospectionService},
    domain::{health::HealthProbe, orchestrator_config::OrchestratorConfigManifest},
    infrastructure::{
        event_bus::EventBus,
        health::HttpHealthProbe,
        policy_store::PolicyStore,
        skills::SkillRegistry,
        ticket_store::{spawn_sweeper, InMemoryTicketStore},
    },
    presentation::api::{app, AppState},
};

/// Build the shared application state described by `config`.
pub fn build_state(config: &OrchestratorConfigManifest) -> Result<Arc<AppState>> {
    let policy = Arc::new(PolicyStore::from_config(config).context("Failed to load policy rules")?);
    let tickets = Arc::new(InMemoryTicketStore::new(config.ticket_retention()));
    let registry = Arc::new(SkillRegistry::from_config(config));

    let coordinator = Arc::new(
        Coordinator::new(
            policy.clone(),
            tickets.clone(),
            registry.clone(),
            EventBus::with_default_capacity(),
        )
        .with_ticket_ttl(config.ticket_ttl()),
    );

    let probe_client = reqwest::Client::builder()
        .timeout(config.probe_timeout())
        .build()
        .context("Failed to create health probe client")?;
    let probes: Vec<Arc<dyn HealthProbe>> = config
        .spec
        .dependencies
        .iter()
        .map(|dep| {
            Arc::new(HttpHealthProbe::from_dependency(probe_client.clone(), dep))
                as Arc<dyn HealthProbe>
        })
        .collect();

    let introspection = Arc::new(
        IntrospectionService::new(probes, policy, registry, tickets)
            .with_probe_timeout(config.probe_timeout()),
    );

    Ok(Arc::new(AppState {
        coordinator,
        introspection,
    }))
}

pub async fn run_server(config: OrchestratorConfigManifest) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")?;

    info!(name = %config.metadata.name, "Configuration loaded");

    if config.spec.observability.metrics.enabled {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.spec.observability.metrics.port));
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Metrics exporter listening on {}", addr);
    }

    let state = build_state(&config)?;
    info!(
        skills = state.coordinator.registry().len(),
        rules = state.coordinator.policy().snapshot().len(),
        "Services initialized"
    );

    let sweeper = spawn_sweeper(state.coordinator.tickets().clone(), config.sweep_interval());

    let addr = format!(
        "{}:{}",
        config.spec.network.bind_address, config.spec.network.port
    );
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Unison orchestrator listening on {}", addr);

    let served = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed");

    sweeper.abort();
    info!("Unison orchestrator shut down");

    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use unison_core::domain::orchestrator_config::DependencyConfig;

    #[test]
    fn test_build_state_from_defaults() {
        let config = OrchestratorConfigManifest::default();
        let state = build_state(&config).unwrap();

        // Dependency-backed skills are skipped while no dependency is declared
        assert_eq!(
            state.coordinator.registry().list(),
            vec!["echo", "summarize.doc", "summarize.document"]
        );
        assert_eq!(state.coordinator.ticket_ttl(), config.ticket_ttl());
    }

    #[test]
    fn test_build_state_binds_dependency_skills() {
        let mut config = OrchestratorConfigManifest::default();
        config.spec.dependencies.push(DependencyConfig {
            name: "storage".to_string(),
            url: "http://localhost:8082".to_string(),
        });

        let state = build_state(&config).unwrap();
        assert!(state.coordinator.registry().contains("storage.put"));
        assert!(!state.coordinator.registry().contains("context.get"));
    }

    #[test]
    fn test_build_state_fails_on_missing_rules_file() {
        let mut config = OrchestratorConfigManifest::default();
        config.spec.policy.rules_path = Some("/nonexistent/unison/rules.yaml".into());
        assert!(build_state(&config).is_err());
    }
}
