// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Readiness and introspection
//!
//! Read-only views over the running orchestrator. Dependency probes run on
//! every call; nothing is cached.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::debug;

use crate::domain::confirmation::TicketStore;
use crate::domain::health::{HealthProbe, ServiceStatus};
use crate::domain::policy::{PolicyEffect, RuleSummary};
use crate::domain::skill::SkillBindingInfo;
use crate::infrastructure::policy_store::PolicyStore;
use crate::infrastructure::skills::SkillRegistry;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readiness {
    pub ready: bool,
    pub deps: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntrospectionSnapshot {
    pub services: Vec<ServiceStatus>,
    pub skills: Vec<SkillBindingInfo>,
    pub policy_rules: Vec<RuleSummary>,
    pub default_effect: PolicyEffect,
    pub pending_confirmations: usize,
}

pub struct IntrospectionService {
    probes: Vec<Arc<dyn HealthProbe>>,
    probe_timeout: Duration,
    policy: Arc<PolicyStore>,
    registry: Arc<SkillRegistry>,
    tickets: Arc<dyn TicketStore>,
}

impl IntrospectionService {
    pub fn new(
        probes: Vec<Arc<dyn HealthProbe>>,
        policy: Arc<PolicyStore>,
        registry: Arc<SkillRegistry>,
        tickets: Arc<dyn TicketStore>,
    ) -> Self {
        Self {
            probes,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            policy,
            registry,
            tickets,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Ready only when every declared dependency answers healthy.
    pub async fn readiness(&self) -> Readiness {
        let deps: BTreeMap<String, bool> = self
            .probe_all()
            .await
            .into_iter()
            .map(|status| (status.name, status.healthy))
            .collect();
        Readiness {
            ready: deps.values().all(|healthy| *healthy),
            deps,
        }
    }

    pub async fn snapshot(&self) -> IntrospectionSnapshot {
        let services = self.probe_all().await;
        let rules = self.policy.snapshot();
        IntrospectionSnapshot {
            services,
            skills: self.registry.bindings(),
            policy_rules: rules.summary(),
            default_effect: rules.default_effect,
            pending_confirmations: self.tickets.pending_count(),
        }
    }

    async fn probe_all(&self) -> Vec<ServiceStatus> {
        let timeout = self.probe_timeout;
        join_all(self.probes.iter().map(|probe| async move {
            let healthy = tokio::time::timeout(timeout, probe.check())
                .await
                .unwrap_or(false);
            debug!(dependency = probe.name(), healthy, "Dependency probed");
            ServiceStatus {
                name: probe.name().to_string(),
                url: probe.target(),
                healthy,
            }
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ticket_store::InMemoryTicketStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Toggle {
        name: &'static str,
        healthy: AtomicBool,
    }

    #[async_trait]
    impl HealthProbe for Toggle {
        fn name(&self) -> &str {
            self.name
        }

        async fn check(&self) -> bool {
            self.healthy.load(Ordering::SeqCst)
        }
    }

    struct Hanging;

    #[async_trait]
    impl HealthProbe for Hanging {
        fn name(&self) -> &str {
            "actuation"
        }

        async fn check(&self) -> bool {
            tokio::time::sleep(Duration::from_secs(30)).await;
            true
        }
    }

    fn service(probes: Vec<Arc<dyn HealthProbe>>) -> IntrospectionService {
        IntrospectionService::new(
            probes,
            Arc::new(PolicyStore::default()),
            Arc::new(SkillRegistry::default()),
            Arc::new(InMemoryTicketStore::default()),
        )
    }

    #[tokio::test]
    async fn test_no_dependencies_is_ready() {
        let readiness = service(vec![]).readiness().await;
        assert!(readiness.ready);
        assert!(readiness.deps.is_empty());
    }

    #[tokio::test]
    async fn test_readiness_is_reevaluated_each_call() {
        let context = Arc::new(Toggle {
            name: "context",
            healthy: AtomicBool::new(true),
        });
        let service = service(vec![context.clone() as Arc<dyn HealthProbe>]);

        assert!(service.readiness().await.ready);

        context.healthy.store(false, Ordering::SeqCst);
        let readiness = service.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.deps.get("context"), Some(&false));

        context.healthy.store(true, Ordering::SeqCst);
        assert!(service.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_hanging_probe_times_out_as_unhealthy() {
        let service = service(vec![
            Arc::new(Toggle {
                name: "context",
                healthy: AtomicBool::new(true),
            }) as Arc<dyn HealthProbe>,
            Arc::new(Hanging),
        ])
        .with_probe_timeout(Duration::from_millis(20));

        let readiness = service.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.deps.get("context"), Some(&true));
        assert_eq!(readiness.deps.get("actuation"), Some(&false));
    }

    #[tokio::test]
    async fn test_snapshot_lists_rules_and_skills() {
        let service = service(vec![]);
        service
            .registry
            .register("echo", Arc::new(crate::infrastructure::skills::EchoSkill))
            .unwrap();

        let snapshot = service.snapshot().await;
        assert_eq!(snapshot.skills.len(), 1);
        assert_eq!(snapshot.skills[0].intent, "echo");
        assert_eq!(snapshot.policy_rules.len(), 1);
        assert_eq!(snapshot.default_effect, PolicyEffect::Allow);
        assert_eq!(snapshot.pending_confirmations, 0);
    }
}
