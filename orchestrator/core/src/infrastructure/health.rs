// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use tracing::debug;

use crate::domain::health::HealthProbe;
use crate::domain::orchestrator_config::DependencyConfig;

/// Probes `GET {url}/health`; any 2xx counts as healthy.
pub struct HttpHealthProbe {
    client: reqwest::Client,
    name: String,
    url: String,
}

impl HttpHealthProbe {
    pub fn new(client: reqwest::Client, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn from_dependency(client: reqwest::Client, dependency: &DependencyConfig) -> Self {
        Self::new(client, dependency.name.clone(), dependency.url.clone())
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn target(&self) -> Option<String> {
        Some(self.url.clone())
    }

    async fn check(&self) -> bool {
        let url = format!("{}/health", self.url.trim_end_matches('/'));
        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(dependency = %self.name, status = %response.status(), "Dependency unhealthy");
                false
            }
            Err(e) => {
                debug!(dependency = %self.name, error = %e, "Dependency unreachable");
                false
            }
        }
    }
}
