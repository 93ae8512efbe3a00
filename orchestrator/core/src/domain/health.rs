// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use serde::Serialize;

/// Liveness check for one collaborator (Context, Actuation, Policy, IO adapters).
#[async_trait]
pub trait HealthProbe: Send + Sync {
    fn name(&self) -> &str;

    /// Where the probe points, if anywhere
    fn target(&self) -> Option<String> {
        None
    }

    async fn check(&self) -> bool;
}

/// One collaborator as reported by `/introspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub healthy: bool,
}
