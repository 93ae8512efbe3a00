// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Skill Registry - Intent Binding and Dispatch
//
// Maps intent names to skill handlers and executes them. Registration takes
// the write lock; dispatch clones the handler out under the read lock and
// releases it before the handler runs, so a slow back-end never blocks
// registration or other dispatches.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::envelope::{check_intent, Envelope, ValidationError};
use crate::domain::orchestrator_config::{OrchestratorConfigManifest, SkillKind};
use crate::domain::skill::{DispatchError, DispatchResult, SkillBindingInfo, SkillHandler};

use super::{AcknowledgeSkill, EchoSkill, RemoteSkill};

pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("intent '{0}' is already registered")]
    AlreadyRegistered(String),

    #[error(transparent)]
    InvalidIntent(#[from] ValidationError),
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRegistered(_) => "already_registered",
            Self::InvalidIntent(e) => e.code(),
        }
    }
}

#[derive(Default)]
struct Bindings {
    /// Registration order, for stable listing
    order: Vec<String>,
    handlers: HashMap<String, Arc<dyn SkillHandler>>,
}

pub struct SkillRegistry {
    bindings: RwLock<Bindings>,
    timeout: Duration,
}

impl SkillRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            bindings: RwLock::new(Bindings::default()),
            timeout,
        }
    }

    /// Build the registry from the configured skill bindings.
    ///
    /// A binding that cannot be built is logged and skipped; the rest still
    /// register.
    pub fn from_config(config: &OrchestratorConfigManifest) -> Self {
        let registry = Self::new(config.dispatch_timeout());
        let client = reqwest::Client::new();

        info!("Initializing skill registry");

        for binding in &config.spec.skills {
            let handler: Arc<dyn SkillHandler> = match binding.effective_kind() {
                SkillKind::Echo => Arc::new(EchoSkill),
                SkillKind::Acknowledge => Arc::new(AcknowledgeSkill),
                SkillKind::Remote => match config.skill_endpoint(binding) {
                    Some(endpoint) => Arc::new(RemoteSkill::with_client(client.clone(), endpoint)),
                    None => {
                        warn!(
                            intent = %binding.intent,
                            dependency = ?binding.dependency,
                            "Skill back-end not configured, skipping binding"
                        );
                        continue;
                    }
                },
            };

            if let Err(e) = registry.register(binding.intent.clone(), handler) {
                warn!("Failed to register skill '{}': {}", binding.intent, e);
            }
        }

        if registry.is_empty() {
            warn!("No skills registered - every event will report unknown_intent");
        }
        registry
    }

    /// Bind `handler` to `intent`. The first binding for an intent wins.
    pub fn register(
        &self,
        intent: impl Into<String>,
        handler: Arc<dyn SkillHandler>,
    ) -> Result<(), RegistryError> {
        let intent = intent.into();
        check_intent(&intent)?;

        let kind = handler.kind();
        {
            let mut bindings = self.bindings.write();
            if bindings.handlers.contains_key(&intent) {
                debug!(intent = %intent, "Skill already registered, keeping existing binding");
                return Err(RegistryError::AlreadyRegistered(intent));
            }
            bindings.order.push(intent.clone());
            bindings.handlers.insert(intent.clone(), handler);
        }

        metrics::counter!("unison_skill_registrations_total").increment(1);
        info!(intent = %intent, kind = %kind, "Skill registered");
        Ok(())
    }

    /// Registered intents in registration order.
    pub fn list(&self) -> Vec<String> {
        self.bindings.read().order.clone()
    }

    pub fn bindings(&self) -> Vec<SkillBindingInfo> {
        let bindings = self.bindings.read();
        bindings
            .order
            .iter()
            .filter_map(|intent| {
                bindings.handlers.get(intent).map(|h| SkillBindingInfo {
                    intent: intent.clone(),
                    kind: h.kind(),
                })
            })
            .collect()
    }

    pub fn contains(&self, intent: &str) -> bool {
        self.bindings.read().handlers.contains_key(intent)
    }

    pub fn lookup(&self, intent: &str) -> Option<Arc<dyn SkillHandler>> {
        self.bindings.read().handlers.get(intent).cloned()
    }

    pub fn len(&self) -> usize {
        self.bindings.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute the handler bound to `envelope.intent`.
    ///
    /// Never fails: unknown intents, handler errors, panics and timeouts are
    /// all folded into a rejected [`DispatchResult`].
    pub async fn dispatch(&self, envelope: &Envelope) -> DispatchResult {
        let intent = envelope.intent.as_str();
        let Some(handler) = self.lookup(intent) else {
            debug!(event_id = %envelope.event_id, intent = %intent, "No skill for intent");
            return DispatchResult::failed(None, DispatchError::UnknownIntent(intent.to_string()));
        };

        let started = Instant::now();
        let outcome = tokio::time::timeout(
            self.timeout,
            AssertUnwindSafe(handler.invoke(envelope)).catch_unwind(),
        )
        .await;
        metrics::histogram!("unison_dispatch_duration_seconds", "intent" => intent.to_string())
            .record(started.elapsed().as_secs_f64());

        let failure = match outcome {
            Ok(Ok(Ok(outputs))) => {
                debug!(event_id = %envelope.event_id, intent = %intent, "Skill completed");
                return DispatchResult::accepted(intent, outputs);
            }
            Ok(Ok(Err(e))) => e.to_string(),
            Ok(Err(_panic)) => "handler panicked".to_string(),
            Err(_elapsed) => "timeout".to_string(),
        };

        warn!(
            event_id = %envelope.event_id,
            intent = %intent,
            error = %failure,
            "Skill handler failed"
        );
        DispatchResult::failed(
            Some(intent.to_string()),
            DispatchError::HandlerFailure(failure),
        )
    }
}

impl Default for SkillRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_DISPATCH_TIMEOUT)
    }
}
