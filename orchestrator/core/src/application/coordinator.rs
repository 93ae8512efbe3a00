// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Orchestration Coordinator
//!
//! Drives one event through the pipeline:
//!
//! ```text
//! received ──validate──► validated ──evaluate──► policy_decided
//!                                                  ├─ allow ──────────────► dispatched
//!                                                  ├─ require_confirmation ► pending_confirmation
//!                                                  └─ deny ───────────────► denied
//!
//! pending_confirmation ──confirm(token)──► redeemed ──► dispatched
//! ```
//!
//! Every branch publishes an [`OrchestrationEvent`] and ends in an explicit
//! outcome; nothing is dropped silently.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::domain::confirmation::{ConfirmationToken, RedemptionError, TicketStore};
use crate::domain::envelope::{validate, Envelope, EventId, ValidationError};
use crate::domain::events::OrchestrationEvent;
use crate::domain::policy::{Decision, PolicyEffect, PolicyLoadError};
use crate::domain::skill::{DispatchResult, SkillHandler};
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::policy_store::PolicyStore;
use crate::infrastructure::skills::{AcknowledgeSkill, RegistryError, RemoteSkill, SkillRegistry};

pub const DEFAULT_TICKET_TTL_SECONDS: i64 = 300;

/// How a single `/event` submission ended.
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Dispatched {
        event_id: EventId,
        decision: Decision,
        result: DispatchResult,
    },
    PendingConfirmation {
        event_id: EventId,
        decision: Decision,
        token: ConfirmationToken,
        expires_at: DateTime<Utc>,
    },
    Denied {
        event_id: EventId,
        decision: Decision,
    },
}

impl EventOutcome {
    /// `dispatched`, `failed`, `denied` or `pending_confirmation`.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Dispatched { result, .. } if result.accepted => "dispatched",
            Self::Dispatched { .. } => "failed",
            Self::PendingConfirmation { .. } => "pending_confirmation",
            Self::Denied { .. } => "denied",
        }
    }

    pub fn event_id(&self) -> EventId {
        match self {
            Self::Dispatched { event_id, .. }
            | Self::PendingConfirmation { event_id, .. }
            | Self::Denied { event_id, .. } => *event_id,
        }
    }

    pub fn decision(&self) -> &Decision {
        match self {
            Self::Dispatched { decision, .. }
            | Self::PendingConfirmation { decision, .. }
            | Self::Denied { decision, .. } => decision,
        }
    }
}

/// Result of redeeming a confirmation token.
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    pub event_id: EventId,
    pub intent: String,
    pub result: DispatchResult,
}

impl ConfirmOutcome {
    pub fn status(&self) -> &'static str {
        if self.result.accepted {
            "dispatched"
        } else {
            "failed"
        }
    }
}

pub struct Coordinator {
    policy: Arc<PolicyStore>,
    tickets: Arc<dyn TicketStore>,
    registry: Arc<SkillRegistry>,
    event_bus: EventBus,
    ticket_ttl: chrono::Duration,
    http: reqwest::Client,
}

impl Coordinator {
    pub fn new(
        policy: Arc<PolicyStore>,
        tickets: Arc<dyn TicketStore>,
        registry: Arc<SkillRegistry>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            policy,
            tickets,
            registry,
            event_bus,
            ticket_ttl: chrono::Duration::seconds(DEFAULT_TICKET_TTL_SECONDS),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_ticket_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.ticket_ttl = ttl;
        self
    }

    pub fn policy(&self) -> &Arc<PolicyStore> {
        &self.policy
    }

    pub fn tickets(&self) -> &Arc<dyn TicketStore> {
        &self.tickets
    }

    pub fn registry(&self) -> &Arc<SkillRegistry> {
        &self.registry
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn ticket_ttl(&self) -> chrono::Duration {
        self.ticket_ttl
    }

    /// Validate, evaluate and then dispatch, park or deny one raw event.
    pub async fn handle_event(&self, raw: Value) -> Result<EventOutcome, ValidationError> {
        let envelope = match validate(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(code = e.code(), error = %e, "Rejected malformed event");
                self.event_bus.publish(OrchestrationEvent::EventRejected {
                    code: e.code().to_string(),
                    reason: e.to_string(),
                    rejected_at: Utc::now(),
                });
                metrics::counter!("unison_events_total", "outcome" => "rejected").increment(1);
                return Err(e);
            }
        };

        let event_id = envelope.event_id;
        info!(
            event_id = %event_id,
            intent = %envelope.intent,
            source = %envelope.source,
            "Event received"
        );
        self.event_bus.publish(OrchestrationEvent::EventReceived {
            event_id,
            intent: envelope.intent.clone(),
            source: envelope.source.clone(),
            received_at: Utc::now(),
        });

        let decision = self.policy.evaluate(&envelope);
        info!(
            event_id = %event_id,
            effect = %decision.effect,
            matched_rule = ?decision.matched_rule,
            "Policy decided"
        );
        self.event_bus.publish(OrchestrationEvent::PolicyDecided {
            event_id,
            effect: decision.effect,
            matched_rule: decision.matched_rule.clone(),
            decided_at: Utc::now(),
        });

        let outcome = match decision.effect {
            PolicyEffect::Allow => {
                let result = self.dispatch(&envelope).await;
                EventOutcome::Dispatched {
                    event_id,
                    decision,
                    result,
                }
            }
            PolicyEffect::RequireConfirmation => {
                let ticket = self.tickets.issue(envelope, self.ticket_ttl);
                self.event_bus.publish(OrchestrationEvent::ConfirmationRequested {
                    event_id,
                    intent: ticket.envelope.intent.clone(),
                    expires_at: ticket.expires_at,
                    requested_at: ticket.issued_at,
                });
                EventOutcome::PendingConfirmation {
                    event_id,
                    decision,
                    token: ticket.token,
                    expires_at: ticket.expires_at,
                }
            }
            PolicyEffect::Deny => {
                let reason = decision
                    .reason
                    .clone()
                    .unwrap_or_else(|| "denied by policy".to_string());
                info!(event_id = %event_id, reason = %reason, "Event denied");
                self.event_bus.publish(OrchestrationEvent::EventDenied {
                    event_id,
                    intent: envelope.intent.clone(),
                    reason,
                    denied_at: Utc::now(),
                });
                EventOutcome::Denied { event_id, decision }
            }
        };

        metrics::counter!("unison_events_total", "outcome" => outcome.status()).increment(1);
        Ok(outcome)
    }

    /// Redeem a ticket and dispatch the envelope it was bound to.
    pub async fn confirm(&self, token: &str) -> Result<ConfirmOutcome, RedemptionError> {
        let envelope = match self.tickets.redeem(token) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    token = %ConfirmationToken::from(token).redacted(),
                    code = e.code(),
                    "Confirmation refused"
                );
                self.event_bus.publish(OrchestrationEvent::ConfirmationFailed {
                    code: e.code().to_string(),
                    failed_at: Utc::now(),
                });
                metrics::counter!("unison_confirmations_total", "outcome" => e.code())
                    .increment(1);
                return Err(e);
            }
        };

        self.event_bus.publish(OrchestrationEvent::ConfirmationRedeemed {
            event_id: envelope.event_id,
            intent: envelope.intent.clone(),
            redeemed_at: Utc::now(),
        });

        let result = self.dispatch(&envelope).await;
        let outcome = ConfirmOutcome {
            event_id: envelope.event_id,
            intent: envelope.intent,
            result,
        };
        metrics::counter!("unison_confirmations_total", "outcome" => outcome.status())
            .increment(1);
        Ok(outcome)
    }

    /// Run a skill directly, skipping policy. For trusted callers only.
    pub async fn invoke_direct(
        &self,
        intent: &str,
        payload: Value,
    ) -> Result<DispatchResult, ValidationError> {
        let envelope = validate(json!({
            "intent": intent,
            "payload": payload,
            "source": "direct",
        }))?;
        info!(event_id = %envelope.event_id, intent = %intent, "Direct skill invocation");
        Ok(self.dispatch(&envelope).await)
    }

    /// Bind `intent` to a remote back-end when `endpoint` is given, or to the
    /// acknowledge skill otherwise.
    pub fn register_skill(
        &self,
        intent: &str,
        endpoint: Option<String>,
    ) -> Result<String, RegistryError> {
        let handler: Arc<dyn SkillHandler> = match endpoint {
            Some(endpoint) => Arc::new(RemoteSkill::with_client(self.http.clone(), endpoint)),
            None => Arc::new(AcknowledgeSkill),
        };
        let kind = handler.kind();
        self.registry.register(intent, handler)?;
        self.event_bus.publish(OrchestrationEvent::SkillRegistered {
            intent: intent.to_string(),
            kind: kind.clone(),
            registered_at: Utc::now(),
        });
        Ok(kind)
    }

    pub fn reload_policy(&self) -> Result<usize, PolicyLoadError> {
        let count = self.policy.reload()?;
        self.event_bus.publish(OrchestrationEvent::PolicyReloaded {
            rule_count: count,
            reloaded_at: Utc::now(),
        });
        Ok(count)
    }

    async fn dispatch(&self, envelope: &Envelope) -> DispatchResult {
        let started = Instant::now();
        let result = self.registry.dispatch(envelope).await;

        self.event_bus.publish(OrchestrationEvent::EventDispatched {
            event_id: envelope.event_id,
            intent: envelope.intent.clone(),
            accepted: result.accepted,
            handled_by: result.handled_by.clone(),
            error: result.error.as_ref().map(|e| e.to_string()),
            duration_ms: started.elapsed().as_millis() as u64,
            dispatched_at: Utc::now(),
        });
        result
    }
}
