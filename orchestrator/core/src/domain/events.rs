// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::envelope::EventId;
use crate::domain::policy::PolicyEffect;

/// State transitions of the event pipeline, published on the event bus.
///
/// Confirmation tokens are never carried here; subscribers see the event id
/// and the expiry only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrchestrationEvent {
    EventReceived {
        event_id: EventId,
        intent: String,
        source: String,
        received_at: DateTime<Utc>,
    },
    EventRejected {
        code: String,
        reason: String,
        rejected_at: DateTime<Utc>,
    },
    PolicyDecided {
        event_id: EventId,
        effect: PolicyEffect,
        matched_rule: Option<String>,
        decided_at: DateTime<Utc>,
    },
    EventDispatched {
        event_id: EventId,
        intent: String,
        accepted: bool,
        handled_by: Option<String>,
        error: Option<String>,
        duration_ms: u64,
        dispatched_at: DateTime<Utc>,
    },
    ConfirmationRequested {
        event_id: EventId,
        intent: String,
        expires_at: DateTime<Utc>,
        requested_at: DateTime<Utc>,
    },
    EventDenied {
        event_id: EventId,
        intent: String,
        reason: String,
        denied_at: DateTime<Utc>,
    },
    ConfirmationRedeemed {
        event_id: EventId,
        intent: String,
        redeemed_at: DateTime<Utc>,
    },
    ConfirmationFailed {
        code: String,
        failed_at: DateTime<Utc>,
    },
    SkillRegistered {
        intent: String,
        kind: String,
        registered_at: DateTime<Utc>,
    },
    PolicyReloaded {
        rule_count: usize,
        reloaded_at: DateTime<Utc>,
    },
}

impl OrchestrationEvent {
    /// Event name used for SSE framing.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EventReceived { .. } => "event_received",
            Self::EventRejected { .. } => "event_rejected",
            Self::PolicyDecided { .. } => "policy_decided",
            Self::EventDispatched { .. } => "event_dispatched",
            Self::ConfirmationRequested { .. } => "confirmation_requested",
            Self::EventDenied { .. } => "event_denied",
            Self::ConfirmationRedeemed { .. } => "confirmation_redeemed",
            Self::ConfirmationFailed { .. } => "confirmation_failed",
            Self::SkillRegistered { .. } => "skill_registered",
            Self::PolicyReloaded { .. } => "policy_reloaded",
        }
    }

    pub fn event_id(&self) -> Option<EventId> {
        match self {
            Self::EventReceived { event_id, .. }
            | Self::PolicyDecided { event_id, .. }
            | Self::EventDispatched { event_id, .. }
            | Self::ConfirmationRequested { event_id, .. }
            | Self::EventDenied { event_id, .. }
            | Self::ConfirmationRedeemed { event_id, .. } => Some(*event_id),
            Self::EventRejected { .. }
            | Self::ConfirmationFailed { .. }
            | Self::SkillRegistered { .. }
            | Self::PolicyReloaded { .. } => None,
        }
    }
}
