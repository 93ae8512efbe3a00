// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory confirmation ticket store
//!
//! The map lock only guards membership. Each ticket sits behind its own
//! mutex, so redemptions of different tokens never contend and the
//! expiry check, the redemption and the sweeper all funnel through the same
//! per-token critical section.
//!
//! Settled tickets are kept as tombstones for a retention window so a late
//! caller learns "expired" or "already redeemed" rather than "not found".

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::confirmation::{
    ConfirmationTicket, ConfirmationToken, RedemptionError, SweepReport, TicketState, TicketStore,
};
use crate::domain::envelope::{Envelope, EventId};

type Slot = Arc<Mutex<ConfirmationTicket>>;

pub struct InMemoryTicketStore {
    tickets: RwLock<HashMap<String, Slot>>,
    retention: chrono::Duration,
}

/// Pending ticket as shown to operators. Never carries the full token.
#[derive(Debug, Clone, Serialize)]
pub struct PendingTicketInfo {
    pub token_prefix: String,
    pub event_id: EventId,
    pub intent: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl InMemoryTicketStore {
    pub fn new(retention: chrono::Duration) -> Self {
        Self {
            tickets: RwLock::new(HashMap::new()),
            retention,
        }
    }

    pub fn issue_at(
        &self,
        envelope: Envelope,
        ttl: chrono::Duration,
        now: DateTime<Utc>,
    ) -> ConfirmationTicket {
        let mut tickets = self.tickets.write();
        let mut token = ConfirmationToken::generate();
        while tickets.contains_key(token.as_str()) {
            // 256-bit collision: practically unreachable, but the map must stay injective
            warn!("Confirmation token collision, regenerating");
            token = ConfirmationToken::generate();
        }

        let ticket = ConfirmationTicket::new(token.clone(), envelope, now, ttl);
        tickets.insert(
            token.as_str().to_string(),
            Arc::new(Mutex::new(ticket.clone())),
        );

        info!(
            token = %token.redacted(),
            event_id = %ticket.envelope.event_id,
            intent = %ticket.envelope.intent,
            expires_at = %ticket.expires_at,
            "Confirmation ticket issued"
        );
        ticket
    }

    pub fn redeem_at(&self, token: &str, now: DateTime<Utc>) -> Result<Envelope, RedemptionError> {
        // Release the map lock before touching the ticket
        let slot = self
            .tickets
            .read()
            .get(token)
            .cloned()
            .ok_or(RedemptionError::NotFound)?;

        let result = slot.lock().redeem(now);
        match &result {
            Ok(envelope) => info!(
                token = %ConfirmationToken::from(token).redacted(),
                event_id = %envelope.event_id,
                "Confirmation ticket redeemed"
            ),
            Err(e) => debug!(
                token = %ConfirmationToken::from(token).redacted(),
                error = %e,
                "Confirmation ticket redemption refused"
            ),
        }
        result
    }

    pub fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        let retention = self.retention;

        let mut tickets = self.tickets.write();
        tickets.retain(|_, slot| {
            let mut ticket = slot.lock();
            let was_pending = ticket.is_pending();
            let state = ticket.refresh(now);

            if was_pending && matches!(state, TicketState::Expired { .. }) {
                report.expired += 1;
            }

            let keep = match ticket.settled_at() {
                None => true,
                Some(settled_at) => settled_at
                    .checked_add_signed(retention)
                    .map_or(true, |until| now < until),
            };
            if !keep {
                report.reclaimed += 1;
            }
            keep
        });
        report.remaining = tickets.len();

        if report.expired > 0 || report.reclaimed > 0 {
            debug!(
                expired = report.expired,
                reclaimed = report.reclaimed,
                remaining = report.remaining,
                "Ticket sweep completed"
            );
        }
        report
    }

    pub fn pending_count_at(&self, now: DateTime<Utc>) -> usize {
        self.tickets
            .read()
            .values()
            .filter(|slot| matches!(slot.lock().refresh(now), TicketState::Pending { .. }))
            .count()
    }

    /// Pending tickets ordered by expiry, soonest first.
    pub fn list_pending(&self) -> Vec<PendingTicketInfo> {
        let now = Utc::now();
        let mut pending: Vec<PendingTicketInfo> = self
            .tickets
            .read()
            .values()
            .filter_map(|slot| {
                let mut ticket = slot.lock();
                match ticket.refresh(now) {
                    TicketState::Pending { .. } => Some(PendingTicketInfo {
                        token_prefix: ticket.token.redacted(),
                        event_id: ticket.envelope.event_id,
                        intent: ticket.envelope.intent.clone(),
                        issued_at: ticket.issued_at,
                        expires_at: ticket.expires_at,
                    }),
                    _ => None,
                }
            })
            .collect();
        pending.sort_by_key(|info| info.expires_at);
        pending
    }

    pub fn len(&self) -> usize {
        self.tickets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.read().is_empty()
    }
}

impl Default for InMemoryTicketStore {
    fn default() -> Self {
        Self::new(chrono::Duration::minutes(10))
    }
}

impl TicketStore for InMemoryTicketStore {
    fn issue(&self, envelope: Envelope, ttl: chrono::Duration) -> ConfirmationTicket {
        self.issue_at(envelope, ttl, Utc::now())
    }

    fn redeem(&self, token: &str) -> Result<Envelope, RedemptionError> {
        self.redeem_at(token, Utc::now())
    }

    fn sweep(&self) -> SweepReport {
        self.sweep_at(Utc::now())
    }

    fn pending_count(&self) -> usize {
        self.pending_count_at(Utc::now())
    }
}

/// Run [`TicketStore::sweep`] every `period` until the task is aborted.
pub fn spawn_sweeper(store: Arc<dyn TicketStore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let report = store.sweep();
            metrics::counter!("unison_tickets_swept_total", "result" => "expired")
                .increment(report.expired as u64);
            metrics::counter!("unison_tickets_swept_total", "result" => "reclaimed")
                .increment(report.reclaimed as u64);
        }
    })
}
