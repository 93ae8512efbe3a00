// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Confirmation Tickets
//!
//! A ticket parks an envelope whose policy decision was
//! `require_confirmation` until a human approves it.
//!
//! ## Ticket Lifecycle
//!
//! ```text
//! issue ──► Pending { expires_at } ──redeem──► Redeemed { redeemed_at }
//!                  │
//!                  └──now >= expires_at──► Expired { expired_at }
//! ```
//!
//! ## Invariants
//!
//! - `Redeemed` and `Expired` are terminal.
//! - [`ConfirmationTicket::refresh`] is the only place expiry is decided; every
//!   read and every redemption goes through it, so a stale `Pending` ticket is
//!   never redeemable.
//! - A ticket is valid on the half-open window `[issued_at, expires_at)`.
//! - The envelope is an owned copy taken at issuance.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::envelope::Envelope;

const TOKEN_BYTES: usize = 32;

/// Opaque bearer credential for one ticket.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationToken(String);

impl ConfirmationToken {
    /// 256 bits from the OS CSPRNG, URL-safe base64.
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in logs.
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(6).collect();
        format!("{}…", prefix)
    }
}

impl From<String> for ConfirmationToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ConfirmationToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// Tokens are secrets: Debug never prints the full value.
impl std::fmt::Debug for ConfirmationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ConfirmationToken").field(&self.redacted()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TicketState {
    Pending { expires_at: DateTime<Utc> },
    Redeemed { redeemed_at: DateTime<Utc> },
    Expired { expired_at: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RedemptionError {
    #[error("confirmation token not found")]
    NotFound,

    #[error("confirmation token has expired")]
    Expired,

    #[error("confirmation token was already redeemed")]
    AlreadyRedeemed,
}

impl RedemptionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "ticket_not_found",
            Self::Expired => "ticket_expired",
            Self::AlreadyRedeemed => "ticket_already_redeemed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmationTicket {
    pub token: ConfirmationToken,
    pub envelope: Envelope,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    state: TicketState,
}

impl ConfirmationTicket {
    pub fn new(
        token: ConfirmationToken,
        envelope: Envelope,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            token,
            envelope,
            issued_at,
            expires_at,
            state: TicketState::Pending { expires_at },
        }
    }

    /// Apply implicit expiry and return the current state.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> TicketState {
        if let TicketState::Pending { expires_at } = self.state {
            if now >= expires_at {
                self.state = TicketState::Expired {
                    expired_at: expires_at,
                };
            }
        }
        self.state
    }

    /// Transition `Pending -> Redeemed`, handing back the bound envelope.
    pub fn redeem(&mut self, now: DateTime<Utc>) -> Result<Envelope, RedemptionError> {
        match self.refresh(now) {
            TicketState::Pending { .. } => {
                self.state = TicketState::Redeemed { redeemed_at: now };
                Ok(self.envelope.clone())
            }
            TicketState::Redeemed { .. } => Err(RedemptionError::AlreadyRedeemed),
            TicketState::Expired { .. } => Err(RedemptionError::Expired),
        }
    }

    /// State as last observed, without applying expiry.
    pub fn state(&self) -> TicketState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, TicketState::Pending { .. })
    }

    /// When the ticket reached a terminal state.
    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            TicketState::Pending { .. } => None,
            TicketState::Redeemed { redeemed_at } => Some(redeemed_at),
            TicketState::Expired { expired_at } => Some(expired_at),
        }
    }
}

/// Result of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Pending tickets that crossed `expires_at` during this pass
    pub expired: usize,
    /// Terminal tickets dropped after their retention window
    pub reclaimed: usize,
    pub remaining: usize,
}

/// Storage for confirmation tickets.
///
/// Implementations must make [`TicketStore::redeem`] linearizable per token:
/// concurrent redemptions of one token yield exactly one `Ok`.
pub trait TicketStore: Send + Sync {
    /// Mint a fresh pending ticket. Never fails.
    fn issue(&self, envelope: Envelope, ttl: Duration) -> ConfirmationTicket;

    fn redeem(&self, token: &str) -> Result<Envelope, RedemptionError>;

    /// Mark timed-out tickets expired and reclaim settled ones.
    fn sweep(&self) -> SweepReport;

    fn pending_count(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::envelope::validate;
    use serde_json::json;

    fn ticket(issued_at: DateTime<Utc>, ttl_seconds: i64) -> ConfirmationTicket {
        let envelope = validate(json!({"intent": "summarize.doc"})).unwrap();
        ConfirmationTicket::new(
            ConfirmationToken::generate(),
            envelope,
            issued_at,
            Duration::seconds(ttl_seconds),
        )
    }

    #[test]
    fn test_tokens_are_unique_and_opaque() {
        let a = ConfirmationToken::generate();
        let b = ConfirmationToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 43);
        assert!(a
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert!(!format!("{:?}", a).contains(a.as_str()));
    }

    #[test]
    fn test_huge_ttl_saturates_instead_of_overflowing() {
        let now = Utc::now();
        let envelope = validate(json!({"intent": "summarize.doc"})).unwrap();
        let mut ticket =
            ConfirmationTicket::new(ConfirmationToken::generate(), envelope, now, Duration::MAX);

        assert_eq!(ticket.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(ticket.redeem(now + Duration::days(365)).is_ok());
    }

    #[test]
    fn test_redeem_once() {
        let now = Utc::now();
        let mut ticket = ticket(now, 60);

        let envelope = ticket.redeem(now + Duration::seconds(1)).unwrap();
        assert_eq!(envelope.intent, "summarize.doc");
        assert!(matches!(ticket.state(), TicketState::Redeemed { .. }));

        assert_eq!(
            ticket.redeem(now + Duration::seconds(2)),
            Err(RedemptionError::AlreadyRedeemed)
        );
    }

    #[test]
    fn test_pending_ticket_past_expiry_fails_redemption() {
        let now = Utc::now();
        let mut ticket = ticket(now, 30);
        assert!(ticket.is_pending());

        assert_eq!(
            ticket.redeem(now + Duration::seconds(31)),
            Err(RedemptionError::Expired)
        );
        assert_eq!(
            ticket.state(),
            TicketState::Expired {
                expired_at: now + Duration::seconds(30)
            }
        );
        assert_eq!(ticket.settled_at(), Some(now + Duration::seconds(30)));
    }

    #[test]
    fn test_window_is_half_open() {
        let now = Utc::now();
        let mut at_deadline = ticket(now, 30);
        assert_eq!(
            at_deadline.redeem(now + Duration::seconds(30)),
            Err(RedemptionError::Expired)
        );

        let mut zero_ttl = ticket(now, 0);
        assert_eq!(zero_ttl.redeem(now), Err(RedemptionError::Expired));
    }

    #[test]
    fn test_redeemed_ticket_never_expires() {
        let now = Utc::now();
        let mut ticket = ticket(now, 10);
        ticket.redeem(now).unwrap();

        let state = ticket.refresh(now + Duration::hours(1));
        assert!(matches!(state, TicketState::Redeemed { .. }));
        assert_eq!(
            ticket.redeem(now + Duration::hours(1)),
            Err(RedemptionError::AlreadyRedeemed)
        );
    }
}
