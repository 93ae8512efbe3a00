// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Skill Domain Interface
//!
//! A skill is whatever executes an intent: a built-in handler, or a remote
//! back-end such as the Context, Storage or Actuation services. The
//! orchestrator only sees the [`SkillHandler`] trait; registering a skill
//! means binding an implementation to an intent name.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::envelope::Envelope;

/// Failure reported by a handler. Always wrapped into
/// [`DispatchError::HandlerFailure`] before reaching a caller.
#[derive(Debug, Error)]
pub enum SkillError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("backend response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait SkillHandler: Send + Sync {
    /// Execute the envelope and return the outputs merged into the response.
    async fn invoke(&self, envelope: &Envelope) -> Result<Value, SkillError>;

    /// Short description for introspection (e.g. `builtin:echo`).
    fn kind(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("no skill registered for intent '{0}'")]
    UnknownIntent(String),

    #[error("skill handler failed: {0}")]
    HandlerFailure(String),
}

impl DispatchError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownIntent(_) => "unknown_intent",
            Self::HandlerFailure(_) => "handler_failure",
        }
    }
}

/// Normalised outcome of executing one skill.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    pub accepted: bool,
    pub outputs: Value,
    pub handled_by: Option<String>,
    /// Present only when `accepted` is false
    pub error: Option<DispatchError>,
}

impl DispatchResult {
    pub fn accepted(handled_by: impl Into<String>, outputs: Value) -> Self {
        Self {
            accepted: true,
            outputs,
            handled_by: Some(handled_by.into()),
            error: None,
        }
    }

    pub fn failed(handled_by: Option<String>, error: DispatchError) -> Self {
        Self {
            accepted: false,
            outputs: Value::Object(Default::default()),
            handled_by,
            error: Some(error),
        }
    }
}

/// Intent binding as listed by introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillBindingInfo {
    pub intent: String,
    pub kind: String,
}
