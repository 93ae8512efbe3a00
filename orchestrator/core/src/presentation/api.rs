// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP API
//!
//! | Method & Path | Handler |
//! |---------------|---------|
//! | GET `/health` | liveness |
//! | GET `/ready` | dependency readiness, 503 when not ready |
//! | GET `/introspect` | services, skills, policy rules |
//! | POST `/event` | submit an envelope |
//! | POST `/event/confirm` | redeem a confirmation token |
//! | GET, POST `/skills` | list / register skills |
//! | POST `/skills/invoke` | run a skill without policy |
//! | POST `/policy/reload` | re-read the rules file |
//! | GET `/events` | orchestration events as SSE |
//!
//! Body-level outcomes (`denied`, `unknown_intent`, handler failures) are
//! reported with 200 and `accepted: false`. Only malformed requests and
//! ticket errors use 4xx.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, KeepAliveStream},
        IntoResponse, Response, Sse,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::coordinator::{ConfirmOutcome, Coordinator, EventOutcome};
use crate::application::introspection::IntrospectionService;
use crate::domain::confirmation::RedemptionError;
use crate::domain::envelope::{EventId, ValidationError};
use crate::domain::policy::{PolicyEffect, PolicyLoadError};
use crate::domain::skill::DispatchResult;
use crate::infrastructure::skills::RegistryError;

pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub introspection: Arc<IntrospectionService>,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/introspect", get(introspect))
        .route("/event", post(submit_event))
        .route("/event/confirm", post(confirm_event))
        .route("/skills", get(list_skills).post(register_skill))
        .route("/skills/invoke", post(invoke_skill))
        .route("/policy/reload", post(reload_policy))
        .route("/events", get(stream_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Errors that end a request with a non-200 status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("request body does not match the expected shape: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Redemption(#[from] RedemptionError),

    #[error(transparent)]
    Registry(RegistryError),

    #[error(transparent)]
    Policy(#[from] PolicyLoadError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_)
            | Self::InvalidRequest(_)
            | Self::Validation(_)
            | Self::Registry(_) => StatusCode::BAD_REQUEST,
            Self::Redemption(RedemptionError::NotFound) => StatusCode::NOT_FOUND,
            Self::Redemption(RedemptionError::Expired) => StatusCode::GONE,
            Self::Redemption(RedemptionError::AlreadyRedeemed) => StatusCode::CONFLICT,
            Self::Policy(PolicyLoadError::NoSource) => StatusCode::CONFLICT,
            Self::Policy(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "invalid_json",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Validation(e) => e.code(),
            Self::Redemption(e) => e.code(),
            Self::Registry(e) => e.code(),
            Self::Policy(PolicyLoadError::NoSource) => "no_rules_source",
            Self::Policy(_) => "invalid_rules",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "status": self.code(),
            "accepted": false,
            "require_confirmation": false,
            "error": ErrorBody::new(self.code(), self.to_string()),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON with missing or mistyped fields
            JsonRejection::JsonDataError(e) => Self::InvalidRequest(e.body_text()),
            other => Self::InvalidJson(other.body_text()),
        }
    }
}

/// Response to `POST /event`.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub status: &'static str,
    pub accepted: bool,
    pub require_confirmation: bool,
    pub event_id: EventId,
    pub effect: PolicyEffect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handled_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl From<EventOutcome> for EventResponse {
    fn from(outcome: EventOutcome) -> Self {
        let status = outcome.status();
        match outcome {
            EventOutcome::Dispatched {
                event_id,
                decision,
                result,
            } => Self {
                status,
                accepted: result.accepted,
                require_confirmation: false,
                event_id,
                effect: decision.effect,
                matched_rule: decision.matched_rule,
                confirmation_token: None,
                expires_at: None,
                outputs: Some(result.outputs),
                handled_by: result.handled_by,
                reason: None,
                error: result
                    .error
                    .map(|e| ErrorBody::new(e.code(), e.to_string())),
            },
            EventOutcome::PendingConfirmation {
                event_id,
                decision,
                token,
                expires_at,
            } => Self {
                status,
                accepted: false,
                require_confirmation: true,
                event_id,
                effect: decision.effect,
                matched_rule: decision.matched_rule,
                confirmation_token: Some(token.as_str().to_string()),
                expires_at: Some(expires_at),
                outputs: None,
                handled_by: None,
                reason: decision.reason,
                error: None,
            },
            EventOutcome::Denied { event_id, decision } => Self {
                status,
                accepted: false,
                require_confirmation: false,
                event_id,
                effect: decision.effect,
                matched_rule: decision.matched_rule,
                confirmation_token: None,
                expires_at: None,
                outputs: None,
                handled_by: None,
                reason: Some(
                    decision
                        .reason
                        .unwrap_or_else(|| "denied by policy".to_string()),
                ),
                error: None,
            },
        }
    }
}

/// Response to direct invocation and confirmation.
#[derive(Debug, Serialize)]
pub struct DispatchResponse {
    pub status: &'static str,
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    pub outputs: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handled_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl DispatchResponse {
    fn from_result(result: DispatchResult, event_id: Option<EventId>) -> Self {
        Self {
            status: if result.accepted { "dispatched" } else { "failed" },
            accepted: result.accepted,
            event_id,
            outputs: result.outputs,
            handled_by: result.handled_by,
            error: result
                .error
                .map(|e| ErrorBody::new(e.code(), e.to_string())),
        }
    }
}

impl From<ConfirmOutcome> for DispatchResponse {
    fn from(outcome: ConfirmOutcome) -> Self {
        Self::from_result(outcome.result, Some(outcome.event_id))
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.introspection.readiness().await;
    let status = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(readiness))
}

async fn introspect(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.introspection.snapshot().await)
}

async fn submit_event(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<EventResponse>, ApiError> {
    let Json(raw) = payload?;
    let outcome = state.coordinator.handle_event(raw).await?;
    Ok(Json(outcome.into()))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub confirmation_token: String,
}

async fn confirm_event(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConfirmRequest>, JsonRejection>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let Json(request) = payload?;
    let outcome = state
        .coordinator
        .confirm(&request.confirmation_token)
        .await?;
    Ok(Json(outcome.into()))
}

async fn list_skills(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "skills": state.coordinator.registry().list() }))
}

#[derive(Debug, Deserialize)]
pub struct RegisterSkillRequest {
    pub intent: String,
    #[serde(default)]
    pub endpoint: Option<String>,
}

async fn register_skill(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterSkillRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    match state
        .coordinator
        .register_skill(&request.intent, request.endpoint)
    {
        Ok(kind) => Ok(Json(json!({
            "status": "registered",
            "registered": true,
            "intent": request.intent,
            "kind": kind,
        }))),
        Err(RegistryError::AlreadyRegistered(intent)) => Ok(Json(json!({
            "status": "already_registered",
            "registered": false,
            "intent": intent,
        }))),
        Err(e) => Err(ApiError::Registry(e)),
    }
}

#[derive(Debug, Deserialize)]
pub struct InvokeSkillRequest {
    pub intent: String,
    #[serde(default)]
    pub payload: Value,
}

async fn invoke_skill(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InvokeSkillRequest>, JsonRejection>,
) -> Result<Json<DispatchResponse>, ApiError> {
    let Json(request) = payload?;
    let result = state
        .coordinator
        .invoke_direct(&request.intent, request.payload)
        .await?;
    Ok(Json(DispatchResponse::from_result(result, None)))
}

async fn reload_policy(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let rules = state.coordinator.reload_policy()?;
    Ok(Json(json!({"status": "reloaded", "rules": rules})))
}

#[derive(Debug, Deserialize)]
pub struct EventStreamQuery {
    pub event_id: Option<Uuid>,
}

type EventStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

async fn stream_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventStreamQuery>,
) -> Sse<KeepAliveStream<EventStream>> {
    let watched = query.event_id.map(EventId);
    let receiver = state.coordinator.event_bus().raw_receiver();

    let stream: EventStream = Box::pin(BroadcastStream::new(receiver).filter_map(move |item| {
        // Lagged receivers skip what they missed
        let event = item.ok()?;
        if watched.is_some() && event.event_id() != watched {
            return None;
        }
        let data = serde_json::to_string(&event).unwrap_or_default();
        Some(Ok(Event::default().event(event.kind()).data(data)))
    }));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
