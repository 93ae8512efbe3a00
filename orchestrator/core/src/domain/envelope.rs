// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Event Envelope
//!
//! Canonical shape of one inbound event produced by an input adapter
//! (speech, vision, io-core emitters) and the validator that turns raw JSON
//! into it.
//!
//! ## Normalisation rules
//!
//! | Field | Missing | Present but malformed |
//! |-------|---------|-----------------------|
//! | `intent` | rejected | rejected (empty, whitespace, empty segment) |
//! | `timestamp` | stamped with receipt time | rejected |
//! | `source` | `"unknown"` | rejected (non-string) |
//! | `payload` | `{}` | any JSON value accepted |
//! | `auth_scope` | unscoped | rejected (non-string) |
//! | `safety_context` | none | rejected (non-object, unknown classification) |
//!
//! Unknown top-level keys and unknown keys inside `safety_context` are kept
//! verbatim in `extra` so newer adapters can talk to an older orchestrator.
//!
//! An [`Envelope`] is never mutated after [`validate`] returns it; tickets and
//! decisions hold their own copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Correlation identifier assigned to every accepted envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sensitivity of the data an event touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataClassification {
    Public,
    Internal,
    Confidential,
    Restricted,
}

impl DataClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Internal => "internal",
            Self::Confidential => "confidential",
            Self::Restricted => "restricted",
        }
    }
}

impl std::fmt::Display for DataClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hints consumed only by the policy evaluator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_classification: Option<DataClassification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allows_cloud: Option<bool>,

    /// Adapter-specific hints the orchestrator does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One validated inbound event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub event_id: EventId,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub intent: String,
    pub payload: Value,

    /// Consent scope; `None` means unscoped/system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_scope: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_context: Option<SafetyContext>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    pub fn data_classification(&self) -> Option<DataClassification> {
        self.safety_context.as_ref().and_then(|c| c.data_classification)
    }

    pub fn allows_cloud(&self) -> Option<bool> {
        self.safety_context.as_ref().and_then(|c| c.allows_cloud)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("envelope must be a JSON object")]
    NotAnObject,

    #[error("missing required field `intent`")]
    MissingIntent,

    #[error("invalid intent '{intent}': {reason}")]
    InvalidIntent { intent: String, reason: String },

    #[error("invalid timestamp '{0}': expected an RFC 3339 instant")]
    InvalidTimestamp(String),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAnObject => "not_an_object",
            Self::MissingIntent => "missing_intent",
            Self::InvalidIntent { .. } => "invalid_intent",
            Self::InvalidTimestamp(_) => "invalid_timestamp",
            Self::InvalidField { .. } => "invalid_field",
        }
    }
}

/// Validate a raw event, stamping a missing timestamp with the current time.
pub fn validate(raw: Value) -> Result<Envelope, ValidationError> {
    validate_at(raw, Utc::now())
}

/// Validate a raw event against an explicit receipt time.
pub fn validate_at(raw: Value, received_at: DateTime<Utc>) -> Result<Envelope, ValidationError> {
    let Value::Object(mut fields) = raw else {
        return Err(ValidationError::NotAnObject);
    };

    let intent = match fields.remove("intent") {
        None | Some(Value::Null) => return Err(ValidationError::MissingIntent),
        Some(Value::String(intent)) => intent,
        Some(other) => {
            return Err(ValidationError::InvalidField {
                field: "intent",
                reason: format!("expected string, got {}", json_type(&other)),
            })
        }
    };
    check_intent(&intent)?;

    let timestamp = match fields.remove("timestamp") {
        None | Some(Value::Null) => received_at,
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|_| ValidationError::InvalidTimestamp(raw))?,
        Some(other) => return Err(ValidationError::InvalidTimestamp(other.to_string())),
    };

    let source = optional_string(&mut fields, "source")?.unwrap_or_else(|| "unknown".to_string());
    let auth_scope = optional_string(&mut fields, "auth_scope")?.filter(|s| !s.is_empty());

    let payload = match fields.remove("payload") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(payload) => payload,
    };

    let safety_context = match fields.remove("safety_context") {
        None | Some(Value::Null) => None,
        Some(value @ Value::Object(_)) => Some(serde_json::from_value::<SafetyContext>(value).map_err(
            |e| ValidationError::InvalidField {
                field: "safety_context",
                reason: e.to_string(),
            },
        )?),
        Some(other) => {
            return Err(ValidationError::InvalidField {
                field: "safety_context",
                reason: format!("expected object, got {}", json_type(&other)),
            })
        }
    };

    // Clients cannot choose their own correlation id.
    fields.remove("event_id");

    Ok(Envelope {
        event_id: EventId::new(),
        timestamp,
        source,
        intent,
        payload,
        auth_scope,
        safety_context,
        extra: fields,
    })
}

/// Check that an intent is a usable dot-qualified name.
pub fn check_intent(intent: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidIntent {
        intent: intent.to_string(),
        reason: reason.to_string(),
    };

    if intent.trim().is_empty() {
        return Err(ValidationError::MissingIntent);
    }
    if intent.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }
    if intent.split('.').any(str::is_empty) {
        return Err(invalid("segments between dots must not be empty"));
    }
    Ok(())
}

fn optional_string(
    fields: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match fields.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(ValidationError::InvalidField {
            field,
            reason: format!("expected string, got {}", json_type(&other)),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn received() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-10-25T19:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_full_envelope_is_accepted() {
        let envelope = validate_at(
            json!({
                "timestamp": "2025-10-25T19:22:04Z",
                "source": "io-speech",
                "intent": "summarize.document",
                "payload": {"document_ref": "active_window"},
                "auth_scope": "person.local.explicit",
                "safety_context": {"data_classification": "confidential", "allows_cloud": false}
            }),
            received(),
        )
        .unwrap();

        assert_eq!(envelope.intent, "summarize.document");
        assert_eq!(envelope.source, "io-speech");
        assert_eq!(envelope.timestamp.to_rfc3339(), "2025-10-25T19:22:04+00:00");
        assert_eq!(envelope.auth_scope.as_deref(), Some("person.local.explicit"));
        assert_eq!(envelope.data_classification(), Some(DataClassification::Confidential));
        assert_eq!(envelope.allows_cloud(), Some(false));
        assert_eq!(envelope.payload["document_ref"], "active_window");
    }

    #[test]
    fn test_missing_optional_fields_are_normalised() {
        let envelope = validate_at(json!({"intent": "echo"}), received()).unwrap();

        assert_eq!(envelope.timestamp, received());
        assert_eq!(envelope.source, "unknown");
        assert_eq!(envelope.payload, json!({}));
        assert!(envelope.auth_scope.is_none());
        assert!(envelope.safety_context.is_none());
    }

    #[test]
    fn test_missing_or_empty_intent_is_rejected() {
        assert_eq!(
            validate_at(json!({"payload": {}}), received()),
            Err(ValidationError::MissingIntent)
        );
        assert_eq!(
            validate_at(json!({"intent": "  "}), received()),
            Err(ValidationError::MissingIntent)
        );
        assert!(matches!(
            validate_at(json!({"intent": "summarize..doc"}), received()),
            Err(ValidationError::InvalidIntent { .. })
        ));
        assert!(matches!(
            validate_at(json!({"intent": 42}), received()),
            Err(ValidationError::InvalidField { field: "intent", .. })
        ));
    }

    #[test]
    fn test_unparsable_timestamp_is_rejected() {
        let err = validate_at(json!({"intent": "echo", "timestamp": "yesterday"}), received())
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidTimestamp("yesterday".to_string()));

        // A local time without an offset is not an absolute instant
        assert!(validate_at(
            json!({"intent": "echo", "timestamp": "2025-10-25T19:22:04"}),
            received()
        )
        .is_err());
    }

    #[test]
    fn test_unknown_fields_are_preserved() {
        let envelope = validate_at(
            json!({
                "intent": "echo",
                "trace_id": "abc-123",
                "safety_context": {"device_zone": "kitchen"}
            }),
            received(),
        )
        .unwrap();

        assert_eq!(envelope.extra.get("trace_id"), Some(&json!("abc-123")));
        let context = envelope.safety_context.as_ref().unwrap();
        assert_eq!(context.extra.get("device_zone"), Some(&json!("kitchen")));
        assert!(context.data_classification.is_none());

        let serialized = serde_json::to_value(&envelope).unwrap();
        assert_eq!(serialized["trace_id"], "abc-123");
    }

    #[test]
    fn test_unknown_classification_is_rejected() {
        let err = validate_at(
            json!({"intent": "echo", "safety_context": {"data_classification": "top-secret"}}),
            received(),
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { field: "safety_context", .. }));
    }

    #[test]
    fn test_client_supplied_event_id_is_ignored() {
        let envelope = validate_at(
            json!({"intent": "echo", "event_id": "00000000-0000-0000-0000-000000000000"}),
            received(),
        )
        .unwrap();
        assert_ne!(envelope.event_id.0, Uuid::nil());
        assert!(!envelope.extra.contains_key("event_id"));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert_eq!(validate_at(json!(["echo"]), received()), Err(ValidationError::NotAnObject));
    }
}
