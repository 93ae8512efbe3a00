// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Remote Skill Adapter
//
// Anti-Corruption Layer for HTTP skill back-ends (Context, Storage,
// Actuation). The envelope payload is POSTed as JSON and the JSON response
// body becomes the dispatch outputs.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::envelope::Envelope;
use crate::domain::skill::{SkillError, SkillHandler};

pub const EVENT_ID_HEADER: &str = "x-unison-event-id";
pub const SOURCE_HEADER: &str = "x-unison-source";
pub const INTENT_HEADER: &str = "x-unison-intent";

pub struct RemoteSkill {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteSkill {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SkillHandler for RemoteSkill {
    async fn invoke(&self, envelope: &Envelope) -> Result<Value, SkillError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(EVENT_ID_HEADER, envelope.event_id.to_string())
            .header(SOURCE_HEADER, envelope.source.as_str())
            .header(INTENT_HEADER, envelope.intent.as_str())
            .json(&envelope.payload)
            .send()
            .await
            .map_err(|e| SkillError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SkillError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SkillError::Transport(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&body).map_err(|e| SkillError::Decode(e.to_string()))
    }

    fn kind(&self) -> String {
        format!("remote:{}", self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::envelope::validate;
    use serde_json::json;

    #[tokio::test]
    async fn test_forwards_payload_and_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/kv/get")
            .match_header("x-unison-source", "io-speech")
            .match_header("x-unison-intent", "context.get")
            .match_body(mockito::Matcher::Json(json!({"keys": ["local-user:name"]})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok": true, "values": {"local-user:name": "Ada"}}"#)
            .create_async()
            .await;

        let envelope = validate(json!({
            "intent": "context.get",
            "source": "io-speech",
            "payload": {"keys": ["local-user:name"]}
        }))
        .unwrap();

        let skill = RemoteSkill::new(format!("{}/kv/get", server.url()));
        let outputs = skill.invoke(&envelope).await.unwrap();

        mock.assert_async().await;
        assert_eq!(outputs["values"]["local-user:name"], "Ada");
        assert!(skill.kind().starts_with("remote:"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_backend_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/actuate")
            .with_status(503)
            .with_body("actuation offline")
            .create_async()
            .await;

        let envelope = validate(json!({"intent": "proposed_action"})).unwrap();
        let skill = RemoteSkill::new(format!("{}/actuate", server.url()));

        match skill.invoke(&envelope).await {
            Err(SkillError::Backend { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "actuation offline");
            }
            other => panic!("expected backend error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let envelope = validate(json!({"intent": "storage.put"})).unwrap();
        let skill = RemoteSkill::new("http://127.0.0.1:1/kv/put");
        assert!(matches!(
            skill.invoke(&envelope).await,
            Err(SkillError::Transport(_))
        ));
    }
}
