// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for a running orchestrator

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadinessReport {
    pub ready: bool,
    #[serde(default)]
    pub deps: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationReport {
    pub registered: bool,
    pub status: String,
    #[serde(default)]
    pub kind: Option<String>,
}

impl OrchestratorClient {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        Self::with_base_url(super::base_url(host, port))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /ready`; a 503 still carries the per-dependency report.
    pub async fn readiness(&self) -> Result<ReadinessReport> {
        let response = self
            .client
            .get(format!("{}/ready", self.base_url))
            .send()
            .await
            .context("Failed to query readiness")?;

        response
            .json()
            .await
            .context("Failed to parse readiness response")
    }

    pub async fn introspect(&self) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}/introspect", self.base_url))
            .send()
            .await
            .context("Failed to query introspection")?;

        read_json(response, "introspect").await
    }

    pub async fn list_skills(&self) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct SkillsResponse {
            skills: Vec<String>,
        }

        let response = self
            .client
            .get(format!("{}/skills", self.base_url))
            .send()
            .await
            .context("Failed to list skills")?;

        let body = read_json(response, "list skills").await?;
        let parsed: SkillsResponse =
            serde_json::from_value(body).context("Failed to parse skills response")?;
        Ok(parsed.skills)
    }

    pub async fn register_skill(
        &self,
        intent: &str,
        endpoint: Option<&str>,
    ) -> Result<RegistrationReport> {
        #[derive(Serialize)]
        struct RegisterRequest<'a> {
            intent: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            endpoint: Option<&'a str>,
        }

        let response = self
            .client
            .post(format!("{}/skills", self.base_url))
            .json(&RegisterRequest { intent, endpoint })
            .send()
            .await
            .with_context(|| format!("Failed to register skill {}", intent))?;

        let body = read_json(response, "register skill").await?;
        serde_json::from_value(body).context("Failed to parse registration response")
    }

    /// `POST /skills/invoke`, bypassing policy evaluation.
    pub async fn invoke_skill(&self, intent: &str, payload: &Value) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}/skills/invoke", self.base_url))
            .json(&serde_json::json!({ "intent": intent, "payload": payload }))
            .send()
            .await
            .with_context(|| format!("Failed to invoke skill {}", intent))?;

        read_json(response, "invoke skill").await
    }

    /// `POST /event`. Denials and dispatch failures come back as `Ok` with
    /// `accepted: false`.
    pub async fn send_event(&self, envelope: &Value) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}/event", self.base_url))
            .json(envelope)
            .send()
            .await
            .context("Failed to send event")?;

        read_json(response, "send event").await
    }

    pub async fn confirm(&self, token: &str) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}/event/confirm", self.base_url))
            .json(&serde_json::json!({ "confirmation_token": token }))
            .send()
            .await
            .context("Failed to confirm event")?;

        read_json(response, "confirm event").await
    }

    pub async fn reload_policy(&self) -> Result<usize> {
        let response = self
            .client
            .post(format!("{}/policy/reload", self.base_url))
            .send()
            .await
            .context("Failed to reload policy")?;

        let body = read_json(response, "reload policy").await?;
        body["rules"]
            .as_u64()
            .map(|n| n as usize)
            .context("Reload response is missing the rule count")
    }
}

async fn read_json(response: reqwest::Response, action: &str) -> Result<Value> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response (HTTP {})", action, status))?;

    if status.is_success() {
        return Ok(body);
    }

    let code = body["error"]["code"].as_str().unwrap_or("unknown_error");
    let message = body["error"]["message"].as_str().unwrap_or_default();
    anyhow::bail!("Failed to {}: HTTP {} {}: {}", action, status.as_u16(), code, message)
}
