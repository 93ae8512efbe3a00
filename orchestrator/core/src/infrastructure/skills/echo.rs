// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::envelope::Envelope;
use crate::domain::skill::{SkillError, SkillHandler};

/// Returns the payload unchanged.
pub struct EchoSkill;

#[async_trait]
impl SkillHandler for EchoSkill {
    async fn invoke(&self, envelope: &Envelope) -> Result<Value, SkillError> {
        Ok(envelope.payload.clone())
    }

    fn kind(&self) -> String {
        "builtin:echo".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::envelope::validate;
    use serde_json::json;

    #[tokio::test]
    async fn test_echo_returns_payload() {
        let envelope = validate(json!({"intent": "echo", "payload": {"message": "hi"}})).unwrap();
        let outputs = EchoSkill.invoke(&envelope).await.unwrap();
        assert_eq!(outputs, json!({"message": "hi"}));
    }
}
