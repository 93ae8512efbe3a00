// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::envelope::Envelope;
use crate::domain::skill::{SkillError, SkillHandler};

/// Placeholder binding for intents registered without a back-end.
///
/// Accepts every envelope and reports what it was asked to do, so an intent
/// can be routed end to end before its real implementation exists.
pub struct AcknowledgeSkill;

#[async_trait]
impl SkillHandler for AcknowledgeSkill {
    async fn invoke(&self, envelope: &Envelope) -> Result<Value, SkillError> {
        Ok(json!({
            "acknowledged": true,
            "intent": envelope.intent,
            "payload": envelope.payload,
        }))
    }

    fn kind(&self) -> String {
        "builtin:acknowledge".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::envelope::validate;

    #[tokio::test]
    async fn test_acknowledge_reports_intent() {
        let envelope = validate(json!({
            "intent": "summarize.doc",
            "payload": {"document_ref": "test.txt"}
        }))
        .unwrap();

        let outputs = AcknowledgeSkill.invoke(&envelope).await.unwrap();
        assert_eq!(outputs["acknowledged"], true);
        assert_eq!(outputs["intent"], "summarize.doc");
        assert_eq!(outputs["payload"]["document_ref"], "test.txt");
    }
}
