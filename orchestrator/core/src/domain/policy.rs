// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Event Policy
//!
//! Policy-as-data: an ordered rule table decides whether an envelope runs now,
//! is denied, or waits for a human to confirm it.
//!
//! ## Evaluation order
//!
//! Rules are checked top to bottom and the **first** matching rule wins. Two
//! rules that both match are never merged or ranked; the one listed earlier
//! decides. When nothing matches, [`RuleSet::default_effect`] applies
//! (`allow` unless the rules file says otherwise).
//!
//! ## Match fields
//!
//! All fields of a [`RuleMatch`] are optional and combined with AND. An empty
//! match is a catch-all.
//!
//! | Field | Matches when |
//! |-------|--------------|
//! | `intent` | intent matches the pattern (`*`, `prefix.*`, exact) |
//! | `source` | source matches the pattern |
//! | `auth_scope` | envelope is scoped and the scope matches the pattern |
//! | `unscoped` | `true`: envelope has no scope; `false`: it has one |
//! | `data_classification` | envelope classification is in the list |
//! | `allows_cloud` | envelope states exactly this value |
//!
//! Envelopes that omit a hint never match a rule constraining that hint.
//!
//! [`evaluate`] is pure: same envelope and same table, same [`Decision`].

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::envelope::{DataClassification, Envelope};

#[derive(Debug, Error)]
pub enum PolicyLoadError {
    #[error("failed to read rules file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse rules: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid rule '{name}': {reason}")]
    InvalidRule { name: String, reason: String },

    #[error("duplicate rule name '{0}'")]
    DuplicateRule(String),

    #[error("no rules file configured")]
    NoSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyEffect {
    Allow,
    Deny,
    RequireConfirmation,
}

impl PolicyEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::RequireConfirmation => "require_confirmation",
        }
    }
}

impl Default for PolicyEffect {
    fn default() -> Self {
        Self::Allow
    }
}

impl std::fmt::Display for PolicyEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Predicate over envelope fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleMatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_scope: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unscoped: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_classification: Option<Vec<DataClassification>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allows_cloud: Option<bool>,
}

impl RuleMatch {
    pub fn matches(&self, envelope: &Envelope) -> bool {
        if let Some(pattern) = &self.intent {
            if !matches_pattern(pattern, &envelope.intent) {
                return false;
            }
        }

        if let Some(pattern) = &self.source {
            if !matches_pattern(pattern, &envelope.source) {
                return false;
            }
        }

        if let Some(pattern) = &self.auth_scope {
            match &envelope.auth_scope {
                Some(scope) if matches_pattern(pattern, scope) => {}
                _ => return false,
            }
        }

        if let Some(unscoped) = self.unscoped {
            if envelope.auth_scope.is_none() != unscoped {
                return false;
            }
        }

        if let Some(classes) = &self.data_classification {
            match envelope.data_classification() {
                Some(class) if classes.contains(&class) => {}
                _ => return false,
            }
        }

        if let Some(allows_cloud) = self.allows_cloud {
            if envelope.allows_cloud() != Some(allows_cloud) {
                return false;
            }
        }

        true
    }

    fn patterns(&self) -> impl Iterator<Item = &String> {
        self.intent
            .iter()
            .chain(self.source.iter())
            .chain(self.auth_scope.iter())
    }
}

/// One entry of the rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub name: String,

    #[serde(rename = "match", default)]
    pub matcher: RuleMatch,

    pub effect: PolicyEffect,

    /// Shown to callers on deny / confirmation responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PolicyRule {
    pub fn new(name: impl Into<String>, matcher: RuleMatch, effect: PolicyEffect) -> Self {
        Self {
            name: name.into(),
            matcher,
            effect,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn matches(&self, envelope: &Envelope) -> bool {
        self.matcher.matches(envelope)
    }
}

/// Read-only view of a rule for introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub name: String,
    pub effect: PolicyEffect,
    #[serde(rename = "match")]
    pub matcher: RuleMatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Ordered rule table plus the effect used when nothing matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub default_effect: PolicyEffect,

    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self {
            default_effect: PolicyEffect::Allow,
            rules,
        }
    }

    /// Rule table used when no rules file is configured.
    pub fn builtin() -> Self {
        Self::new(vec![PolicyRule::new(
            "sensitive-data-requires-confirmation",
            RuleMatch {
                data_classification: Some(vec![
                    DataClassification::Confidential,
                    DataClassification::Restricted,
                ]),
                ..RuleMatch::default()
            },
            PolicyEffect::RequireConfirmation,
        )
        .with_reason("event touches confidential data")])
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, PolicyLoadError> {
        let rules: Self = serde_yaml::from_str(yaml)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, PolicyLoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| PolicyLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<(), PolicyLoadError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            if rule.name.trim().is_empty() {
                return Err(PolicyLoadError::InvalidRule {
                    name: rule.name.clone(),
                    reason: "name cannot be empty".to_string(),
                });
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(PolicyLoadError::DuplicateRule(rule.name.clone()));
            }
            for pattern in rule.matcher.patterns() {
                if let Err(reason) = check_pattern(pattern) {
                    return Err(PolicyLoadError::InvalidRule {
                        name: rule.name.clone(),
                        reason,
                    });
                }
            }
            if matches!(&rule.matcher.data_classification, Some(classes) if classes.is_empty()) {
                return Err(PolicyLoadError::InvalidRule {
                    name: rule.name.clone(),
                    reason: "data_classification list cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn summary(&self) -> Vec<RuleSummary> {
        self.rules
            .iter()
            .map(|rule| RuleSummary {
                name: rule.name.clone(),
                effect: rule.effect,
                matcher: rule.matcher.clone(),
                reason: rule.reason.clone(),
            })
            .collect()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Outcome of evaluating one envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub effect: PolicyEffect,
    /// `None` when the default effect applied
    pub matched_rule: Option<String>,
    pub reason: Option<String>,
}

pub fn evaluate(envelope: &Envelope, rules: &RuleSet) -> Decision {
    rules
        .rules
        .iter()
        .find(|rule| rule.matches(envelope))
        .map(|rule| Decision {
            effect: rule.effect,
            matched_rule: Some(rule.name.clone()),
            reason: rule.reason.clone(),
        })
        .unwrap_or(Decision {
            effect: rules.default_effect,
            matched_rule: None,
            reason: None,
        })
}

fn matches_pattern(pattern: &str, value: &str) -> bool {
    if pattern == "*" || pattern == value {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix(".*") {
        return value
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'));
    }
    false
}

fn check_pattern(pattern: &str) -> Result<(), String> {
    if pattern.is_empty() {
        return Err("pattern cannot be empty".to_string());
    }
    let body = pattern.strip_suffix(".*").unwrap_or(pattern);
    if pattern != "*" && body.contains('*') {
        return Err(format!(
            "pattern '{}' may only use '*' alone or as a trailing '.*'",
            pattern
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::envelope::validate;
    use serde_json::json;

    fn envelope(value: serde_json::Value) -> Envelope {
        validate(value).unwrap()
    }

    #[test]
    fn test_confidential_requires_confirmation_by_default() {
        let rules = RuleSet::builtin();
        let decision = evaluate(
            &envelope(json!({
                "intent": "summarize.document",
                "safety_context": {"data_classification": "confidential", "allows_cloud": false}
            })),
            &rules,
        );

        assert_eq!(decision.effect, PolicyEffect::RequireConfirmation);
        assert_eq!(
            decision.matched_rule.as_deref(),
            Some("sensitive-data-requires-confirmation")
        );
    }

    #[test]
    fn test_public_internal_and_unscoped_fall_through_to_allow() {
        let rules = RuleSet::builtin();
        for value in [
            json!({"intent": "echo"}),
            json!({"intent": "echo", "safety_context": {}}),
            json!({"intent": "echo", "safety_context": {"data_classification": "public"}}),
            json!({
                "intent": "summarize.document",
                "safety_context": {"data_classification": "internal", "allows_cloud": false}
            }),
        ] {
            let decision = evaluate(&envelope(value), &rules);
            assert_eq!(decision.effect, PolicyEffect::Allow);
            assert!(decision.matched_rule.is_none());
        }
    }

    #[test]
    fn test_explicit_allow_listed_first_overrides_confidential() {
        let mut rules = RuleSet::builtin();
        rules.rules.insert(
            0,
            PolicyRule::new(
                "trusted-local-summaries",
                RuleMatch {
                    intent: Some("summarize.*".to_string()),
                    auth_scope: Some("person.local.explicit".to_string()),
                    ..RuleMatch::default()
                },
                PolicyEffect::Allow,
            ),
        );

        let scoped = envelope(json!({
            "intent": "summarize.doc",
            "auth_scope": "person.local.explicit",
            "safety_context": {"data_classification": "confidential"}
        }));
        assert_eq!(evaluate(&scoped, &rules).effect, PolicyEffect::Allow);

        let unscoped = envelope(json!({
            "intent": "summarize.doc",
            "safety_context": {"data_classification": "confidential"}
        }));
        assert_eq!(
            evaluate(&unscoped, &rules).effect,
            PolicyEffect::RequireConfirmation
        );
    }

    #[test]
    fn test_equal_matches_resolve_by_table_order() {
        let deny_first = RuleSet::new(vec![
            PolicyRule::new("cloud-deny", RuleMatch::default(), PolicyEffect::Deny),
            PolicyRule::new("cloud-confirm", RuleMatch::default(), PolicyEffect::RequireConfirmation),
        ]);
        let confirm_first = RuleSet::new(deny_first.rules.iter().rev().cloned().collect());
        let event = envelope(json!({"intent": "inference.cloud.generate"}));

        let decision = evaluate(&event, &deny_first);
        assert_eq!(decision.effect, PolicyEffect::Deny);
        assert_eq!(decision.matched_rule.as_deref(), Some("cloud-deny"));

        let decision = evaluate(&event, &confirm_first);
        assert_eq!(decision.effect, PolicyEffect::RequireConfirmation);
        assert_eq!(decision.matched_rule.as_deref(), Some("cloud-confirm"));
    }

    #[test]
    fn test_cloud_restriction_is_configured_as_data() {
        let yaml = r#"
default_effect: allow
rules:
  - name: no-cloud-inference
    match:
      intent: "inference.cloud.*"
      allows_cloud: false
    effect: deny
    reason: "cloud dispatch not permitted for this event"
"#;
        let rules = RuleSet::from_yaml_str(yaml).unwrap();

        let blocked = envelope(json!({
            "intent": "inference.cloud.generate",
            "safety_context": {"allows_cloud": false}
        }));
        let decision = evaluate(&blocked, &rules);
        assert_eq!(decision.effect, PolicyEffect::Deny);
        assert_eq!(
            decision.reason.as_deref(),
            Some("cloud dispatch not permitted for this event")
        );

        // Unstated cloud permission does not match an explicit `false`
        let unstated = envelope(json!({"intent": "inference.cloud.generate"}));
        assert_eq!(evaluate(&unstated, &rules).effect, PolicyEffect::Allow);

        // Prefix patterns respect segment boundaries
        let lookalike = envelope(json!({
            "intent": "inference.cloudy",
            "safety_context": {"allows_cloud": false}
        }));
        assert_eq!(evaluate(&lookalike, &rules).effect, PolicyEffect::Allow);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let rules = RuleSet::builtin();
        let event = envelope(json!({
            "intent": "storage.put",
            "safety_context": {"data_classification": "restricted"}
        }));
        let first = evaluate(&event, &rules);
        for _ in 0..100 {
            assert_eq!(evaluate(&event, &rules), first);
        }
    }

    #[test]
    fn test_unscoped_match() {
        let rules = RuleSet::new(vec![PolicyRule::new(
            "system-events-only",
            RuleMatch {
                unscoped: Some(true),
                ..RuleMatch::default()
            },
            PolicyEffect::Deny,
        )]);

        assert_eq!(
            evaluate(&envelope(json!({"intent": "echo"})), &rules).effect,
            PolicyEffect::Deny
        );
        assert_eq!(
            evaluate(
                &envelope(json!({"intent": "echo", "auth_scope": "person.local.explicit"})),
                &rules
            )
            .effect,
            PolicyEffect::Allow
        );
    }

    #[test]
    fn test_rule_table_validation() {
        let duplicate = r#"
rules:
  - name: a
    effect: allow
  - name: a
    effect: deny
"#;
        assert!(matches!(
            RuleSet::from_yaml_str(duplicate),
            Err(PolicyLoadError::DuplicateRule(name)) if name == "a"
        ));

        let bad_pattern = r#"
rules:
  - name: mid-wildcard
    match:
      intent: "summarize.*.doc"
    effect: deny
"#;
        assert!(matches!(
            RuleSet::from_yaml_str(bad_pattern),
            Err(PolicyLoadError::InvalidRule { .. })
        ));

        let unknown_field = r#"
rules:
  - name: typo
    match:
      intnet: "echo"
    effect: deny
"#;
        assert!(matches!(
            RuleSet::from_yaml_str(unknown_field),
            Err(PolicyLoadError::Parse(_))
        ));

        let unknown_effect = r#"
rules:
  - name: maybe
    effect: perhaps
"#;
        assert!(RuleSet::from_yaml_str(unknown_effect).is_err());
    }

    #[test]
    fn test_default_effect_is_configurable() {
        let rules = RuleSet::from_yaml_str("default_effect: deny\nrules: []\n").unwrap();
        let decision = evaluate(&envelope(json!({"intent": "echo"})), &rules);
        assert_eq!(decision.effect, PolicyEffect::Deny);
        assert!(decision.matched_rule.is_none());

        let empty = RuleSet::from_yaml_str("{}").unwrap();
        assert_eq!(empty.default_effect, PolicyEffect::Allow);
        assert!(empty.is_empty());
    }
}
