// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Active policy rule table
//!
//! Readers take a cheap `Arc` snapshot and evaluate against it without
//! holding the lock. A reload parses the new table completely before
//! swapping it in, so a request sees either the old table or the new one,
//! never a mix, and a broken rules file leaves the current table active.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::domain::envelope::Envelope;
use crate::domain::orchestrator_config::OrchestratorConfigManifest;
use crate::domain::policy::{evaluate, Decision, PolicyEffect, PolicyLoadError, RuleSet};

pub struct PolicyStore {
    active: RwLock<Arc<RuleSet>>,
    source: Option<PathBuf>,
    default_override: Option<PolicyEffect>,
}

impl PolicyStore {
    /// Fixed table with no backing file; [`PolicyStore::reload`] will fail.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            active: RwLock::new(Arc::new(rules)),
            source: None,
            default_override: None,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyLoadError> {
        let path = path.as_ref().to_path_buf();
        let rules = RuleSet::from_yaml_file(&path)?;
        info!(path = ?path, rules = rules.len(), "Loaded policy rules");
        Ok(Self {
            active: RwLock::new(Arc::new(rules)),
            source: Some(path),
            default_override: None,
        })
    }

    /// Configured rules file, or the built-in table when none is set.
    pub fn from_config(config: &OrchestratorConfigManifest) -> Result<Self, PolicyLoadError> {
        let mut store = match &config.spec.policy.rules_path {
            Some(path) => Self::from_file(path)?,
            None => {
                info!("No policy rules file configured, using built-in rules");
                Self::new(RuleSet::builtin())
            }
        };
        if let Some(effect) = config.spec.policy.default_effect {
            store.default_override = Some(effect);
            store.replace(store.snapshot().as_ref().clone());
        }
        Ok(store)
    }

    pub fn snapshot(&self) -> Arc<RuleSet> {
        self.active.read().clone()
    }

    pub fn evaluate(&self, envelope: &Envelope) -> Decision {
        evaluate(envelope, &self.snapshot())
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn replace(&self, mut rules: RuleSet) {
        if let Some(effect) = self.default_override {
            rules.default_effect = effect;
        }
        *self.active.write() = Arc::new(rules);
    }

    /// Re-read the rules file and swap it in. Returns the new rule count.
    pub fn reload(&self) -> Result<usize, PolicyLoadError> {
        let Some(path) = &self.source else {
            return Err(PolicyLoadError::NoSource);
        };

        match RuleSet::from_yaml_file(path) {
            Ok(rules) => {
                let count = rules.len();
                self.replace(rules);
                info!(path = ?path, rules = count, "Policy rules reloaded");
                Ok(count)
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "Policy reload failed, keeping previous rules");
                Err(e)
            }
        }
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new(RuleSet::builtin())
    }
}
