// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Orchestrator Configuration Types
//
// Defines the configuration schema for a unison orchestrator process:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Network bind settings
// - Policy rule table location
// - Confirmation ticket lifetime and sweeping
// - Skill bindings and collaborator dependencies
// - Observability settings

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::policy::PolicyEffect;

pub const API_VERSION: &str = "unison/v1";
pub const KIND: &str = "OrchestratorConfig";

/// Upper bound for `spec.confirmation.ttl_seconds` (one day)
pub const MAX_TICKET_TTL_SECONDS: u64 = 24 * 60 * 60;

/// Upper bound for `spec.confirmation.retention_seconds` (seven days)
pub const MAX_TICKET_RETENTION_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Top-level Kubernetes-style orchestrator configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfigManifest {
    /// API version (must be "unison/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "OrchestratorConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: OrchestratorConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable instance name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfigSpec {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub confirmation: ConfirmationConfig,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Skills bound at startup, in registration order
    #[serde(default = "default_skills")]
    pub skills: Vec<SkillBindingConfig>,

    /// Collaborators probed by `/ready`
    #[serde(default)]
    pub dependencies: Vec<DependencyConfig>,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Rules file; the built-in table is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_path: Option<PathBuf>,

    /// Overrides the default effect declared by the rule table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_effect: Option<PolicyEffect>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    /// Lifetime of a freshly issued ticket
    #[serde(default = "default_ticket_ttl")]
    pub ttl_seconds: u64,

    /// Background sweeper period
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,

    /// How long settled tickets are remembered so late callers get a
    /// precise error instead of "not found"
    #[serde(default = "default_retention")]
    pub retention_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-request deadline for one handler invocation
    #[serde(default = "default_dispatch_timeout")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillKind {
    Echo,
    Acknowledge,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillBindingConfig {
    pub intent: String,

    /// Inferred from `endpoint`/`dependency` when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SkillKind>,

    /// Absolute URL of a remote back-end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Name of a declared dependency whose URL is the base for `path`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl SkillBindingConfig {
    fn builtin(intent: &str, kind: SkillKind) -> Self {
        Self {
            intent: intent.to_string(),
            kind: Some(kind),
            endpoint: None,
            dependency: None,
            path: None,
        }
    }

    fn backed_by(intent: &str, dependency: &str, path: &str) -> Self {
        Self {
            intent: intent.to_string(),
            kind: Some(SkillKind::Remote),
            endpoint: None,
            dependency: Some(dependency.to_string()),
            path: Some(path.to_string()),
        }
    }

    pub fn effective_kind(&self) -> SkillKind {
        match self.kind {
            Some(kind) => kind,
            None if self.endpoint.is_some() || self.dependency.is_some() => SkillKind::Remote,
            None if self.intent == "echo" => SkillKind::Echo,
            None => SkillKind::Acknowledge,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyConfig {
    /// Collaborator name (e.g. "context", "actuation")
    pub name: String,

    /// Base URL; health is probed at `{url}/health`
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Prometheus listener port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_ticket_ttl() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_retention() -> u64 {
    600
}

fn default_dispatch_timeout() -> u64 {
    10_000
}

fn default_probe_timeout() -> u64 {
    2_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_skills() -> Vec<SkillBindingConfig> {
    vec![
        SkillBindingConfig::builtin("echo", SkillKind::Echo),
        SkillBindingConfig::builtin("summarize.doc", SkillKind::Acknowledge),
        SkillBindingConfig::builtin("summarize.document", SkillKind::Acknowledge),
        SkillBindingConfig::backed_by("context.get", "context", "/kv/get"),
        SkillBindingConfig::backed_by("storage.put", "storage", "/kv/put"),
        SkillBindingConfig::backed_by("proposed_action", "actuation", "/actuate"),
    ]
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ticket_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
            retention_seconds: default_retention(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_dispatch_timeout(),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Default for OrchestratorConfigSpec {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            policy: PolicyConfig::default(),
            confirmation: ConfirmationConfig::default(),
            dispatch: DispatchConfig::default(),
            readiness: ReadinessConfig::default(),
            skills: default_skills(),
            dependencies: vec![],
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Default for OrchestratorConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unison".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: OrchestratorConfigSpec::default(),
        }
    }
}

/// Dependencies that may be declared purely through `UNISON_<NAME>_URL`.
const WELL_KNOWN_DEPENDENCIES: &[&str] = &["context", "storage", "actuation", "policy", "io-core"];

impl OrchestratorConfigManifest {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. UNISON_CONFIG_PATH environment variable
    /// 2. ./unison-config.yaml (working directory)
    /// 3. ~/.unison/config.yaml (user home)
    /// 4. /etc/unison/config.yaml (system, Unix) or C:\ProgramData\Unison\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("UNISON_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./unison-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".unison").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/unison/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Unison\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(&config_path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", config_path, e))?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`Self::apply_env_overrides`] with an injectable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("UNISON_BIND_ADDRESS") {
            tracing::info!("Environment override: UNISON_BIND_ADDRESS={}", val);
            self.spec.network.bind_address = val;
        }

        if let Some(val) = lookup("UNISON_PORT") {
            match val.parse() {
                Ok(port) => {
                    tracing::info!("Environment override: UNISON_PORT={}", port);
                    self.spec.network.port = port;
                }
                Err(_) => tracing::warn!("Invalid value for UNISON_PORT: '{}'. Ignoring.", val),
            }
        }

        if let Some(val) = lookup("UNISON_CONFIRMATION_TTL_SECONDS") {
            match val.parse() {
                Ok(ttl) => {
                    tracing::info!("Environment override: UNISON_CONFIRMATION_TTL_SECONDS={}", ttl);
                    self.spec.confirmation.ttl_seconds = ttl;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for UNISON_CONFIRMATION_TTL_SECONDS: '{}'. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = lookup("UNISON_DISPATCH_TIMEOUT_MS") {
            match val.parse() {
                Ok(timeout) => {
                    tracing::info!("Environment override: UNISON_DISPATCH_TIMEOUT_MS={}", timeout);
                    self.spec.dispatch.timeout_ms = timeout;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for UNISON_DISPATCH_TIMEOUT_MS: '{}'. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = lookup("UNISON_POLICY_RULES_PATH") {
            tracing::info!("Environment override: UNISON_POLICY_RULES_PATH={}", val);
            self.spec.policy.rules_path = Some(PathBuf::from(val));
        }

        let mut names: Vec<String> = self.spec.dependencies.iter().map(|d| d.name.clone()).collect();
        for known in WELL_KNOWN_DEPENDENCIES {
            if !names.iter().any(|n| n == known) {
                names.push(known.to_string());
            }
        }
        for name in names {
            let key = dependency_env_key(&name);
            if let Some(url) = lookup(&key) {
                tracing::info!("Environment override: {}={}", key, url);
                match self.spec.dependencies.iter_mut().find(|d| d.name == name) {
                    Some(dep) => dep.url = url,
                    None => self.spec.dependencies.push(DependencyConfig { name, url }),
                }
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.confirmation.ttl_seconds == 0 {
            anyhow::bail!("spec.confirmation.ttl_seconds must be greater than zero");
        }

        if self.spec.confirmation.ttl_seconds > MAX_TICKET_TTL_SECONDS {
            anyhow::bail!(
                "spec.confirmation.ttl_seconds must be at most {}",
                MAX_TICKET_TTL_SECONDS
            );
        }

        if self.spec.confirmation.retention_seconds > MAX_TICKET_RETENTION_SECONDS {
            anyhow::bail!(
                "spec.confirmation.retention_seconds must be at most {}",
                MAX_TICKET_RETENTION_SECONDS
            );
        }

        if self.spec.confirmation.sweep_interval_seconds == 0 {
            anyhow::bail!("spec.confirmation.sweep_interval_seconds must be greater than zero");
        }

        if self.spec.dispatch.timeout_ms == 0 {
            anyhow::bail!("spec.dispatch.timeout_ms must be greater than zero");
        }

        let mut dependency_names = HashSet::new();
        for dep in &self.spec.dependencies {
            if dep.name.is_empty() {
                anyhow::bail!("Dependency name cannot be empty");
            }
            if dep.url.is_empty() {
                anyhow::bail!("Dependency url cannot be empty for: {}", dep.name);
            }
            if !dependency_names.insert(dep.name.as_str()) {
                anyhow::bail!("Duplicate dependency: {}", dep.name);
            }
        }

        let mut intents = HashSet::new();
        for skill in &self.spec.skills {
            if skill.intent.is_empty() {
                anyhow::bail!("Skill intent cannot be empty");
            }
            if !intents.insert(skill.intent.as_str()) {
                anyhow::bail!("Duplicate skill intent: {}", skill.intent);
            }
            if skill.effective_kind() == SkillKind::Remote
                && skill.endpoint.is_none()
                && skill.dependency.is_none()
            {
                anyhow::bail!(
                    "Remote skill '{}' needs an endpoint or a dependency",
                    skill.intent
                );
            }
        }

        Ok(())
    }

    /// Resolve a skill's remote URL against the declared dependencies.
    ///
    /// Returns `None` when the skill is backed by a dependency that has not
    /// been configured.
    pub fn skill_endpoint(&self, skill: &SkillBindingConfig) -> Option<String> {
        if let Some(endpoint) = &skill.endpoint {
            return Some(endpoint.clone());
        }
        let dep_name = skill.dependency.as_ref()?;
        let dep = self.spec.dependencies.iter().find(|d| &d.name == dep_name)?;
        let path = skill.path.as_deref().unwrap_or("");
        Some(format!("{}{}", dep.url.trim_end_matches('/'), path))
    }

    /// Ticket lifetime, clamped to [`MAX_TICKET_TTL_SECONDS`].
    pub fn ticket_ttl(&self) -> chrono::Duration {
        bounded_seconds(self.spec.confirmation.ttl_seconds, MAX_TICKET_TTL_SECONDS)
    }

    /// Tombstone retention, clamped to [`MAX_TICKET_RETENTION_SECONDS`].
    pub fn ticket_retention(&self) -> chrono::Duration {
        bounded_seconds(
            self.spec.confirmation.retention_seconds,
            MAX_TICKET_RETENTION_SECONDS,
        )
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.spec.confirmation.sweep_interval_seconds)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_millis(self.spec.dispatch.timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.spec.readiness.probe_timeout_ms)
    }
}

fn bounded_seconds(seconds: u64, max: u64) -> chrono::Duration {
    i64::try_from(seconds.min(max))
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::zero())
}

/// `io-core` -> `UNISON_IO_CORE_URL`
pub fn dependency_env_key(name: &str) -> String {
    let upper: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("UNISON_{}_URL", upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = OrchestratorConfigManifest::default();
        assert_eq!(manifest.api_version, "unison/v1");
        assert_eq!(manifest.kind, "OrchestratorConfig");
        assert!(!manifest.metadata.name.is_empty());
        assert_eq!(manifest.spec.network.port, 8080);
        assert_eq!(manifest.spec.confirmation.ttl_seconds, 300);

        let intents: Vec<_> = manifest.spec.skills.iter().map(|s| s.intent.as_str()).collect();
        assert_eq!(
            intents,
            vec![
                "echo",
                "summarize.doc",
                "summarize.document",
                "context.get",
                "storage.put",
                "proposed_action"
            ]
        );
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_minimal_yaml_fills_defaults() {
        let yaml = r#"
apiVersion: unison/v1
kind: OrchestratorConfig
metadata:
  name: kitchen-hub
spec:
  network:
    port: 9100
  confirmation:
    ttl_seconds: 45
  dependencies:
    - name: context
      url: http://localhost:8081/
"#;
        let manifest = OrchestratorConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.metadata.name, "kitchen-hub");
        assert_eq!(manifest.spec.network.port, 9100);
        assert_eq!(manifest.spec.network.bind_address, "0.0.0.0");
        assert_eq!(manifest.ticket_ttl(), chrono::Duration::seconds(45));
        assert_eq!(manifest.dispatch_timeout(), Duration::from_millis(10_000));
        assert_eq!(manifest.spec.skills.len(), 6);

        let context_get = manifest
            .spec
            .skills
            .iter()
            .find(|s| s.intent == "context.get")
            .unwrap();
        assert_eq!(
            manifest.skill_endpoint(context_get).as_deref(),
            Some("http://localhost:8081/kv/get")
        );

        let storage_put = manifest
            .spec
            .skills
            .iter()
            .find(|s| s.intent == "storage.put")
            .unwrap();
        assert_eq!(manifest.skill_endpoint(storage_put), None);
    }

    #[test]
    fn test_env_overrides() {
        let mut manifest = OrchestratorConfigManifest::default();
        let env: HashMap<&str, &str> = HashMap::from([
            ("UNISON_PORT", "7000"),
            ("UNISON_BIND_ADDRESS", "127.0.0.1"),
            ("UNISON_CONFIRMATION_TTL_SECONDS", "15"),
            ("UNISON_DISPATCH_TIMEOUT_MS", "not-a-number"),
            ("UNISON_POLICY_RULES_PATH", "/etc/unison/rules.yaml"),
            ("UNISON_CONTEXT_URL", "http://context:8081"),
            ("UNISON_IO_CORE_URL", "http://io-core:8085"),
        ]);
        manifest.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(manifest.spec.network.port, 7000);
        assert_eq!(manifest.spec.network.bind_address, "127.0.0.1");
        assert_eq!(manifest.spec.confirmation.ttl_seconds, 15);
        assert_eq!(manifest.spec.dispatch.timeout_ms, 10_000);
        assert_eq!(
            manifest.spec.policy.rules_path,
            Some(PathBuf::from("/etc/unison/rules.yaml"))
        );
        assert_eq!(
            manifest.spec.dependencies,
            vec![
                DependencyConfig {
                    name: "context".to_string(),
                    url: "http://context:8081".to_string()
                },
                DependencyConfig {
                    name: "io-core".to_string(),
                    url: "http://io-core:8085".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_validation() {
        let mut manifest = OrchestratorConfigManifest::default();
        assert!(manifest.validate().is_ok());

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.confirmation.ttl_seconds = 0;
        assert!(manifest.validate().is_err());
        manifest.spec.confirmation.ttl_seconds = 100_000_000_000_000;
        assert!(manifest.validate().is_err());
        manifest.spec.confirmation.ttl_seconds = MAX_TICKET_TTL_SECONDS;
        assert!(manifest.validate().is_ok());
        manifest.spec.confirmation.ttl_seconds = 60;

        manifest.spec.confirmation.retention_seconds = u64::MAX;
        assert!(manifest.validate().is_err());
        manifest.spec.confirmation.retention_seconds = 600;

        manifest.spec.dispatch.timeout_ms = 0;
        assert!(manifest.validate().is_err());
        manifest.spec.dispatch.timeout_ms = 500;

        manifest
            .spec
            .skills
            .push(SkillBindingConfig::builtin("echo", SkillKind::Echo));
        assert!(manifest.validate().is_err());
        manifest.spec.skills.pop();

        manifest.spec.dependencies.push(DependencyConfig {
            name: "context".to_string(),
            url: String::new(),
        });
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_oversized_durations_are_clamped() {
        let mut manifest = OrchestratorConfigManifest::default();
        manifest.spec.confirmation.ttl_seconds = 100_000_000_000_000;
        manifest.spec.confirmation.retention_seconds = u64::MAX;

        assert_eq!(
            manifest.ticket_ttl(),
            chrono::Duration::seconds(MAX_TICKET_TTL_SECONDS as i64)
        );
        assert_eq!(
            manifest.ticket_retention(),
            chrono::Duration::seconds(MAX_TICKET_RETENTION_SECONDS as i64)
        );
    }

    #[test]
    fn test_effective_kind_inference() {
        let bare = SkillBindingConfig {
            intent: "weather.today".to_string(),
            kind: None,
            endpoint: None,
            dependency: None,
            path: None,
        };
        assert_eq!(bare.effective_kind(), SkillKind::Acknowledge);

        let remote = SkillBindingConfig {
            endpoint: Some("http://localhost:9000/run".to_string()),
            ..bare.clone()
        };
        assert_eq!(remote.effective_kind(), SkillKind::Remote);
    }

    #[test]
    fn test_dependency_env_key() {
        assert_eq!(dependency_env_key("context"), "UNISON_CONTEXT_URL");
        assert_eq!(dependency_env_key("io-core"), "UNISON_IO_CORE_URL");
    }
}
