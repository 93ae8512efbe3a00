// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use unison_core::domain::orchestrator_config::{OrchestratorConfigManifest, SkillKind};

const MINIMAL_TEMPLATE: &str = include_str!("../../templates/config-minimal.yaml");
const EXAMPLES_TEMPLATE: &str = include_str!("../../templates/config-with-examples.yaml");
const RULES_TEMPLATE: &str = include_str!("../../templates/rules.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective configuration as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./unison-config.yaml)
        #[arg(short, long, default_value = "./unison-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,

        /// Also write a sample policy rules file
        #[arg(long, value_name = "FILE")]
        rules: Option<PathBuf>,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate {
            output,
            examples,
            rules,
        } => generate(&output, examples, rules.as_deref()).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config = OrchestratorConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. UNISON_CONFIG_PATH: {}",
            std::env::var("UNISON_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./unison-config.yaml");
        println!("  4. ~/.unison/config.yaml");
        println!("  5. /etc/unison/config.yaml");
        println!();
    }

    if as_yaml {
        let yaml = serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
        print!("{}", yaml);
        return Ok(());
    }

    let spec = &config.spec;
    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Instance:".bold());
    println!("  Name: {}", config.metadata.name);
    println!(
        "  Listen: {}:{}",
        spec.network.bind_address, spec.network.port
    );
    println!();

    println!("{}", "Policy:".bold());
    match &spec.policy.rules_path {
        Some(path) => println!("  Rules file: {}", path.display()),
        None => println!("  Rules file: {}", "(built-in table)".dimmed()),
    }
    if let Some(effect) = spec.policy.default_effect {
        println!("  Default effect override: {}", effect);
    }
    println!();

    println!("{}", "Confirmation:".bold());
    println!("  Ticket TTL: {}s", spec.confirmation.ttl_seconds);
    println!("  Sweep interval: {}s", spec.confirmation.sweep_interval_seconds);
    println!("  Retention: {}s", spec.confirmation.retention_seconds);
    println!("  Dispatch timeout: {}ms", spec.dispatch.timeout_ms);
    println!();

    println!("{}", "Dependencies:".bold());
    if spec.dependencies.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for dep in &spec.dependencies {
        println!("  {} → {}", dep.name.bold(), dep.url);
    }
    println!();

    println!("{}", "Skills:".bold());
    for skill in &spec.skills {
        let target = match skill.effective_kind() {
            SkillKind::Echo => "builtin:echo".to_string(),
            SkillKind::Acknowledge => "builtin:acknowledge".to_string(),
            SkillKind::Remote => match config.skill_endpoint(skill) {
                Some(url) => format!("remote:{}", url),
                None => format!(
                    "remote:{} {}",
                    skill.dependency.as_deref().unwrap_or("?"),
                    "(dependency not configured)".yellow()
                ),
            },
        };
        println!("  {} → {}", skill.intent.bold(), target);
    }
    println!();

    println!("{}", "Observability:".bold());
    println!(
        "  Logging: {} ({})",
        spec.observability.logging.level, spec.observability.logging.format
    );
    if spec.observability.metrics.enabled {
        println!("  Metrics: enabled on port {}", spec.observability.metrics.port);
    } else {
        println!("  Metrics: {}", "disabled".dimmed());
    }

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = OrchestratorConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    if let Some(rules_path) = &config.spec.policy.rules_path {
        unison_core::domain::policy::RuleSet::from_yaml_file(rules_path)
            .with_context(|| format!("Invalid policy rules in {}", rules_path.display()))?;
    }

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: &Path, with_examples: bool, rules: Option<&Path>) -> Result<()> {
    let sample = if with_examples {
        EXAMPLES_TEMPLATE
    } else {
        MINIMAL_TEMPLATE
    };

    std::fs::write(output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    if let Some(rules) = rules {
        std::fs::write(rules, RULES_TEMPLATE)
            .with_context(|| format!("Failed to write rules to {:?}", rules))?;
        println!(
            "{}",
            format!("✓ Policy rules generated: {}", rules.display()).green()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use unison_core::domain::policy::{PolicyEffect, RuleSet};

    #[test]
    fn test_templates_are_valid() {
        for template in [MINIMAL_TEMPLATE, EXAMPLES_TEMPLATE] {
            let config = OrchestratorConfigManifest::from_yaml_str(template).unwrap();
            config.validate().unwrap();
        }

        let rules = RuleSet::from_yaml_str(RULES_TEMPLATE).unwrap();
        assert_eq!(rules.default_effect, PolicyEffect::Allow);
        assert_eq!(rules.rules[0].effect, PolicyEffect::Deny);
    }

    #[test]
    fn test_examples_template_resolves_dependency_skills() {
        let config = OrchestratorConfigManifest::from_yaml_str(EXAMPLES_TEMPLATE).unwrap();
        let storage = config
            .spec
            .skills
            .iter()
            .find(|s| s.intent == "storage.put")
            .unwrap();
        assert_eq!(
            config.skill_endpoint(storage).as_deref(),
            Some("http://localhost:8082/kv/put")
        );
    }

    #[tokio::test]
    async fn test_generate_writes_config_and_rules() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("unison-config.yaml");
        let rules_path = dir.path().join("rules.yaml");

        generate(&config_path, false, Some(rules_path.as_path())).await.unwrap();

        let config = OrchestratorConfigManifest::from_yaml_file(&config_path).unwrap();
        assert_eq!(config.metadata.name, "unison-local");
        assert!(RuleSet::from_yaml_file(&rules_path).is_ok());
    }
}
