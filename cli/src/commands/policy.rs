// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Policy rule commands
//!
//! Commands: check, reload

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use unison_core::domain::policy::RuleSet;

use crate::daemon::OrchestratorClient;

#[derive(Subcommand)]
pub enum PolicyCommand {
    /// Parse and validate a rules file without contacting the server
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Ask the running server to re-read its rules file
    Reload,
}

pub async fn handle_command(command: PolicyCommand, client: &OrchestratorClient) -> Result<()> {
    match command {
        PolicyCommand::Check { file } => check(&file),
        PolicyCommand::Reload => {
            let rules = client.reload_policy().await?;
            println!("{}", format!("✓ Policy reloaded ({} rules)", rules).green());
            Ok(())
        }
    }
}

fn check(file: &Path) -> Result<()> {
    let rules = RuleSet::from_yaml_file(file)
        .with_context(|| format!("Invalid policy rules in {}", file.display()))?;

    println!(
        "{}",
        format!("✓ {} rules, default effect {}", rules.len(), rules.default_effect).green()
    );
    for rule in &rules.rules {
        println!("  {} → {}", rule.name.bold(), rule.effect);
    }

    Ok(())
}
