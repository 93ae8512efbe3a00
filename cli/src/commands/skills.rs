// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Skill registry commands
//!
//! Commands: list, register, invoke

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_json::Value;

use crate::daemon::OrchestratorClient;

#[derive(Subcommand)]
pub enum SkillsCommand {
    /// List registered intents in registration order
    List,

    /// Register one or more intents
    Register {
        /// Intents to bind
        #[arg(value_name = "INTENT", required = true)]
        intents: Vec<String>,

        /// Remote back-end URL (only with a single intent)
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
    },

    /// Invoke a skill directly, bypassing policy
    Invoke {
        intent: String,

        /// JSON payload
        #[arg(long, default_value = "{}")]
        payload: String,
    },
}

pub async fn handle_command(command: SkillsCommand, client: &OrchestratorClient) -> Result<()> {
    match command {
        SkillsCommand::List => list(client).await,
        SkillsCommand::Register { intents, endpoint } => {
            register(client, &intents, endpoint.as_deref()).await
        }
        SkillsCommand::Invoke { intent, payload } => invoke(client, &intent, &payload).await,
    }
}

async fn list(client: &OrchestratorClient) -> Result<()> {
    let skills = client.list_skills().await?;

    if skills.is_empty() {
        println!("{}", "No skills registered".yellow());
        return Ok(());
    }

    println!("{}", format!("Registered skills ({}):", skills.len()).bold());
    for intent in skills {
        println!("  {}", intent);
    }

    Ok(())
}

async fn register(
    client: &OrchestratorClient,
    intents: &[String],
    endpoint: Option<&str>,
) -> Result<()> {
    if endpoint.is_some() && intents.len() > 1 {
        anyhow::bail!("--endpoint can only be used when registering a single intent");
    }

    for intent in intents {
        let report = client.register_skill(intent, endpoint).await?;
        if report.registered {
            println!(
                "{} {} ({})",
                "✓ Registered".green(),
                intent.bold(),
                report.kind.as_deref().unwrap_or("unknown")
            );
        } else {
            println!(
                "{} {} ({})",
                "• Skipped".yellow(),
                intent.bold(),
                report.status
            );
        }
    }

    Ok(())
}

async fn invoke(client: &OrchestratorClient, intent: &str, payload: &str) -> Result<()> {
    let payload: Value = serde_json::from_str(payload).context("--payload is not valid JSON")?;
    let body = client.invoke_skill(intent, &payload).await?;
    super::print_dispatch(&body)
}
