// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `unison status`: readiness and introspection of a running server

use anyhow::Result;
use colored::Colorize;
use serde_json::Value;

use crate::daemon::{check_server, OrchestratorClient, ServerStatus};

pub async fn execute(client: &OrchestratorClient, host: &str, port: u16, json: bool) -> Result<()> {
    match check_server(host, port).await? {
        ServerStatus::Running => {}
        ServerStatus::Unhealthy { error } => {
            println!("{} {}", "✗ Server unhealthy:".red().bold(), error);
            return Ok(());
        }
        ServerStatus::Stopped => {
            println!(
                "{} at {}",
                "✗ No orchestrator running".red().bold(),
                client.base_url()
            );
            return Ok(());
        }
    }

    let readiness = client.readiness().await?;
    let snapshot = client.introspect().await?;

    if json {
        let report = serde_json::json!({
            "ready": readiness.ready,
            "deps": readiness.deps,
            "introspection": snapshot,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if readiness.ready {
        println!("{} ({})", "✓ Ready".green().bold(), client.base_url());
    } else {
        println!("{} ({})", "✗ Not ready".yellow().bold(), client.base_url());
    }
    println!();

    println!("{}", "Dependencies:".bold());
    if readiness.deps.is_empty() {
        println!("  {}", "(none declared)".dimmed());
    }
    for (name, healthy) in &readiness.deps {
        let mark = if *healthy { "healthy".green() } else { "unreachable".red() };
        println!("  {}: {}", name, mark);
    }
    println!();

    print_list("Skills:", &snapshot["skills"], |skill| {
        format!(
            "{} ({})",
            skill["intent"].as_str().unwrap_or("?"),
            skill["kind"].as_str().unwrap_or("?")
        )
    });

    print_list("Policy rules:", &snapshot["policy_rules"], |rule| {
        format!(
            "{} → {}",
            rule["name"].as_str().unwrap_or("?"),
            rule["effect"].as_str().unwrap_or("?")
        )
    });
    println!(
        "  default: {}",
        snapshot["default_effect"].as_str().unwrap_or("allow")
    );
    println!();

    println!(
        "Pending confirmations: {}",
        snapshot["pending_confirmations"].as_u64().unwrap_or(0)
    );

    Ok(())
}

fn print_list(title: &str, items: &Value, describe: impl Fn(&Value) -> String) {
    println!("{}", title.bold());
    match items.as_array() {
        Some(items) if !items.is_empty() => {
            for item in items {
                println!("  {}", describe(item));
            }
        }
        _ => println!("  {}", "(none)".dimmed()),
    }
}
