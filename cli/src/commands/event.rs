// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Event submission commands
//!
//! Commands: send, confirm

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::daemon::OrchestratorClient;

#[derive(Subcommand)]
pub enum EventCommand {
    /// Submit an event envelope read from a JSON file ("-" for stdin)
    Send {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Redeem the confirmation token right away if one is issued
        #[arg(long)]
        confirm: bool,
    },

    /// Redeem a confirmation token
    Confirm {
        #[arg(value_name = "TOKEN")]
        token: String,
    },
}

pub async fn handle_command(command: EventCommand, client: &OrchestratorClient) -> Result<()> {
    match command {
        EventCommand::Send { file, confirm } => send(client, &file, confirm).await,
        EventCommand::Confirm { token } => confirm(client, &token).await,
    }
}

fn read_envelope(file: &Path) -> Result<Value> {
    let content = if file.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read envelope from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read envelope from {}", file.display()))?
    };

    serde_json::from_str(&content).context("Envelope is not valid JSON")
}

async fn send(client: &OrchestratorClient, file: &Path, auto_confirm: bool) -> Result<()> {
    let envelope = read_envelope(file)?;
    let body = client.send_event(&envelope).await?;

    if let Some(event_id) = body["event_id"].as_str() {
        println!("Event: {}", event_id.dimmed());
    }

    match body["status"].as_str().unwrap_or_default() {
        "pending_confirmation" => {
            let token = body["confirmation_token"]
                .as_str()
                .context("Response is missing the confirmation token")?;
            println!(
                "{} (rule: {})",
                "⏸ Confirmation required".yellow().bold(),
                body["matched_rule"].as_str().unwrap_or("-")
            );
            if let Some(reason) = body["reason"].as_str() {
                println!("  Reason: {}", reason);
            }
            if let Some(expires) = body["expires_at"].as_str() {
                println!("  Expires: {}", expires);
            }

            if auto_confirm {
                return confirm(client, token).await;
            }
            println!("  Token: {}", token);
            println!();
            println!("Run `unison event confirm {}` to proceed.", token);
            Ok(())
        }
        "denied" => {
            println!(
                "{} {}",
                "✗ Denied:".red().bold(),
                body["reason"].as_str().unwrap_or("denied by policy")
            );
            Ok(())
        }
        _ => super::print_dispatch(&body),
    }
}

async fn confirm(client: &OrchestratorClient, token: &str) -> Result<()> {
    let body = client.confirm(token).await?;
    println!("{}", "✓ Confirmation accepted".green());
    super::print_dispatch(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_envelope_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"intent": "echo", "payload": {{"message": "hi"}}}}"#).unwrap();

        let envelope = read_envelope(file.path()).unwrap();
        assert_eq!(envelope["intent"], "echo");
    }

    #[test]
    fn test_read_envelope_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "intent: echo").unwrap();
        assert!(read_envelope(file.path()).is_err());
    }

    #[tokio::test]
    async fn test_send_with_confirm_redeems_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/event")
            .with_status(200)
            .with_body(
                r#"{"status":"pending_confirmation","accepted":false,"require_confirmation":true,"event_id":"7b0c5c7e-0a39-4f53-9d43-0ad0a0b7a8f1","effect":"require_confirmation","matched_rule":"sensitive-data-requires-confirmation","confirmation_token":"tok123"}"#,
            )
            .create_async()
            .await;
        let confirm = server
            .mock("POST", "/event/confirm")
            .match_body(mockito::Matcher::Json(
                serde_json::json!({"confirmation_token": "tok123"}),
            ))
            .with_status(200)
            .with_body(r#"{"status":"dispatched","accepted":true,"outputs":{},"handled_by":"summarize.document"}"#)
            .expect(1)
            .create_async()
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"intent": "summarize.document"}}"#).unwrap();

        let client = OrchestratorClient::with_base_url(server.url()).unwrap();
        send(&client, file.path(), true).await.unwrap();
        confirm.assert_async().await;
    }
}
