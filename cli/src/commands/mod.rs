// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the Unison CLI

pub mod config;
pub mod event;
pub mod policy;
pub mod skills;
pub mod status;

pub use self::config::ConfigCommand;
pub use self::event::EventCommand;
pub use self::policy::PolicyCommand;
pub use self::skills::SkillsCommand;

use anyhow::Result;
use colored::Colorize;
use serde_json::Value;

/// Print a dispatch result body (`/event`, `/event/confirm`, `/skills/invoke`).
pub(crate) fn print_dispatch(body: &Value) -> Result<()> {
    let handled_by = body["handled_by"].as_str().unwrap_or("-");

    if body["accepted"].as_bool().unwrap_or(false) {
        println!("{} by {}", "✓ Dispatched".green().bold(), handled_by.bold());
    } else {
        let code = body["error"]["code"].as_str().unwrap_or("failed");
        let message = body["error"]["message"].as_str().unwrap_or_default();
        println!("{} {}: {}", "✗ Failed".red().bold(), code, message);
    }

    if let Some(outputs) = body.get("outputs") {
        println!("{}", serde_json::to_string_pretty(outputs)?);
    }

    Ok(())
}
