// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Unison CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** server hosting, HTTP client and subcommand handlers for the `unison` binary

pub mod commands;
pub mod daemon;
