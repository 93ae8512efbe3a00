// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! unison orchestrator core
//!
//! Event intake, policy evaluation, confirmation tickets and skill dispatch.
//!
//! # Architecture
//!
//! - `domain`: envelope, policy, ticket and skill types
//! - `application`: the coordinator and introspection services
//! - `infrastructure`: in-memory stores, skill adapters, event bus
//! - `presentation`: the axum HTTP API

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
