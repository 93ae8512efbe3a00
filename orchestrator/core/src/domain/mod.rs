// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! Envelope, policy, ticket, skill and configuration types.

pub mod confirmation;
pub mod envelope;
pub mod events;
pub mod health;
pub mod orchestrator_config;
pub mod policy;
pub mod skill;
