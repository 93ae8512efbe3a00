// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod coordinator;
pub mod introspection;

pub use coordinator::{ConfirmOutcome, Coordinator, EventOutcome};
pub use introspection::{IntrospectionService, IntrospectionSnapshot, Readiness};
