// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod event_bus;
pub mod health;
pub mod policy_store;
pub mod skills;
pub mod ticket_store;

pub use event_bus::EventBus;
pub use health::HttpHealthProbe;
pub use policy_store::PolicyStore;
pub use skills::SkillRegistry;
pub use ticket_store::{spawn_sweeper, InMemoryTicketStore};
