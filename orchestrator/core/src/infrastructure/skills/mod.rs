// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod acknowledge;
pub mod echo;
pub mod registry;
pub mod remote;

pub use acknowledge::AcknowledgeSkill;
pub use echo::EchoSkill;
pub use registry::{RegistryError, SkillRegistry};
pub use remote::RemoteSkill;
