// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::policy::PolicyPosition;

/// Index holding one document per enrolled agent.
pub const FLEET_AGENTS_INDEX: &str = ".fleet-agents";

pub const FIELD_POLICY_REVISION_IDX: &str = "policy_revision_idx";
pub const FIELD_POLICY_COORDINATOR_IDX: &str = "policy_coordinator_idx";
pub const FIELD_UPDATED_AT: &str = "updated_at";

/// Opaque agent identifier, the document id in [`FLEET_AGENTS_INDEX`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An enrolled agent as seen by the ack pipeline.
///
/// Only the fields the pipeline reads are modelled; the rest of the stored
/// document is left untouched by partial updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: AgentId,
    pub active: bool,
    /// Policy the agent is currently bound to.
    pub policy_id: String,
    pub policy_revision_idx: i64,
    pub policy_coordinator_idx: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Stored body of an agent document (the id lives outside the body).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AgentSource {
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    policy_id: String,
    #[serde(default)]
    policy_revision_idx: i64,
    #[serde(default)]
    policy_coordinator_idx: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Agent {
    pub fn new(id: impl Into<String>, policy_id: impl Into<String>, revision_idx: i64, coordinator_idx: i64) -> Self {
        Self {
            id: AgentId::new(id),
            active: true,
            policy_id: policy_id.into(),
            policy_revision_idx: revision_idx,
            policy_coordinator_idx: coordinator_idx,
            updated_at: None,
        }
    }

    /// The last-applied policy position recorded for this agent.
    pub fn policy_position(&self) -> PolicyPosition {
        PolicyPosition::new(self.policy_revision_idx, self.policy_coordinator_idx)
    }

    pub fn from_document(id: AgentId, body: serde_json::Value) -> Result<Self, serde_json::Error> {
        let source: AgentSource = serde_json::from_value(body)?;
        Ok(Self {
            id,
            active: source.active,
            policy_id: source.policy_id,
            policy_revision_idx: source.policy_revision_idx,
            policy_coordinator_idx: source.policy_coordinator_idx,
            updated_at: source.updated_at,
        })
    }

    pub fn to_document(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(AgentSource {
            active: self.active,
            policy_id: self.policy_id.clone(),
            policy_revision_idx: self.policy_revision_idx,
            policy_coordinator_idx: self.policy_coordinator_idx,
            updated_at: self.updated_at,
        })
    }
}
