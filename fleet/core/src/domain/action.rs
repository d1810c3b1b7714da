// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// Saved-object type under which distributed agent actions are persisted.
pub const AGENT_ACTION_SAVED_OBJECT_TYPE: &str = "fleet-agent-actions";

pub const ACTION_TYPE_UPGRADE: &str = "UPGRADE";
pub const ACTION_TYPE_UNENROLL: &str = "UNENROLL";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unit of work distributed to one or more agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(skip)]
    pub id: ActionId,

    #[serde(rename = "type", default)]
    pub action_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    /// Type-specific payload, opaque to the ack pipeline.
    #[serde(default)]
    pub data: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
}

impl Action {
    pub fn new(id: impl Into<String>, action_type: impl Into<String>) -> Self {
        Self {
            id: ActionId::new(id),
            action_type: action_type.into(),
            agent_id: None,
            data: serde_json::Value::Null,
            created_at: None,
            expiration: None,
        }
    }

    pub fn from_document(id: ActionId, body: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut action: Action = serde_json::from_value(body)?;
        action.id = id;
        Ok(action)
    }
}

/// Process-wide cache of recently distributed actions.
///
/// Populated out-of-band by action distribution; the ack pipeline only reads.
/// An implementation may miss but must never return a value that differs from
/// the persisted one.
pub trait ActionCache: Send + Sync {
    fn get(&self, id: &ActionId) -> Option<Action>;

    fn put(&self, action: Action);
}
