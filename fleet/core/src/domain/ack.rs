// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::domain::action::ActionId;
use crate::domain::agent::AgentId;
use crate::domain::repository::RepositoryError;

/// Body of `POST /api/fleet/agents/{id}/acks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AckRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<AckEvent>,
}

/// One acknowledgment reported by an agent. Unknown fields are ignored.
///
/// Missing and `null` string fields both decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AckEvent {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub event_type: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub subtype: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub action_id: String,

    /// Empty when the agent did not stamp the event.
    #[serde(default, deserialize_with = "null_as_default")]
    pub agent_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
impl AckEvent {
    pub(crate) fn new(action_id: impl Into<String>) -> Self {
        Self {
            event_type: "ACTION_RESULT".to_string(),
            subtype: "ACKNOWLEDGED".to_string(),
            action_id: action_id.into(),
            ..Default::default()
        }
    }

    pub(crate) fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponse {
    pub action: String,
}

impl AckResponse {
    pub fn acks() -> Self {
        Self { action: "acks".to_string() }
    }
}

/// Failure of an ack batch. Any of these rejects the whole batch.
#[derive(Debug, Error)]
pub enum AckError {
    #[error("event agentId mismatch: expected {expected}, got {found}")]
    AgentIdMismatch { expected: AgentId, found: String },

    #[error("malformed ack request: {0}")]
    MalformedRequest(#[from] serde_json::Error),

    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("agent not active: {0}")]
    AgentInactive(AgentId),

    #[error("action not found: {0}")]
    ActionNotFound(ActionId),

    #[error(transparent)]
    Store(RepositoryError),

    #[error("context canceled")]
    Cancelled,
}

impl AckError {
    /// Cancellation (client gone, server shutting down) is not a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AckError::Cancelled)
    }
}

impl From<RepositoryError> for AckError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Cancelled => AckError::Cancelled,
            other => AckError::Store(other),
        }
    }
}
