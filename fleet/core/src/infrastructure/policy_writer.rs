// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::domain::agent::{AgentId, FIELD_POLICY_COORDINATOR_IDX, FIELD_POLICY_REVISION_IDX, FIELD_UPDATED_AT, FLEET_AGENTS_INDEX};
use crate::domain::policy::PolicyPosition;
use crate::domain::repository::{BulkOp, BulkOptions, Bulker, PolicyPositionWriter, RepositoryError};

/// Writes the agent's policy position as one partial update with refresh.
///
/// Last write wins: no version is checked, so concurrent batches for the
/// same agent can move the position in either direction.
pub struct BulkPolicyPositionWriter {
    bulker: Arc<dyn Bulker>,
}

impl BulkPolicyPositionWriter {
    pub fn new(bulker: Arc<dyn Bulker>) -> Self {
        Self { bulker }
    }

    pub fn update_op(agent_id: &AgentId, position: PolicyPosition, updated_at: DateTime<Utc>) -> BulkOp {
        BulkOp {
            id: agent_id.to_string(),
            index: FLEET_AGENTS_INDEX.to_string(),
            body: json!({
                "doc": {
                    FIELD_POLICY_REVISION_IDX: position.revision_idx,
                    FIELD_POLICY_COORDINATOR_IDX: position.coordinator_idx,
                    FIELD_UPDATED_AT: updated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                }
            }),
        }
    }
}

#[async_trait]
impl PolicyPositionWriter for BulkPolicyPositionWriter {
    async fn write_position(
        &self,
        agent_id: &AgentId,
        position: PolicyPosition,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let ops = vec![Self::update_op(agent_id, position, updated_at)];
        self.bulker.m_update(ops, BulkOptions::with_refresh()).await
    }
}
