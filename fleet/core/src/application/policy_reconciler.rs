// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Policy Reconciler
//!
//! Decides whether an agent's applied-policy position advances after it acks
//! one or more policy change actions in a single batch.
//!
//! ## Winner selection
//!
//! 1. Start from the agent's recorded `(revision, coordinator)` position.
//! 2. Ignore ids that do not parse and ids for a policy the agent is not
//!    bound to.
//! 3. Keep the maximal position over the whole batch; a candidate must
//!    compare strictly greater to replace the current winner.
//!
//! When a winner exists a single write is issued through the
//! [`PolicyPositionWriter`]. No version token is read first, so two
//! concurrent batches for the same agent race and the last write lands.

use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::cancellable;
use crate::domain::ack::AckError;
use crate::domain::agent::Agent;
use crate::domain::policy::{PolicyActionId, PolicyPosition};
use crate::domain::repository::PolicyPositionWriter;

#[derive(Clone)]
pub struct PolicyReconciler {
    writer: Arc<dyn PolicyPositionWriter>,
}

impl PolicyReconciler {
    pub fn new(writer: Arc<dyn PolicyPositionWriter>) -> Self {
        Self { writer }
    }

    /// Maximal eligible position strictly ahead of the agent's, if any.
    pub fn select_winner<S: AsRef<str>>(agent: &Agent, policy_action_ids: &[S]) -> Option<PolicyPosition> {
        let mut winner = agent.policy_position();
        let mut found = false;

        for raw in policy_action_ids {
            let Some(candidate) = PolicyActionId::parse(raw.as_ref()) else {
                debug!(action_id = raw.as_ref(), "Ignoring unparseable policy action id");
                continue;
            };

            if candidate.policy_id != agent.policy_id {
                debug!(
                    agent_id = %agent.id,
                    policy_id = %candidate.policy_id,
                    "Ignoring policy ack for a policy the agent is not bound to"
                );
                continue;
            }

            let position = candidate.position();
            if position.beats(&winner) {
                winner = position;
                found = true;
            }
        }

        found.then_some(winner)
    }

    /// Returns the position written, or `None` when nothing advanced.
    pub async fn reconcile<S: AsRef<str>>(
        &self,
        token: &CancellationToken,
        agent: &Agent,
        policy_action_ids: &[S],
    ) -> Result<Option<PolicyPosition>, AckError> {
        let Some(winner) = Self::select_winner(agent, policy_action_ids) else {
            return Ok(None);
        };

        cancellable(token, self.writer.write_position(&agent.id, winner, Utc::now())).await?;

        metrics::counter!("fleet_policy_updates_total").increment(1);
        info!(
            agent_id = %agent.id,
            policy_id = %agent.policy_id,
            rev = winner.revision_idx,
            coord = winner.coordinator_idx,
            "Agent policy position advanced"
        );

        Ok(Some(winner))
    }
}
