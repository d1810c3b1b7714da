// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Event Classifier
//!
//! Splits an ack batch into policy change candidates and ordinary action
//! acks. Policy ids are self-describing and are collected without a lookup;
//! every other action is resolved and grouped by its type.
//!
//! The batch is all-or-nothing: an event stamped with another agent's id or
//! an action that cannot be resolved rejects the whole batch.

use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::application::action_resolver::ActionResolver;
use crate::domain::ack::{AckError, AckEvent};
use crate::domain::action::{Action, ActionId};
use crate::domain::agent::Agent;
use crate::domain::policy::POLICY_ACTION_PREFIX;

/// Result of classifying one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedEvents {
    /// Raw `policy:` action ids in batch order, not yet parsed.
    pub policy_action_ids: Vec<String>,
    /// Resolved actions keyed by action type.
    pub action_groups: BTreeMap<String, Vec<Action>>,
}

#[derive(Clone)]
pub struct EventClassifier {
    resolver: ActionResolver,
}

impl EventClassifier {
    pub fn new(resolver: ActionResolver) -> Self {
        Self { resolver }
    }

    pub async fn classify(
        &self,
        token: &CancellationToken,
        agent: &Agent,
        events: &[AckEvent],
    ) -> Result<ClassifiedEvents, AckError> {
        let mut classified = ClassifiedEvents::default();

        for event in events {
            if !event.agent_id.is_empty() && event.agent_id != agent.id.as_str() {
                warn!(
                    agent_id = %agent.id,
                    event_agent_id = %event.agent_id,
                    action_id = %event.action_id,
                    "Ack event stamped with a different agent id"
                );
                return Err(AckError::AgentIdMismatch {
                    expected: agent.id.clone(),
                    found: event.agent_id.clone(),
                });
            }

            if event.action_id.starts_with(POLICY_ACTION_PREFIX) {
                classified.policy_action_ids.push(event.action_id.clone());
                continue;
            }

            let action = self
                .resolver
                .resolve(token, &ActionId::new(event.action_id.as_str()))
                .await?;

            classified
                .action_groups
                .entry(action.action_type.clone())
                .or_default()
                .push(action);
        }

        Ok(classified)
    }
}
