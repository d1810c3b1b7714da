// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Ack Use Case
//!
//! Application service handling one ack request from an enrolled agent.
//!
//! # Flow
//!
//! 1. Decode the raw body into an `AckRequest`
//! 2. Classify events (agent id check, policy ids vs. resolved actions)
//! 3. Reconcile policy change acks into the agent's applied position
//! 4. Return the fixed `{"action":"acks"}` response
//!
//! Each stage short-circuits on the first error; nothing after a failed
//! stage runs. Upgrade and unenroll acks are grouped but not acted on.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::application::event_classifier::EventClassifier;
use crate::application::policy_reconciler::PolicyReconciler;
use crate::domain::ack::{AckError, AckEvent, AckRequest, AckResponse};
use crate::domain::action::{Action, ACTION_TYPE_UNENROLL, ACTION_TYPE_UPGRADE};
use crate::domain::agent::Agent;
use crate::domain::policy::PolicyPosition;

/// What a successfully processed batch did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AckOutcome {
    /// Position written for the agent, if it advanced.
    pub policy_update: Option<PolicyPosition>,
    /// Resolved non-policy actions keyed by type.
    pub action_groups: BTreeMap<String, Vec<Action>>,
}

#[async_trait]
pub trait AckService: Send + Sync {
    /// Handle a raw ack request body for an already-authenticated agent.
    async fn handle_acks(&self, token: &CancellationToken, agent: &Agent, raw: &[u8]) -> Result<AckResponse, AckError>;

    /// Handle decoded ack events.
    async fn handle_events(&self, token: &CancellationToken, agent: &Agent, events: &[AckEvent]) -> Result<AckOutcome, AckError>;
}

pub struct StandardAckService {
    classifier: EventClassifier,
    reconciler: PolicyReconciler,
}

impl StandardAckService {
    pub fn new(classifier: EventClassifier, reconciler: PolicyReconciler) -> Self {
        Self { classifier, reconciler }
    }
}

#[async_trait]
impl AckService for StandardAckService {
    async fn handle_acks(&self, token: &CancellationToken, agent: &Agent, raw: &[u8]) -> Result<AckResponse, AckError> {
        let request: AckRequest = serde_json::from_slice(raw)?;

        trace!(agent_id = %agent.id, raw = %String::from_utf8_lossy(raw), "Ack request");

        self.handle_events(token, agent, &request.events).await?;

        metrics::counter!("fleet_acks_total").increment(request.events.len() as u64);
        Ok(AckResponse::acks())
    }

    async fn handle_events(&self, token: &CancellationToken, agent: &Agent, events: &[AckEvent]) -> Result<AckOutcome, AckError> {
        let classified = self.classifier.classify(token, agent, events).await?;

        let policy_update = if classified.policy_action_ids.is_empty() {
            None
        } else {
            self.reconciler
                .reconcile(token, agent, &classified.policy_action_ids)
                .await?
        };

        for action_type in [ACTION_TYPE_UPGRADE, ACTION_TYPE_UNENROLL] {
            if let Some(actions) = classified.action_groups.get(action_type) {
                debug!(
                    agent_id = %agent.id,
                    action_type,
                    count = actions.len(),
                    "Acked actions of this type are not acted on"
                );
            }
        }

        Ok(AckOutcome {
            policy_update,
            action_groups: classified.action_groups,
        })
    }
}
