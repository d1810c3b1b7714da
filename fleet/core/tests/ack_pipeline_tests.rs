// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end tests for the ack pipeline against the in-memory store.
//!
//! Covers the coarse all-or-nothing batch contract:
//! - ties never write
//! - only the bound policy can advance, and by exactly one write
//! - a foreign agent id anywhere in the batch rejects it before any write
//! - cache hits never reach the store

use fleet_core::application::{
    AckService, ActionResolver, EventClassifier, PolicyReconciler, StandardAckService,
};
use fleet_core::domain::ack::{AckError, AckEvent, AckResponse};
use fleet_core::domain::action::{Action, ActionCache, ActionId};
use fleet_core::domain::agent::{Agent, AgentId, FLEET_AGENTS_INDEX};
use fleet_core::domain::policy::PolicyPosition;
use fleet_core::domain::repository::{AgentRepository, BulkOptions};
use fleet_core::infrastructure::policy_writer::BulkPolicyPositionWriter;
use fleet_core::infrastructure::repositories::InMemoryDocumentStore;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const POLICY_P: &str = "5b8e2c4d-1a3f-4e6b-9c7d-2f4a6b8c0d1e";
const POLICY_OTHER: &str = "e1d2c3b4-a596-4877-8695-a4b3c2d1e0f9";

/// Deterministic cache with lookup accounting.
#[derive(Default)]
struct FakeActionCache {
    actions: Mutex<HashMap<ActionId, Action>>,
    lookups: Mutex<usize>,
}

impl ActionCache for FakeActionCache {
    fn get(&self, id: &ActionId) -> Option<Action> {
        *self.lookups.lock() += 1;
        self.actions.lock().get(id).cloned()
    }

    fn put(&self, action: Action) {
        self.actions.lock().insert(action.id.clone(), action);
    }
}

struct Harness {
    store: Arc<InMemoryDocumentStore>,
    cache: Arc<FakeActionCache>,
    service: StandardAckService,
}

fn harness() -> Harness {
    let store = Arc::new(InMemoryDocumentStore::new());
    let cache = Arc::new(FakeActionCache::default());
    let classifier = EventClassifier::new(ActionResolver::new(cache.clone(), store.clone()));
    let reconciler = PolicyReconciler::new(Arc::new(BulkPolicyPositionWriter::new(store.clone())));
    Harness {
        store,
        cache,
        service: StandardAckService::new(classifier, reconciler),
    }
}

fn ack(action_id: impl Into<String>) -> AckEvent {
    AckEvent {
        event_type: "ACTION_RESULT".to_string(),
        subtype: "ACKNOWLEDGED".to_string(),
        action_id: action_id.into(),
        ..Default::default()
    }
}

fn ack_from(agent_id: &str, action_id: impl Into<String>) -> AckEvent {
    AckEvent {
        agent_id: agent_id.to_string(),
        ..ack(action_id)
    }
}

fn body(events: &[AckEvent]) -> Vec<u8> {
    serde_json::to_vec(&json!({ "events": events })).unwrap()
}

#[tokio::test]
async fn test_scenario_a_tie_does_not_write() {
    let h = harness();
    let agent = Agent::new("A1", POLICY_P, 1, 0);
    h.store.insert_agent(&agent).unwrap();

    let response = h
        .service
        .handle_acks(
            &CancellationToken::new(),
            &agent,
            &body(&[ack(format!("policy:{POLICY_P}:1:0"))]),
        )
        .await
        .unwrap();

    assert_eq!(response, AckResponse::acks());
    assert_eq!(h.store.bulk_count(), 0);
}

#[tokio::test]
async fn test_scenario_b_single_write_ignores_other_policy() {
    let h = harness();
    let agent = Agent::new("A1", POLICY_P, 1, 0);
    h.store.insert_agent(&agent).unwrap();

    let events = [
        ack(format!("policy:{POLICY_P}:2:0")),
        ack(format!("policy:{POLICY_OTHER}:9:9")),
    ];

    let response = h
        .service
        .handle_acks(&CancellationToken::new(), &agent, &body(&events))
        .await
        .unwrap();
    assert_eq!(response, AckResponse::acks());

    let history = h.store.bulk_history();
    assert_eq!(history.len(), 1);
    let (ops, options) = &history[0];
    assert_eq!(*options, BulkOptions { refresh: true });
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].id, "A1");
    assert_eq!(ops[0].index, FLEET_AGENTS_INDEX);
    assert_eq!(ops[0].body["doc"]["policy_revision_idx"], 2);
    assert_eq!(ops[0].body["doc"]["policy_coordinator_idx"], 0);

    let updated_at = ops[0].body["doc"]["updated_at"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(updated_at).is_ok());
    assert!(updated_at.ends_with('Z'));

    // The write is visible to the next read.
    let stored = h.store.find_by_id(&AgentId::new("A1")).await.unwrap();
    assert_eq!(stored.policy_position(), PolicyPosition::new(2, 0));
    assert_eq!(stored.policy_id, POLICY_P);
    assert!(stored.updated_at.is_some());
}

#[tokio::test]
async fn test_scenario_c_agent_mismatch_rejects_batch() {
    let h = harness();
    let agent = Agent::new("A1", POLICY_P, 1, 0);
    h.store.insert_agent(&agent).unwrap();

    let events = [
        ack_from("A1", format!("policy:{POLICY_P}:5:0")),
        ack_from("A2", format!("policy:{POLICY_P}:6:0")),
    ];

    let err = h
        .service
        .handle_acks(&CancellationToken::new(), &agent, &body(&events))
        .await
        .unwrap_err();

    assert!(matches!(err, AckError::AgentIdMismatch { .. }));
    assert!(!err.is_cancelled());
    assert_eq!(h.store.bulk_count(), 0);
    let stored = h.store.find_by_id(&AgentId::new("A1")).await.unwrap();
    assert_eq!(stored.policy_position(), PolicyPosition::new(1, 0));
}

#[tokio::test]
async fn test_cache_hit_never_reads_store() {
    let h = harness();
    let agent = Agent::new("A1", POLICY_P, 1, 0);
    h.cache.put(Action::new("upgrade-1", "UPGRADE"));

    let outcome = h
        .service
        .handle_events(&CancellationToken::new(), &agent, &[ack("upgrade-1")])
        .await
        .unwrap();

    assert_eq!(outcome.action_groups["UPGRADE"].len(), 1);
    assert_eq!(outcome.policy_update, None);
    assert_eq!(*h.cache.lookups.lock(), 1);
    assert_eq!(h.store.read_count(), 0);
}

#[tokio::test]
async fn test_cache_miss_reads_store_exactly_once_per_event() {
    let h = harness();
    let agent = Agent::new("A1", POLICY_P, 1, 0);
    h.store.insert_action(&Action::new("unenroll-1", "UNENROLL")).unwrap();

    let outcome = h
        .service
        .handle_events(&CancellationToken::new(), &agent, &[ack("unenroll-1")])
        .await
        .unwrap();

    assert_eq!(outcome.action_groups["UNENROLL"][0].id.as_str(), "unenroll-1");
    assert_eq!(h.store.read_count(), 1);
}

#[tokio::test]
async fn test_maximal_candidate_wins_over_batch() {
    let h = harness();
    let agent = Agent::new("A1", POLICY_P, 3, 1);
    h.store.insert_agent(&agent).unwrap();

    let events = [
        ack(format!("policy:{POLICY_P}:3:0")),
        ack(format!("policy:{POLICY_P}:3:5")),
        ack(format!("policy:{POLICY_P}:2:9")),
    ];

    let outcome = h
        .service
        .handle_events(&CancellationToken::new(), &agent, &events)
        .await
        .unwrap();

    assert_eq!(outcome.policy_update, Some(PolicyPosition::new(3, 5)));
    assert_eq!(h.store.bulk_count(), 1);
}

#[tokio::test]
async fn test_write_to_unknown_agent_document_fails() {
    let h = harness();
    // Agent handed in by the caller but never persisted.
    let agent = Agent::new("ghost", POLICY_P, 0, 0);

    let err = h
        .service
        .handle_events(
            &CancellationToken::new(),
            &agent,
            &[ack(format!("policy:{POLICY_P}:1:0"))],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AckError::Store(_)));
}

#[tokio::test]
async fn test_cancelled_request_is_not_an_error_condition() {
    let h = harness();
    let agent = Agent::new("A1", POLICY_P, 1, 0);
    h.store.insert_agent(&agent).unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let err = h
        .service
        .handle_events(&token, &agent, &[ack(format!("policy:{POLICY_P}:2:0"))])
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    let stored = h.store.find_by_id(&AgentId::new("A1")).await.unwrap();
    assert_eq!(stored.policy_position(), PolicyPosition::new(1, 0));
}

#[tokio::test]
async fn test_null_agent_id_skips_integrity_check() {
    let h = harness();
    let agent = Agent::new("A1", POLICY_P, 1, 0);
    h.store.insert_agent(&agent).unwrap();

    let raw = json!({
        "events": [{ "action_id": format!("policy:{POLICY_P}:2:0"), "agent_id": null, "timestamp": null }]
    });
    let response = h
        .service
        .handle_acks(&CancellationToken::new(), &agent, raw.to_string().as_bytes())
        .await
        .unwrap();

    assert_eq!(response, AckResponse::acks());
    let stored = h.store.find_by_id(&AgentId::new("A1")).await.unwrap();
    assert_eq!(stored.policy_position(), PolicyPosition::new(2, 0));
}

#[tokio::test]
async fn test_null_events_is_an_empty_batch() {
    let h = harness();
    let agent = Agent::new("A1", POLICY_P, 1, 0);
    h.store.insert_agent(&agent).unwrap();

    let response = h
        .service
        .handle_acks(&CancellationToken::new(), &agent, br#"{"events":null}"#)
        .await
        .unwrap();

    assert_eq!(response, AckResponse::acks());
    assert_eq!(h.store.bulk_count(), 0);
}
