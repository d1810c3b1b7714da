// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Document Store Implementations
//!
//! Infrastructure implementations of the store contracts defined in
//! `crate::domain::repository`.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Read agents and actions, apply partial agent updates
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **PostgresDocumentStore** - JSONB `documents` table keyed by `(index, id)`
//! - **InMemoryDocumentStore** - HashMap-backed store for development and tests,
//!   with read and bulk call counters

pub mod postgres;

pub use postgres::PostgresDocumentStore;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::action::{Action, ActionId, AGENT_ACTION_SAVED_OBJECT_TYPE};
use crate::domain::agent::{Agent, AgentId, FLEET_AGENTS_INDEX};
use crate::domain::repository::{
    ActionRepository, AgentRepository, BulkOp, BulkOptions, Bulker, RepositoryError,
};

type DocumentKey = (String, String);

/// Merge `patch` into `target` one level deep, the way a partial doc update does.
pub(crate) fn merge_partial(target: &mut serde_json::Value, patch: &serde_json::Value) -> Result<(), RepositoryError> {
    let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) else {
        return Err(RepositoryError::Serialization("partial update requires JSON objects".to_string()));
    };
    for (field, value) in patch {
        target.insert(field.clone(), value.clone());
    }
    Ok(())
}

/// Extract the `doc` member of an update body.
pub(crate) fn update_doc(op: &BulkOp) -> Result<&serde_json::Value, RepositoryError> {
    op.body
        .get("doc")
        .filter(|doc| doc.is_object())
        .ok_or_else(|| RepositoryError::Serialization(format!("update for {}/{} has no doc object", op.index, op.id)))
}

#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<DocumentKey, serde_json::Value>>>,
    reads: Arc<AtomicUsize>,
    bulk_calls: Arc<RwLock<Vec<(Vec<BulkOp>, BulkOptions)>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_document(&self, index: &str, id: &str, body: serde_json::Value) {
        self.documents
            .write()
            .insert((index.to_string(), id.to_string()), body);
    }

    pub fn document(&self, index: &str, id: &str) -> Option<serde_json::Value> {
        self.documents
            .read()
            .get(&(index.to_string(), id.to_string()))
            .cloned()
    }

    pub fn insert_agent(&self, agent: &Agent) -> Result<(), RepositoryError> {
        self.insert_document(FLEET_AGENTS_INDEX, agent.id.as_str(), agent.to_document()?);
        Ok(())
    }

    pub fn insert_action(&self, action: &Action) -> Result<(), RepositoryError> {
        self.insert_document(AGENT_ACTION_SAVED_OBJECT_TYPE, action.id.as_str(), serde_json::to_value(action)?);
        Ok(())
    }

    /// Point reads served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// `m_update` calls served so far, successful or not.
    pub fn bulk_count(&self) -> usize {
        self.bulk_calls.read().len()
    }

    pub fn bulk_history(&self) -> Vec<(Vec<BulkOp>, BulkOptions)> {
        self.bulk_calls.read().clone()
    }

    fn read(&self, index: &str, id: &str) -> Result<serde_json::Value, RepositoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.document(index, id)
            .ok_or_else(|| RepositoryError::NotFound(format!("{index}/{id}")))
    }
}

#[async_trait]
impl AgentRepository for InMemoryDocumentStore {
    async fn find_by_id(&self, id: &AgentId) -> Result<Agent, RepositoryError> {
        let body = self.read(FLEET_AGENTS_INDEX, id.as_str())?;
        Ok(Agent::from_document(id.clone(), body)?)
    }
}

#[async_trait]
impl ActionRepository for InMemoryDocumentStore {
    async fn find_by_id(&self, id: &ActionId) -> Result<Action, RepositoryError> {
        let body = self.read(AGENT_ACTION_SAVED_OBJECT_TYPE, id.as_str())?;
        Ok(Action::from_document(id.clone(), body)?)
    }
}

#[async_trait]
impl Bulker for InMemoryDocumentStore {
    async fn m_update(&self, ops: Vec<BulkOp>, options: BulkOptions) -> Result<(), RepositoryError> {
        self.bulk_calls.write().push((ops.clone(), options));

        // Validate everything first so a failing op leaves no partial commit.
        let mut documents = self.documents.write();
        for op in &ops {
            update_doc(op)?;
            if !documents.contains_key(&(op.index.clone(), op.id.clone())) {
                return Err(RepositoryError::NotFound(format!("{}/{}", op.index, op.id)));
            }
        }

        for op in &ops {
            let doc = update_doc(op)?;
            if let Some(target) = documents.get_mut(&(op.index.clone(), op.id.clone())) {
                merge_partial(target, doc)?;
            }
        }
        Ok(())
    }
}
