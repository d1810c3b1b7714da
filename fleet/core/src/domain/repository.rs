// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Store Contracts
//!
//! The ack pipeline sees the document store through three narrow seams:
//!
//! | Trait | Used by | Implementations |
//! |-------|---------|-----------------|
//! | `AgentRepository` | HTTP layer (agent lookup) | `InMemoryDocumentStore`, `PostgresDocumentStore` |
//! | `ActionRepository` | `ActionResolver` on cache miss | `InMemoryDocumentStore`, `PostgresDocumentStore` |
//! | `Bulker` | `BulkPolicyPositionWriter` | `InMemoryDocumentStore`, `PostgresDocumentStore` |
//!
//! `PolicyPositionWriter` sits above `Bulker` so the reconciler's write path
//! can be swapped (e.g. for an optimistic-concurrency variant) without
//! touching the ordering logic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::action::{Action, ActionId};
use crate::domain::agent::{Agent, AgentId};
use crate::domain::policy::PolicyPosition;

#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Point read of an agent document.
    async fn find_by_id(&self, id: &AgentId) -> Result<Agent, RepositoryError>;
}

#[async_trait]
pub trait ActionRepository: Send + Sync {
    /// Point read of a persisted action. Missing actions are `NotFound`.
    async fn find_by_id(&self, id: &ActionId) -> Result<Action, RepositoryError>;
}

/// One partial document update inside a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOp {
    pub id: String,
    pub index: String,
    /// Update body, `{ "doc": { ...partial fields } }`.
    pub body: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOptions {
    /// Make the updates visible to subsequent reads before returning.
    pub refresh: bool,
}

impl BulkOptions {
    pub fn with_refresh() -> Self {
        Self { refresh: true }
    }
}

#[async_trait]
pub trait Bulker: Send + Sync {
    /// Apply every op as a partial update. Any failure fails the whole call.
    async fn m_update(&self, ops: Vec<BulkOp>, options: BulkOptions) -> Result<(), RepositoryError>;
}

/// Persists a new applied-policy position for an agent.
#[async_trait]
pub trait PolicyPositionWriter: Send + Sync {
    async fn write_position(
        &self,
        agent_id: &AgentId,
        position: PolicyPosition,
        updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("context canceled")]
    Cancelled,

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
