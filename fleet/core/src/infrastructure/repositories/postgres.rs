// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Document Store
//!
//! Production store backed by a single JSONB table:
//!
//! ```sql
//! documents (index_name TEXT, id TEXT, body JSONB, PRIMARY KEY (index_name, id))
//! ```
//!
//! Partial updates merge the `doc` object into `body` with `||`. All ops of
//! one `m_update` call run in one transaction; the commit happens before the
//! call returns, which is what a refresh request asks for.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::Row;
use tracing::debug;

use crate::domain::action::{Action, ActionId, AGENT_ACTION_SAVED_OBJECT_TYPE};
use crate::domain::agent::{Agent, AgentId, FLEET_AGENTS_INDEX};
use crate::domain::repository::{
    ActionRepository, AgentRepository, BulkOp, BulkOptions, Bulker, RepositoryError,
};
use crate::infrastructure::repositories::update_doc;

#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn read(&self, index: &str, id: &str) -> Result<serde_json::Value, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT body
            FROM documents
            WHERE index_name = $1 AND id = $2
            "#,
        )
        .bind(index)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Err(RepositoryError::NotFound(format!("{index}/{id}")));
        };

        let Json(body): Json<serde_json::Value> = row.try_get("body")?;
        Ok(body)
    }
}

#[async_trait]
impl AgentRepository for PostgresDocumentStore {
    async fn find_by_id(&self, id: &AgentId) -> Result<Agent, RepositoryError> {
        let body = self.read(FLEET_AGENTS_INDEX, id.as_str()).await?;
        Agent::from_document(id.clone(), body)
            .map_err(|e| RepositoryError::Serialization(format!("Failed to deserialize agent {}: {}", id, e)))
    }
}

#[async_trait]
impl ActionRepository for PostgresDocumentStore {
    async fn find_by_id(&self, id: &ActionId) -> Result<Action, RepositoryError> {
        let body = self.read(AGENT_ACTION_SAVED_OBJECT_TYPE, id.as_str()).await?;
        Action::from_document(id.clone(), body)
            .map_err(|e| RepositoryError::Serialization(format!("Failed to deserialize action {}: {}", id, e)))
    }
}

#[async_trait]
impl Bulker for PostgresDocumentStore {
    async fn m_update(&self, ops: Vec<BulkOp>, options: BulkOptions) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for op in &ops {
            let doc = update_doc(op)?;
            let result = sqlx::query(
                r#"
                UPDATE documents
                SET body = body || $3
                WHERE index_name = $1 AND id = $2
                "#,
            )
            .bind(&op.index)
            .bind(&op.id)
            .bind(Json(doc))
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to update {}/{}: {}", op.index, op.id, e)))?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound(format!("{}/{}", op.index, op.id)));
            }
        }

        tx.commit().await?;
        debug!(ops = ops.len(), refresh = options.refresh, "Bulk update committed");
        Ok(())
    }
}
