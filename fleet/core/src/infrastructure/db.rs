// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Connection Pool
//!
//! Wraps `sqlx::postgres::PgPool` in a thin `Database` newtype injected into
//! [`PostgresDocumentStore`](crate::infrastructure::repositories::PostgresDocumentStore).
//! Only used when `spec.database.url` is configured.

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::domain::config::DatabaseConfig;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self { pool })
    }

    /// `None` when no database url is configured.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Option<Self>> {
        match &config.url {
            Some(url) => Ok(Some(Self::new(url, config.max_connections).await?)),
            None => Ok(None),
        }
    }

    /// Create the document table if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                index_name TEXT NOT NULL,
                id TEXT NOT NULL,
                body JSONB NOT NULL DEFAULT '{}'::jsonb,
                PRIMARY KEY (index_name, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create documents table")?;

        info!("Document store schema ready");
        Ok(())
    }

    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }
}
