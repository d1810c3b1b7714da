// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Action Resolver
//!
//! Resolves an acknowledged action id to its record: the process-wide
//! [`ActionCache`] first, then exactly one point read against the store.
//! Never mutates either source and never retries.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::cancellable;
use crate::domain::ack::AckError;
use crate::domain::action::{Action, ActionCache, ActionId};
use crate::domain::repository::{ActionRepository, RepositoryError};

#[derive(Clone)]
pub struct ActionResolver {
    cache: Arc<dyn ActionCache>,
    repository: Arc<dyn ActionRepository>,
}

impl ActionResolver {
    pub fn new(cache: Arc<dyn ActionCache>, repository: Arc<dyn ActionRepository>) -> Self {
        Self { cache, repository }
    }

    pub async fn resolve(&self, token: &CancellationToken, id: &ActionId) -> Result<Action, AckError> {
        if let Some(action) = self.cache.get(id) {
            metrics::counter!("fleet_action_cache_hits_total").increment(1);
            return Ok(action);
        }

        metrics::counter!("fleet_action_cache_misses_total").increment(1);
        debug!(action_id = %id, "Action cache miss, reading from store");

        match cancellable(token, self.repository.find_by_id(id)).await {
            Ok(action) => Ok(action),
            Err(RepositoryError::NotFound(_)) => Err(AckError::ActionNotFound(id.clone())),
            Err(e) => Err(e.into()),
        }
    }
}
