// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod action_resolver;
pub mod event_classifier;
pub mod policy_reconciler;
pub mod ack_service;

pub use ack_service::{AckOutcome, AckService, StandardAckService};
pub use action_resolver::ActionResolver;
pub use event_classifier::{ClassifiedEvents, EventClassifier};
pub use policy_reconciler::PolicyReconciler;

use crate::domain::repository::RepositoryError;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Race a store call against request cancellation.
pub(crate) async fn cancellable<T, F>(token: &CancellationToken, call: F) -> Result<T, RepositoryError>
where
    F: Future<Output = Result<T, RepositoryError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(RepositoryError::Cancelled),
        result = call => result,
    }
}
