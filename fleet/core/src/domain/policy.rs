// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Policy Change Actions
//!
//! Policy change actions are never stored. Their identifier carries everything
//! needed to reconcile them:
//!
//! ```text
//! policy:<policy uuid>:<revision idx>:<coordinator idx>
//! ```
//!
//! [`PolicyActionId::parse`] is total: anything that does not match the
//! grammar is simply "not a policy action" and yields `None`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Literal tag in the first segment of a policy action id.
pub const POLICY_ACTION_TAG: &str = "policy";

/// Prefix used to route ack events to the reconciler without a lookup.
pub const POLICY_ACTION_PREFIX: &str = "policy:";

/// A `(revision, coordinator)` pair identifying an applied policy version.
///
/// Ordering is lexicographic: revision first, then coordinator. A position
/// only advances when the candidate compares strictly greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyPosition {
    pub revision_idx: i64,
    pub coordinator_idx: i64,
}

impl PolicyPosition {
    pub fn new(revision_idx: i64, coordinator_idx: i64) -> Self {
        Self { revision_idx, coordinator_idx }
    }

    /// True when `self` strictly beats `incumbent`. Ties never win.
    pub fn beats(&self, incumbent: &PolicyPosition) -> bool {
        self > incumbent
    }
}

impl fmt::Display for PolicyPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.revision_idx, self.coordinator_idx)
    }
}

/// Parsed form of a policy change action id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyActionId {
    /// The policy id segment exactly as it appeared in the identifier.
    pub policy_id: String,
    pub revision_idx: i64,
    pub coordinator_idx: i64,
}

impl PolicyActionId {
    pub fn parse(action_id: &str) -> Option<Self> {
        let segments: Vec<&str> = action_id.split(':').collect();
        let [tag, policy_id, revision, coordinator] = segments.as_slice() else {
            return None;
        };

        if *tag != POLICY_ACTION_TAG {
            return None;
        }
        Uuid::parse_str(policy_id).ok()?;

        Some(Self {
            policy_id: (*policy_id).to_string(),
            revision_idx: revision.parse().ok()?,
            coordinator_idx: coordinator.parse().ok()?,
        })
    }

    pub fn position(&self) -> PolicyPosition {
        PolicyPosition::new(self.revision_idx, self.coordinator_idx)
    }
}

impl fmt::Display for PolicyActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            POLICY_ACTION_TAG, self.policy_id, self.revision_idx, self.coordinator_idx
        )
    }
}
