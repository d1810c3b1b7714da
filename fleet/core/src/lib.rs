// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Fleet Server Core
//!
//! Agent acknowledgment handling and applied-policy reconciliation.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Ingest ack batches from enrolled agents and advance their
//!   recorded policy position

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
