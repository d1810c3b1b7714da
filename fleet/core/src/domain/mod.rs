// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Entities, value objects and persistence contracts for ack handling.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Agents, actions, policy positions and the store seams

pub mod ack;
pub mod action;
pub mod agent;
pub mod config;
pub mod policy;
pub mod repository;
