// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer
//!
//! HTTP surface that translates agent requests into application service
//! calls. **No business logic lives here**; all real work is delegated to
//! `crate::application`.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `POST /api/fleet/agents/{id}/acks` | Ack batch from an enrolled agent |
//! | `GET /health` | Liveness |

pub mod api;
