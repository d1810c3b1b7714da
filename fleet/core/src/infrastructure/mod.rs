// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod action_cache;
pub mod db;
pub mod policy_writer;
pub mod repositories;
