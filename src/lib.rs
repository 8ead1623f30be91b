// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Campus Market Gateway - session-aware front door for the campus marketplace
//!
//! Browsers talk to this service; it talks to the marketplace backend. It owns
//! the `session_token` cookie, keeps guests out of protected pages, caches
//! public listing reads, and runs the multi-step onboarding and listing flows.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Session cookie, token verification and the edge gate
//! - `backend` - Typed client for the marketplace backend
//! - `fetchers` - Cached listing, category and profile reads
//! - `flows` - Onboarding, institution search and listing drafts
//! - `store` - Per-user in-memory flow state

pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod fetchers;
pub mod flows;
pub mod models;
pub mod state;
pub mod store;
pub mod telemetry;

#[cfg(test)]
mod test_support;
