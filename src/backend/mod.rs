// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Marketplace Backend
//!
//! Every durable operation lives behind the external marketplace API. This
//! module owns the HTTP client and the error taxonomy for those calls.
//! Callers decide whether a failure degrades (reads) or surfaces (writes).

pub mod client;
pub mod error;

pub use client::BackendClient;
pub use error::{alert_title, BackendError, ErrorDetail};
