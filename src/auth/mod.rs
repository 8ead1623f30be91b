// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session handling for the marketplace gateway.
//!
//! ## Auth Flow
//!
//! 1. The browser obtains a Google credential and posts it to `/auth/google`
//! 2. The [`AuthBridge`] exchanges it with the backend for a session token
//! 3. The token is stored in the http-only `session_token` cookie
//! 4. On every request:
//!    - The edge gate verifies the token (HS256, shared secret) for
//!      protected paths and redirects to login on failure
//!    - The [`Session`] extractor hands the verified token to handlers,
//!      which forward it to the backend as a bearer credential
//!
//! ## Security
//!
//! - The cookie is http-only, `SameSite=Lax`, and `Secure` in production
//! - Expiry is enforced with zero leeway
//! - The backend re-validates every bearer token it receives

pub mod bridge;
pub mod claims;
pub mod cookie;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod verifier;

pub use bridge::{AuthBridge, ExchangeError, IssuedSession};
pub use claims::{Session, SessionClaims, SessionInfo};
pub use cookie::SessionCookies;
pub use error::AuthError;
pub use extractor::OptionalSession;
pub use gate::{edge_gate, GateConfig, GateDecision};
pub use verifier::TokenVerifier;
