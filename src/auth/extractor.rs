// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the verified session.
//!
//! Use `Session` in handlers that require a signed-in user:
//!
//! ```rust,ignore
//! async fn my_handler(session: Session) -> impl IntoResponse {
//!     // session.token is forwarded to the backend as a bearer credential
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use super::{claims::Session, cookie::SessionCookies, AuthError};
use crate::state::AppState;

impl FromRequestParts<AppState> for Session {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // The edge gate already verified this request
        if let Some(session) = parts.extensions.get::<Session>().cloned() {
            return Ok(session);
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let token = SessionCookies::read_token(&jar).ok_or(AuthError::MissingSession)?;
        let claims = state.verifier.verify(&token)?;

        Ok(Session { token, claims })
    }
}

/// Optional session extractor.
///
/// Returns `None` if no valid session is present, instead of rejecting.
/// Used by public reads that attach the bearer token when one exists.
pub struct OptionalSession(pub Option<Session>);

impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalSession(
            Session::from_request_parts(parts, state).await.ok(),
        ))
    }
}
