// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth bridge: turns a third-party credential into a backend session.
//!
//! The bridge is the only component that writes the session cookie. It
//! borrows the backend client, verifier and cookie policy from
//! [`AppState`](crate::state::AppState) for the duration of one request.

use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use super::{claims::SessionClaims, cookie::SessionCookies, verifier::TokenVerifier};
use crate::{backend::BackendClient, models::UserProfile};

/// Why a credential exchange failed.
///
/// Messages are deliberately generic; the backend's reason is only logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("Backend verification failed")]
    Rejected,
    #[error("Internal Server Error")]
    Internal,
}

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    /// Decoded claims, when the token verifies with the shared secret.
    pub claims: Option<SessionClaims>,
}

impl IssuedSession {
    /// Tokens that do not say otherwise are sent through onboarding.
    pub fn onboarding_required(&self) -> bool {
        self.claims
            .as_ref()
            .is_none_or(SessionClaims::onboarding_required)
    }
}

#[derive(Clone, Copy)]
pub struct AuthBridge<'a> {
    backend: &'a BackendClient,
    verifier: &'a TokenVerifier,
    cookies: &'a SessionCookies,
}

impl<'a> AuthBridge<'a> {
    pub fn new(
        backend: &'a BackendClient,
        verifier: &'a TokenVerifier,
        cookies: &'a SessionCookies,
    ) -> Self {
        Self {
            backend,
            verifier,
            cookies,
        }
    }

    /// Exchange a Google credential for a backend session token.
    ///
    /// On success the token is stored in the returned jar. On failure the
    /// caller's jar is dropped untouched, so no cookie is written.
    pub async fn exchange_credential(
        &self,
        jar: CookieJar,
        credential: &str,
    ) -> Result<(CookieJar, IssuedSession), ExchangeError> {
        let response = match self.backend.exchange_google_credential(credential).await {
            Ok(response) => response,
            Err(e) if e.status().is_some() => {
                warn!(error = %e, "Backend rejected credential");
                return Err(ExchangeError::Rejected);
            }
            Err(e) => {
                warn!(error = %e, "Credential exchange failed");
                return Err(ExchangeError::Internal);
            }
        };

        let token = response.access_token;
        let claims = match self.verifier.verify(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                warn!(reason = e.error_code(), "Issued token does not verify locally");
                None
            }
        };

        let jar = self.cookies.set_token(jar, token.clone());
        Ok((jar, IssuedSession { token, claims }))
    }

    /// Drop the session cookie. Always succeeds.
    pub fn invalidate_session(&self, jar: CookieJar) -> CookieJar {
        self.cookies.clear_token(jar)
    }

    /// Overwrite the stored token with a reissued one.
    pub fn reissue_token(&self, jar: CookieJar, token: impl Into<String>) -> CookieJar {
        self.cookies.set_token(jar, token)
    }

    /// Current user for `token`, or `None`.
    ///
    /// Makes no network call without a token. Never cached. Backend failures
    /// are logged and read as "no user".
    pub async fn fetch_current_user(&self, token: Option<&str>) -> Option<UserProfile> {
        let token = token?;
        match self.backend.current_user(token).await {
            Ok(user) => Some(user),
            Err(e) if e.status().is_some() => {
                debug!(error = %e, "No current user for session");
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch current user");
                None
            }
        }
    }
}
