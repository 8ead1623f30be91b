// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
///
/// Returned by the session extractor for JSON endpoints. The edge gate maps
/// every variant to a login redirect instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No session cookie present
    MissingSession,
    /// Token is malformed
    MalformedToken,
    /// Token signature is invalid
    InvalidSignature,
    /// Token has expired
    TokenExpired,
    /// Token is not yet valid
    TokenNotYetValid,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingSession => "missing_session",
            AuthError::MalformedToken => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
        }
    }

    /// Every session failure is a 401; the backend never gets involved.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    /// Whether a token was present but failed verification.
    ///
    /// Such a token is stale and the cookie holding it should be dropped.
    pub fn is_verification_failure(&self) -> bool {
        *self != AuthError::MissingSession
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingSession => write!(f, "Please log in to continue"),
            AuthError::MalformedToken => write!(f, "Session token is malformed"),
            AuthError::InvalidSignature => write!(f, "Session token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Session has expired"),
            AuthError::TokenNotYetValid => write!(f, "Session token is not yet valid"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_session_returns_401() {
        let response = AuthError::MissingSession.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "missing_session");
    }

    #[tokio::test]
    async fn expired_token_returns_401_with_code() {
        let response = AuthError::TokenExpired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "token_expired");
    }

    #[test]
    fn only_present_tokens_count_as_verification_failures() {
        assert!(!AuthError::MissingSession.is_verification_failure());
        assert!(AuthError::TokenExpired.is_verification_failure());
        assert!(AuthError::InvalidSignature.is_verification_failure());
    }
}
