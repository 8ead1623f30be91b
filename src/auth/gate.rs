// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Edge gate: per-request session check in front of protected routes.
//!
//! The gate is stateless. For every request whose path falls under a
//! protected prefix it reads the session cookie and verifies the token
//! signature locally. Anything short of a valid, unexpired token is
//! redirected to the login page. The backend still authorizes every API
//! call on its own; the gate only avoids rendering protected views for
//! sessions that are obviously invalid.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/profile", get(profile))
//!     .layer(axum::middleware::from_fn_with_state(state.clone(), edge_gate));
//! ```

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use super::{claims::Session, cookie::SessionCookies, verifier::TokenVerifier, AuthError};
use crate::{config::Config, state::AppState};

/// Outcome of evaluating one request.
#[derive(Debug)]
pub enum GateDecision {
    /// Path is not protected; the gate does not look at the session.
    Bypass,
    /// Valid session; the request proceeds unchanged.
    Allowed(Session),
    /// Missing or invalid session; redirect to login.
    Denied(AuthError),
}

/// Which paths are protected and where denied requests go.
#[derive(Debug, Clone)]
pub struct GateConfig {
    protected: Vec<String>,
    login_path: String,
}

impl GateConfig {
    pub fn new(protected: Vec<String>, login_path: impl Into<String>) -> Self {
        Self {
            protected,
            login_path: login_path.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.protected_paths.clone(), config.login_path.clone())
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// A prefix matches the path itself and anything beneath it.
    ///
    /// `/profile` matches `/profile` and `/profile/edit` but not `/profiles`.
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.iter().any(|prefix| {
            prefix == "/"
                || path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Decide the fate of a request. Pure; no I/O.
    pub fn evaluate(
        &self,
        verifier: &TokenVerifier,
        path: &str,
        token: Option<&str>,
    ) -> GateDecision {
        if !self.is_protected(path) {
            return GateDecision::Bypass;
        }

        let Some(token) = token else {
            return GateDecision::Denied(AuthError::MissingSession);
        };

        match verifier.verify(token) {
            Ok(claims) => GateDecision::Allowed(Session {
                token: token.to_string(),
                claims,
            }),
            Err(e) => GateDecision::Denied(e),
        }
    }
}

/// Axum middleware applying the gate to every request.
///
/// On success the verified [`Session`] is stashed in the request extensions
/// so the session extractor does not verify twice. Denied page loads are
/// redirected to login; denied mutations get a 401 JSON body. A token that
/// fails verification is cleared from the browser either way.
pub async fn edge_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = SessionCookies::read_token(&jar);
    let path = request.uri().path().to_string();

    match state.gate.evaluate(&state.verifier, &path, token.as_deref()) {
        GateDecision::Bypass => next.run(request).await,
        GateDecision::Allowed(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        GateDecision::Denied(reason) => {
            debug!(
                path = %path,
                reason = reason.error_code(),
                "Edge gate denied request"
            );
            let denial = if is_page_load(request.method()) {
                Redirect::to(state.gate.login_path()).into_response()
            } else {
                reason.clone().into_response()
            };
            if reason.is_verification_failure() {
                (state.cookies.clear_token(jar), denial).into_response()
            } else {
                denial
            }
        }
    }
}

fn is_page_load(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mint_token, test_state, unreachable_backend, TEST_SECRET};
    use axum::{
        body::Body,
        http::{header, Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn gate() -> GateConfig {
        GateConfig::new(vec!["/profile".into()], "/login")
    }

    #[test]
    fn prefix_matching_respects_segment_boundaries() {
        let gate = gate();
        assert!(gate.is_protected("/profile"));
        assert!(gate.is_protected("/profile/settings"));
        assert!(!gate.is_protected("/profiles"));
        assert!(!gate.is_protected("/"));
        assert!(!gate.is_protected("/listings"));
    }

    #[test]
    fn unprotected_paths_bypass_the_gate() {
        let verifier = TokenVerifier::new(TEST_SECRET);
        assert!(matches!(
            gate().evaluate(&verifier, "/listings", None),
            GateDecision::Bypass
        ));
    }

    #[test]
    fn missing_token_is_denied() {
        let verifier = TokenVerifier::new(TEST_SECRET);
        assert!(matches!(
            gate().evaluate(&verifier, "/profile", None),
            GateDecision::Denied(AuthError::MissingSession)
        ));
    }

    #[test]
    fn expired_and_forged_tokens_are_denied() {
        let verifier = TokenVerifier::new(TEST_SECRET);
        let expired = mint_token("5", -60);
        assert!(matches!(
            gate().evaluate(&verifier, "/profile", Some(&expired)),
            GateDecision::Denied(AuthError::TokenExpired)
        ));
        assert!(matches!(
            gate().evaluate(&verifier, "/profile/edit", Some("abc.def.ghi")),
            GateDecision::Denied(_)
        ));
    }

    #[test]
    fn valid_token_is_allowed() {
        let verifier = TokenVerifier::new(TEST_SECRET);
        let token = mint_token("5", 600);
        match gate().evaluate(&verifier, "/profile", Some(&token)) {
            GateDecision::Allowed(session) => {
                assert_eq!(session.subject(), "5");
                assert_eq!(session.token, token);
            }
            other => panic!("expected Allowed, got {other:?}"),
        }
    }

    fn app() -> Router {
        let state = test_state(unreachable_backend());
        Router::new()
            .route(
                "/profile",
                get(|Extension(session): Extension<Session>| async move {
                    session.subject().to_string()
                })
                .patch(|| async { "patched" }),
            )
            .route("/open", get(|| async { "open" }))
            .layer(from_fn_with_state(state.clone(), edge_gate))
            .with_state(state)
    }

    #[tokio::test]
    async fn middleware_redirects_without_cookie() {
        let response = app()
            .oneshot(HttpRequest::get("/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn middleware_redirects_and_clears_invalid_cookie() {
        let response = app()
            .oneshot(
                HttpRequest::get("/profile")
                    .header(header::COOKIE, "session_token=forged.token.value")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cleared.starts_with("session_token=;"));
    }

    #[tokio::test]
    async fn middleware_passes_valid_session_through() {
        let token = mint_token("21", 600);
        let response = app()
            .oneshot(
                HttpRequest::get("/profile")
                    .header(header::COOKIE, format!("session_token={token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"21");
    }

    #[tokio::test]
    async fn denied_mutation_gets_401_instead_of_redirect() {
        let response = app()
            .oneshot(
                HttpRequest::patch("/profile")
                    .header(header::COOKIE, "session_token=forged.token.value")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::LOCATION).is_none());
        assert!(response.headers().get(header::SET_COOKIE).is_some());
    }

    #[tokio::test]
    async fn middleware_ignores_unprotected_routes() {
        let response = app()
            .oneshot(HttpRequest::get("/open").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
