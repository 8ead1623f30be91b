// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session endpoints: login, logout, and the current user.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    auth::{OptionalSession, SessionCookies, SessionInfo},
    error::ApiError,
    models::UserProfile,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct GoogleLoginRequest {
    /// ID token issued by Google Identity Services.
    pub credential: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Decoded session, when the issued token verifies locally.
    pub session: Option<SessionInfo>,
    /// Whether the client should open onboarding next.
    pub onboarding_required: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentUserResponse {
    pub user: Option<UserProfile>,
    pub session: Option<SessionInfo>,
}

/// Exchange a Google credential for a session cookie.
#[utoipa::path(
    post,
    path = "/auth/google",
    tag = "Auth",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Session cookie set", body = LoginResponse),
        (status = 400, description = "Missing credential"),
        (status = 401, description = "Backend verification failed"),
        (status = 500, description = "Internal Server Error")
    )
)]
pub async fn google_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<GoogleLoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let credential = request.credential.trim();
    if credential.is_empty() {
        return Err(ApiError::bad_request("Credential is required"));
    }

    let (jar, issued) = state.bridge().exchange_credential(jar, credential).await?;

    let session = issued.claims.as_ref().map(SessionInfo::from);
    if let Some(session) = &session {
        info!(user_id = %session.user_id, "Session issued");
    }

    Ok((
        jar,
        Json(LoginResponse {
            onboarding_required: issued.onboarding_required(),
            session,
        }),
    ))
}

/// Clear the session cookie and any in-progress flows.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses(
        (status = 204, description = "Session cleared")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    if let Some(session) = session {
        state.flows.forget(session.subject());
        info!(user_id = %session.subject(), "Session cleared");
    }
    (state.bridge().invalidate_session(jar), StatusCode::NO_CONTENT)
}

/// The signed-in user, or nulls for guests. Never cached.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user, if any", body = CurrentUserResponse)
    )
)]
pub async fn current_user(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    jar: CookieJar,
) -> Json<CurrentUserResponse> {
    // The backend has the final say; a token we cannot verify locally is
    // still forwarded.
    let token = SessionCookies::read_token(&jar);
    let user = state.bridge().fetch_current_user(token.as_deref()).await;
    Json(CurrentUserResponse {
        user,
        session: session.as_ref().map(|s| SessionInfo::from(&s.claims)),
    })
}
