// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The signed-in user's own profile. Both routes sit behind the edge gate.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Json,
};

use crate::{
    auth::Session,
    error::ApiError,
    flows::FlowError,
    models::{ProfileUpdate, UserProfile},
    state::AppState,
};

/// Profile page data.
///
/// A session the backend no longer recognises is sent to login.
#[utoipa::path(
    get,
    path = "/profile",
    tag = "Profile",
    responses(
        (status = 200, description = "Current profile", body = UserProfile),
        (status = 303, description = "Not signed in; redirect to login")
    )
)]
pub async fn get_profile(State(state): State<AppState>, session: Session) -> Response {
    match state.bridge().fetch_current_user(Some(&session.token)).await {
        Some(user) => Json(user).into_response(),
        None => Redirect::to(state.gate.login_path()).into_response(),
    }
}

/// Update the editable profile fields.
#[utoipa::path(
    patch,
    path = "/profile",
    tag = "Profile",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 401, description = "Please log in to continue"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, ApiError> {
    let user = state
        .backend
        .complete_profile(&session.token, &update)
        .await
        .map_err(|e| FlowError::backend("Failed to update profile", e))?;
    Ok(Json(user))
}
