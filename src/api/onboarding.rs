// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Onboarding flow endpoints.
//!
//! Every handler locks the caller's flow slot, runs one transition on a copy,
//! and writes the copy back only on success. Finished flows are not kept.

use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::Session,
    error::ApiError,
    flows::{onboarding::OnboardingView, FlowError, OnboardingFlow, SearchOutcome},
    models::{College, Gender, UserProfile},
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct PhoneRequest {
    pub phone_number: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OtpRequest {
    pub code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenderRequest {
    pub gender: Gender,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct IdentityRequest {
    pub official_name: String,
    pub roll_number: String,
}

/// The institution picked from search results.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InstitutionRequest {
    pub college: College,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OnboardingCompleteResponse {
    pub onboarding: OnboardingView,
    /// Refreshed profile, when the backend returned one.
    pub user: Option<UserProfile>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InstitutionQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// Query too short; clear any shown results.
    TooShort,
    /// A newer query replaced this one.
    Superseded,
    Results,
}

/// Outcome of one keystroke of institution search.
#[derive(Debug, Serialize, ToSchema)]
pub struct InstitutionSearchResponse {
    pub outcome: SearchStatus,
    /// Generation this answer belongs to; clients drop older ones.
    pub generation: u64,
    pub colleges: Vec<College>,
}

type FlowGuard = OwnedMutexGuard<Option<OnboardingFlow>>;

/// Build a flow from the caller's backend profile.
async fn resume_flow(state: &AppState, session: &Session) -> Result<OnboardingFlow, ApiError> {
    let profile = state
        .backend
        .current_user(&session.token)
        .await
        .map_err(|e| FlowError::backend("Could not load your profile", e))?;
    Ok(OnboardingFlow::resume(&profile))
}

/// Lock the caller's flow, resuming it from the profile if none is held.
async fn lock_flow(
    state: &AppState,
    session: &Session,
) -> Result<(FlowGuard, OnboardingFlow), ApiError> {
    let guard = state
        .flows
        .onboarding(session.subject())
        .lock_owned()
        .await;
    let flow = match &*guard {
        Some(flow) => flow.clone(),
        None => resume_flow(state, session).await?,
    };
    Ok((guard, flow))
}

/// Write `flow` back into its slot and render it.
fn commit(mut guard: FlowGuard, flow: OnboardingFlow) -> OnboardingView {
    let view = flow.view();
    *guard = (!flow.is_complete()).then_some(flow);
    view
}

/// Current onboarding state, resumed from the profile on first call.
#[utoipa::path(
    get,
    path = "/onboarding",
    tag = "Onboarding",
    responses(
        (status = 200, description = "Current onboarding state", body = OnboardingView),
        (status = 401, description = "Please log in to continue"),
        (status = 502, description = "Connection failed")
    )
)]
pub async fn get_onboarding(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<OnboardingView>, ApiError> {
    let (guard, flow) = lock_flow(&state, &session).await?;
    Ok(Json(commit(guard, flow)))
}

/// Discard any in-progress state and resume from the profile again.
#[utoipa::path(
    post,
    path = "/onboarding",
    tag = "Onboarding",
    responses(
        (status = 200, description = "Fresh onboarding state", body = OnboardingView),
        (status = 401, description = "Please log in to continue")
    )
)]
pub async fn restart_onboarding(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<OnboardingView>, ApiError> {
    let guard = state
        .flows
        .onboarding(session.subject())
        .lock_owned()
        .await;
    let flow = resume_flow(&state, &session).await?;
    Ok(Json(commit(guard, flow)))
}

#[utoipa::path(
    post,
    path = "/onboarding/phone",
    tag = "Onboarding",
    request_body = PhoneRequest,
    responses(
        (status = 200, description = "OTP sent", body = OnboardingView),
        (status = 409, description = "Not on the phone step")
    )
)]
pub async fn request_otp(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<PhoneRequest>,
) -> Result<Json<OnboardingView>, ApiError> {
    let (guard, mut flow) = lock_flow(&state, &session).await?;
    flow.request_otp(&state.backend, &session.token, &request.phone_number)
        .await?;
    Ok(Json(commit(guard, flow)))
}

#[utoipa::path(
    post,
    path = "/onboarding/otp",
    tag = "Onboarding",
    request_body = OtpRequest,
    responses(
        (status = 200, description = "Phone verified", body = OnboardingView),
        (status = 422, description = "Code is not six characters")
    )
)]
pub async fn verify_otp(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<OtpRequest>,
) -> Result<Json<OnboardingView>, ApiError> {
    let (guard, mut flow) = lock_flow(&state, &session).await?;
    flow.verify_otp(&state.backend, &session.token, &request.code)
        .await?;
    Ok(Json(commit(guard, flow)))
}

#[utoipa::path(
    post,
    path = "/onboarding/gender",
    tag = "Onboarding",
    request_body = GenderRequest,
    responses(
        (status = 200, description = "Gender recorded", body = OnboardingView)
    )
)]
pub async fn select_gender(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<GenderRequest>,
) -> Result<Json<OnboardingView>, ApiError> {
    let (guard, mut flow) = lock_flow(&state, &session).await?;
    flow.select_gender(request.gender)?;
    Ok(Json(commit(guard, flow)))
}

#[utoipa::path(
    post,
    path = "/onboarding/identity",
    tag = "Onboarding",
    request_body = IdentityRequest,
    responses(
        (status = 200, description = "Identity recorded", body = OnboardingView)
    )
)]
pub async fn set_identity(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<IdentityRequest>,
) -> Result<Json<OnboardingView>, ApiError> {
    let (guard, mut flow) = lock_flow(&state, &session).await?;
    flow.set_identity(&request.official_name, &request.roll_number)?;
    Ok(Json(commit(guard, flow)))
}

#[utoipa::path(
    post,
    path = "/onboarding/institution",
    tag = "Onboarding",
    request_body = InstitutionRequest,
    responses(
        (status = 200, description = "Institution selected", body = OnboardingView)
    )
)]
pub async fn select_institution(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<InstitutionRequest>,
) -> Result<Json<OnboardingView>, ApiError> {
    let (guard, mut flow) = lock_flow(&state, &session).await?;
    flow.select_institution(request.college)?;
    Ok(Json(commit(guard, flow)))
}

/// Submit onboarding and store the reissued session token.
#[utoipa::path(
    post,
    path = "/onboarding/complete",
    tag = "Onboarding",
    responses(
        (status = 200, description = "Onboarding complete", body = OnboardingCompleteResponse),
        (status = 422, description = "Missing identity or institution")
    )
)]
pub async fn complete_onboarding(
    State(state): State<AppState>,
    session: Session,
    jar: CookieJar,
) -> Result<(CookieJar, Json<OnboardingCompleteResponse>), ApiError> {
    let (guard, mut flow) = lock_flow(&state, &session).await?;
    let response = flow.complete(&state.backend, &session.token).await?;
    let onboarding = commit(guard, flow);

    let bridge = state.bridge();
    let (jar, token) = match response.access_token {
        Some(token) => (bridge.reissue_token(jar, token.clone()), token),
        None => (jar, session.token.clone()),
    };
    let user = match response.user {
        Some(user) => Some(user),
        None => bridge.fetch_current_user(Some(&token)).await,
    };

    state.flows.finish_onboarding(session.subject());

    Ok((jar, Json(OnboardingCompleteResponse { onboarding, user })))
}

#[utoipa::path(
    post,
    path = "/onboarding/back",
    tag = "Onboarding",
    responses(
        (status = 200, description = "Previous step", body = OnboardingView)
    )
)]
pub async fn go_back(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<OnboardingView>, ApiError> {
    let (guard, mut flow) = lock_flow(&state, &session).await?;
    flow.back();
    Ok(Json(commit(guard, flow)))
}

/// Debounced institution search. Call on every keystroke.
#[utoipa::path(
    get,
    path = "/onboarding/institutions",
    tag = "Onboarding",
    params(InstitutionQuery),
    responses(
        (status = 200, description = "Search outcome", body = InstitutionSearchResponse)
    )
)]
pub async fn search_institutions(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<InstitutionQuery>,
) -> Json<InstitutionSearchResponse> {
    let search = state.flows.search(session.subject());
    let outcome = search.search(&state.backend, &query.q).await;

    let response = match outcome {
        SearchOutcome::TooShort => InstitutionSearchResponse {
            outcome: SearchStatus::TooShort,
            generation: search.latest(),
            colleges: Vec::new(),
        },
        SearchOutcome::Superseded => InstitutionSearchResponse {
            outcome: SearchStatus::Superseded,
            generation: search.latest(),
            colleges: Vec::new(),
        },
        SearchOutcome::Results {
            generation,
            colleges,
        } => InstitutionSearchResponse {
            outcome: SearchStatus::Results,
            generation,
            colleges,
        },
    };
    Json(response)
}
