// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{edge_gate, SessionInfo},
    flows::{
        listing::{DraftImageView, DraftView},
        onboarding::OnboardingView,
        ListingStep, OnboardingStep, StepInput, SubmitOutcome,
    },
    models::{
        Category, College, Gender, Product, ProductImage, ProductStatus, ProductType,
        ProductUser, ProductVisibility, ProfileUpdate, PublicProfile, UserProfile,
    },
    state::AppState,
};

pub mod auth;
pub mod drafts;
pub mod health;
pub mod listings;
pub mod onboarding;
pub mod profile;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/auth/google", post(auth::google_login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::current_user))
        .route(
            "/profile",
            get(profile::get_profile).patch(profile::update_profile),
        )
        .route("/listings", get(listings::list_listings))
        .route("/listings/{slug}", get(listings::get_listing))
        .route("/categories", get(listings::list_categories))
        .route("/u/{username}", get(listings::public_profile))
        .route(
            "/onboarding",
            get(onboarding::get_onboarding).post(onboarding::restart_onboarding),
        )
        .route("/onboarding/phone", post(onboarding::request_otp))
        .route("/onboarding/otp", post(onboarding::verify_otp))
        .route("/onboarding/gender", post(onboarding::select_gender))
        .route("/onboarding/identity", post(onboarding::set_identity))
        .route("/onboarding/institution", post(onboarding::select_institution))
        .route("/onboarding/complete", post(onboarding::complete_onboarding))
        .route("/onboarding/back", post(onboarding::go_back))
        .route(
            "/onboarding/institutions",
            get(onboarding::search_institutions),
        )
        .route("/drafts", get(drafts::get_draft).post(drafts::new_draft))
        .route("/drafts/step", post(drafts::apply_step))
        .route(
            "/drafts/photos",
            post(drafts::upload_photos).layer(DefaultBodyLimit::max(drafts::MAX_UPLOAD_BYTES)),
        )
        .route("/drafts/photos/{index}", delete(drafts::remove_photo))
        .route("/drafts/back", post(drafts::go_back))
        .route("/drafts/submit", post(drafts::submit_draft))
        .layer(middleware::from_fn_with_state(state.clone(), edge_gate))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        auth::google_login,
        auth::logout,
        auth::current_user,
        profile::get_profile,
        profile::update_profile,
        listings::list_listings,
        listings::get_listing,
        listings::list_categories,
        listings::public_profile,
        onboarding::get_onboarding,
        onboarding::restart_onboarding,
        onboarding::request_otp,
        onboarding::verify_otp,
        onboarding::select_gender,
        onboarding::set_identity,
        onboarding::select_institution,
        onboarding::complete_onboarding,
        onboarding::go_back,
        onboarding::search_institutions,
        drafts::get_draft,
        drafts::new_draft,
        drafts::apply_step,
        drafts::upload_photos,
        drafts::remove_photo,
        drafts::go_back,
        drafts::submit_draft
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            auth::GoogleLoginRequest,
            auth::LoginResponse,
            auth::CurrentUserResponse,
            SessionInfo,
            UserProfile,
            PublicProfile,
            ProfileUpdate,
            College,
            Gender,
            Category,
            Product,
            ProductImage,
            ProductUser,
            ProductType,
            ProductStatus,
            ProductVisibility,
            listings::ListingPage,
            OnboardingStep,
            OnboardingView,
            onboarding::PhoneRequest,
            onboarding::OtpRequest,
            onboarding::GenderRequest,
            onboarding::IdentityRequest,
            onboarding::InstitutionRequest,
            onboarding::OnboardingCompleteResponse,
            onboarding::InstitutionSearchResponse,
            onboarding::SearchStatus,
            ListingStep,
            StepInput,
            DraftView,
            DraftImageView,
            SubmitOutcome
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Auth", description = "Session cookie lifecycle"),
        (name = "Profile", description = "The signed-in user's profile"),
        (name = "Listings", description = "Marketplace browsing"),
        (name = "Onboarding", description = "Phone, identity and institution onboarding"),
        (name = "Drafts", description = "Step-wise listing creation")
    )
)]
struct ApiDoc;
