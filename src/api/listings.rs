// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Public marketplace reads. The viewer's session is attached when present.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::OptionalSession,
    error::ApiError,
    fetchers::{related_listings, ListingFilter, Viewer},
    models::{Category, Product, PublicProfile},
    state::AppState,
};

/// A listing page: the listing plus others from the same category.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListingPage {
    pub listing: Product,
    pub related: Vec<Product>,
    /// Seller details are withheld from guests.
    pub seller_hidden: bool,
}

/// Browse listings, optionally narrowed by type and search text.
#[utoipa::path(
    get,
    path = "/listings",
    tag = "Listings",
    params(ListingFilter),
    responses(
        (status = 200, description = "Visible listings", body = Vec<Product>)
    )
)]
pub async fn list_listings(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    Query(filter): Query<ListingFilter>,
) -> Json<Vec<Product>> {
    let listings = state
        .fetchers
        .list_listings(Viewer::new(session.as_ref()))
        .await;
    Json(filter.apply(listings))
}

#[utoipa::path(
    get,
    path = "/listings/{slug}",
    tag = "Listings",
    params(
        ("slug" = String, Path, description = "Listing slug")
    ),
    responses(
        (status = 200, description = "Listing with related listings", body = ListingPage),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_listing(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
    Path(slug): Path<String>,
) -> Result<Json<ListingPage>, ApiError> {
    let viewer = Viewer::new(session.as_ref());
    let listing = state
        .fetchers
        .get_listing_by_slug(viewer, &slug)
        .await
        .ok_or_else(|| ApiError::not_found("Not found"))?;

    let all = state.fetchers.list_listings(viewer).await;
    Ok(Json(ListingPage {
        related: related_listings(&all, &listing),
        seller_hidden: listing.is_seller_hidden(),
        listing,
    }))
}

#[utoipa::path(
    get,
    path = "/categories",
    tag = "Listings",
    responses(
        (status = 200, description = "All categories", body = Vec<Category>)
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.fetchers.list_categories().await)
}

#[utoipa::path(
    get,
    path = "/u/{username}",
    tag = "Listings",
    params(
        ("username" = String, Path, description = "Public username")
    ),
    responses(
        (status = 200, description = "Public profile", body = PublicProfile),
        (status = 404, description = "Not found")
    )
)]
pub async fn public_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PublicProfile>, ApiError> {
    state
        .fetchers
        .get_public_profile(&username)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Not found"))
}
