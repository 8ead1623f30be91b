// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Data Fetchers
//!
//! Read-only access to listings, categories and public profiles.
//!
//! Reads attach the viewer's bearer token when present, since the backend
//! filters listings by visibility and hides seller details from guests.
//! Results are cached per viewer for a short revalidation window. Backend
//! failures degrade to empty results and are never cached.

pub mod cache;
pub mod filter;

use tracing::{debug, warn};

use crate::{
    auth::Session,
    backend::BackendClient,
    config::CacheTtls,
    models::{Category, Product, PublicProfile},
};

pub use cache::TtlCache;
pub use filter::{related_listings, ListingFilter};

/// Max distinct viewers (or viewer/slug pairs) held per cache.
const CACHE_CAPACITY: usize = 512;

/// Cache scope. Backend answers differ per viewer, so entries never leak
/// across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewerKey {
    Anonymous,
    Subject(String),
}

/// Who is asking: an optional verified session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewer<'a> {
    session: Option<&'a Session>,
}

impl<'a> Viewer<'a> {
    pub fn anonymous() -> Self {
        Self { session: None }
    }

    pub fn new(session: Option<&'a Session>) -> Self {
        Self { session }
    }

    pub fn token(&self) -> Option<&'a str> {
        self.session.map(|s| s.token.as_str())
    }

    fn key(&self) -> ViewerKey {
        match self.session {
            Some(session) => ViewerKey::Subject(session.subject().to_string()),
            None => ViewerKey::Anonymous,
        }
    }
}

/// Cached reads against the backend.
pub struct DataFetchers {
    backend: BackendClient,
    listings: TtlCache<ViewerKey, Vec<Product>>,
    listing: TtlCache<(ViewerKey, String), Product>,
    categories: TtlCache<(), Vec<Category>>,
}

impl DataFetchers {
    pub fn new(backend: BackendClient, ttls: CacheTtls) -> Self {
        Self {
            backend,
            listings: TtlCache::new(CACHE_CAPACITY, ttls.listings),
            listing: TtlCache::new(CACHE_CAPACITY, ttls.listing),
            categories: TtlCache::new(1, ttls.categories),
        }
    }

    /// All listings visible to `viewer`. Empty on failure.
    pub async fn list_listings(&self, viewer: Viewer<'_>) -> Vec<Product> {
        let key = viewer.key();
        if let Some(hit) = self.listings.get(&key) {
            return hit;
        }

        match self.backend.list_products(viewer.token()).await {
            Ok(products) => {
                self.listings.put(key, products.clone());
                products
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch listings");
                Vec::new()
            }
        }
    }

    /// One listing by slug, or `None` when missing or unreachable.
    pub async fn get_listing_by_slug(&self, viewer: Viewer<'_>, slug: &str) -> Option<Product> {
        let key = (viewer.key(), slug.to_string());
        if let Some(hit) = self.listing.get(&key) {
            return Some(hit);
        }

        match self.backend.get_product(viewer.token(), slug).await {
            Ok(product) => {
                self.listing.put(key, product.clone());
                Some(product)
            }
            Err(e) if e.is_not_found() => {
                debug!(slug, "Listing not found");
                None
            }
            Err(e) => {
                warn!(slug, error = %e, "Failed to fetch listing");
                None
            }
        }
    }

    /// All categories. Empty on failure.
    pub async fn list_categories(&self) -> Vec<Category> {
        if let Some(hit) = self.categories.get(&()) {
            return hit;
        }

        match self.backend.list_categories().await {
            Ok(categories) => {
                self.categories.put((), categories.clone());
                categories
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch categories");
                Vec::new()
            }
        }
    }

    /// Public profile by username. Never cached.
    pub async fn get_public_profile(&self, username: &str) -> Option<PublicProfile> {
        match self.backend.public_profile(username).await {
            Ok(profile) => Some(profile),
            Err(e) if e.status().is_some() => {
                debug!(username, error = %e, "Public profile unavailable");
                None
            }
            Err(e) => {
                warn!(username, error = %e, "Failed to fetch public profile");
                None
            }
        }
    }

    /// Drop every cached listing collection and single listing.
    pub fn invalidate_listings(&self) {
        self.listings.clear();
        self.listing.clear();
        debug!("Listing caches invalidated");
    }
}
