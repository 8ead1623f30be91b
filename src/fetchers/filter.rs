// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client-side narrowing of the listing collection.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::{Product, ProductType};

/// How many related listings a listing page shows.
pub const RELATED_LIMIT: usize = 4;

/// Query filter for `GET /listings`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingFilter {
    /// Keep only listings of this type.
    #[serde(rename = "type")]
    pub product_type: Option<ProductType>,
    /// Case-insensitive match on title, description, or category name.
    #[serde(rename = "q")]
    pub query: Option<String>,
}

impl ListingFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(wanted) = self.product_type {
            if product.product_type != wanted {
                return false;
            }
        }

        let needle = match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => q.to_lowercase(),
            _ => return true,
        };

        product.title.to_lowercase().contains(&needle)
            || product.description.to_lowercase().contains(&needle)
            || product
                .category
                .as_ref()
                .is_some_and(|c| c.name.to_lowercase().contains(&needle))
    }

    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        products.into_iter().filter(|p| self.matches(p)).collect()
    }
}

/// Up to [`RELATED_LIMIT`] listings sharing `listing`'s category.
///
/// A listing without a category has no related listings.
pub fn related_listings(all: &[Product], listing: &Product) -> Vec<Product> {
    let Some(category_id) = listing.category_id else {
        return Vec::new();
    };

    all.iter()
        .filter(|p| p.id != listing.id && p.category_id == Some(category_id))
        .take(RELATED_LIMIT)
        .cloned()
        .collect()
}
