// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Marketplace Data Models
//!
//! Shapes exchanged with the marketplace backend and returned by the
//! gateway. All types derive `Serialize`, `Deserialize`, and `ToSchema`
//! for JSON handling and OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Users**: the authenticated profile and public profiles
//! - **Colleges**: institutions resolved during onboarding
//! - **Listings**: products, categories, and images
//! - **Auth**: token envelopes issued by the backend

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Users
// =============================================================================

/// Server-side view of the authenticated identity.
///
/// Created and updated only by the backend. Missing fields default so older
/// backend revisions still decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(default)]
pub struct UserProfile {
    pub id: i64,
    pub username: Option<String>,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
    pub phone_number: Option<String>,
    pub is_phone_verified: bool,
    pub is_college_verified: bool,
    pub gender: Option<String>,
    pub roll_number: Option<String>,
    pub official_name: Option<String>,
    pub college: Option<College>,
}

/// Profile visible to anyone at `/u/{username}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct PublicProfile {
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Fields a user may edit on their own profile page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub official_name: String,
    pub phone_number: String,
    pub roll_number: String,
    pub gender: String,
}

/// Fixed gender options offered during onboarding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender {other:?}")),
        }
    }
}

// =============================================================================
// Colleges
// =============================================================================

/// An institution from the backend's college directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct College {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

// =============================================================================
// Listings
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Buy,
    Rent,
    Sell,
    Lost,
    Found,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Buy => "buy",
            ProductType::Rent => "rent",
            ProductType::Sell => "sell",
            ProductType::Lost => "lost",
            ProductType::Found => "found",
        }
    }

    /// Lost and found posts carry no price and are never digital.
    pub fn is_lost_or_found(&self) -> bool {
        matches!(self, ProductType::Lost | ProductType::Found)
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(ProductType::Buy),
            "rent" => Ok(ProductType::Rent),
            "sell" => Ok(ProductType::Sell),
            "lost" => Ok(ProductType::Lost),
            "found" => Ok(ProductType::Found),
            other => Err(format!("unknown product type {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Pending,
    Active,
    Sold,
    Found,
    Rejected,
}

/// Who may see a listing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProductVisibility {
    #[default]
    Public,
    College,
    City,
    Gender,
}

impl ProductVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductVisibility::Public => "public",
            ProductVisibility::College => "college",
            ProductVisibility::City => "city",
            ProductVisibility::Gender => "gender",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub is_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ProductImage {
    pub id: i64,
    pub url: String,
    pub product_id: i64,
}

/// Seller summary embedded in a listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ProductUser {
    pub id: i64,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub college_id: Option<i64>,
    #[serde(default)]
    pub college: Option<College>,
    #[serde(default)]
    pub gender: Option<String>,
}

/// A marketplace listing.
///
/// `user` is `None` when the backend hides seller details from guests.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Option<f64>,
    pub product_type: ProductType,
    pub status: ProductStatus,
    pub visibility: ProductVisibility,
    pub created_at: String,
    #[serde(default)]
    pub is_digital: bool,
    #[serde(default)]
    pub pickup_address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category: Option<Category>,
    pub user_id: i64,
    #[serde(default)]
    pub user: Option<ProductUser>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
}

impl Product {
    pub fn is_seller_hidden(&self) -> bool {
        self.user.is_none()
    }
}

/// What the backend answers after a listing is created.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreatedProduct {
    pub id: Option<i64>,
    pub slug: Option<String>,
}

// =============================================================================
// Auth
// =============================================================================

/// Token envelope returned by the credential exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
}

fn bearer() -> String {
    "bearer".to_string()
}

/// Answer to `PATCH /api/users/onboarding`.
///
/// The backend reissues the token so its claims reflect the new profile.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OnboardingResponse {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub user: Option<UserProfile>,
}

/// Body sent when onboarding completes.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OnboardingSubmission {
    pub phone_number: String,
    pub gender: Gender,
    pub official_name: String,
    pub roll_number: String,
    pub college_slug: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_decodes_with_hidden_seller() {
        let json = r#"{
            "id": 7,
            "title": "Blue Calculator",
            "slug": "blue-calculator",
            "description": "fx-991",
            "price": 450.0,
            "product_type": "sell",
            "status": "active",
            "visibility": "college",
            "created_at": "2025-01-04T10:00:00",
            "is_digital": false,
            "user_id": 3,
            "user": null,
            "images": []
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.product_type, ProductType::Sell);
        assert_eq!(product.visibility, ProductVisibility::College);
        assert!(product.is_seller_hidden());
    }

    #[test]
    fn partial_profile_decodes_with_defaults() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"id": 1, "name": "Asha", "email": "a@x.in"}"#).unwrap();
        assert!(!profile.is_phone_verified);
        assert!(profile.college.is_none());
    }

    #[test]
    fn product_type_parses_case_insensitively() {
        assert_eq!("LOST".parse::<ProductType>(), Ok(ProductType::Lost));
        assert!("swap".parse::<ProductType>().is_err());
        assert!(ProductType::Found.is_lost_or_found());
        assert!(!ProductType::Rent.is_lost_or_found());
    }

    #[test]
    fn onboarding_submission_references_college_by_slug() {
        let body = serde_json::to_value(OnboardingSubmission {
            phone_number: "9876543210".into(),
            gender: Gender::Female,
            official_name: "Asha Rao".into(),
            roll_number: "21CS042".into(),
            college_slug: "iit-hyderabad".into(),
        })
        .unwrap();
        assert_eq!(body["gender"], "Female");
        assert_eq!(body["college_slug"], "iit-hyderabad");
        assert!(body.get("college_id").is_none());
    }
}
