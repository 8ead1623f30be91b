// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for the marketplace backend.

use std::time::Duration;

use axum::body::Bytes;
use reqwest::{multipart::Form, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

use super::error::{parse_error_detail, BackendError};
use crate::models::{
    Category, College, CreatedProduct, OnboardingResponse, OnboardingSubmission, Product,
    ProfileUpdate, PublicProfile, TokenResponse, UserProfile,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Thin typed wrapper over the backend REST API.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: Url,
    http: Client,
}

impl BackendClient {
    pub fn new(base_url: Url) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .no_proxy()
            .build()?;
        Ok(Self { base_url, http })
    }

    /// Build an endpoint URL from path segments. A trailing `""` segment
    /// yields a trailing slash.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // -------------------------------------------------------------------------
    // Auth & users
    // -------------------------------------------------------------------------

    /// `POST /api/auth/google`
    pub async fn exchange_google_credential(
        &self,
        credential: &str,
    ) -> Result<TokenResponse, BackendError> {
        let url = self.endpoint(&["api", "auth", "google"])?;
        let request = self
            .http
            .post(url)
            .json(&json!({ "credential": credential }));
        send_json(request).await
    }

    /// `GET /api/users/me`
    pub async fn current_user(&self, token: &str) -> Result<UserProfile, BackendError> {
        let url = self.endpoint(&["api", "users", "me"])?;
        send_json(self.http.get(url).bearer_auth(token)).await
    }

    /// `PATCH /api/users/me/complete-profile`
    pub async fn complete_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, BackendError> {
        let url = self.endpoint(&["api", "users", "me", "complete-profile"])?;
        send_json(self.http.patch(url).bearer_auth(token).json(update)).await
    }

    /// `POST /api/users/send-otp`
    pub async fn send_otp(&self, token: &str, phone_number: &str) -> Result<(), BackendError> {
        let url = self.endpoint(&["api", "users", "send-otp"])?;
        let request = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "phone_number": phone_number }));
        send_unit(request).await
    }

    /// `POST /api/users/verify-otp`
    pub async fn verify_otp(
        &self,
        token: &str,
        phone_number: &str,
        code: &str,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&["api", "users", "verify-otp"])?;
        let request = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "phone_number": phone_number, "code": code }));
        send_unit(request).await
    }

    /// `PATCH /api/users/onboarding`
    pub async fn submit_onboarding(
        &self,
        token: &str,
        submission: &OnboardingSubmission,
    ) -> Result<OnboardingResponse, BackendError> {
        let url = self.endpoint(&["api", "users", "onboarding"])?;
        send_json(self.http.patch(url).bearer_auth(token).json(submission)).await
    }

    /// `GET /api/u/{username}`
    pub async fn public_profile(&self, username: &str) -> Result<PublicProfile, BackendError> {
        let url = self.endpoint(&["api", "u", username])?;
        send_json(self.http.get(url)).await
    }

    // -------------------------------------------------------------------------
    // Colleges
    // -------------------------------------------------------------------------

    /// `GET /api/colleges/search?q=`
    pub async fn search_colleges(&self, query: &str) -> Result<Vec<College>, BackendError> {
        let mut url = self.endpoint(&["api", "colleges", "search"])?;
        url.query_pairs_mut().append_pair("q", query);
        send_json(self.http.get(url)).await
    }

    // -------------------------------------------------------------------------
    // Listings
    // -------------------------------------------------------------------------

    /// `GET /api/products/`
    pub async fn list_products(&self, token: Option<&str>) -> Result<Vec<Product>, BackendError> {
        let url = self.endpoint(&["api", "products", ""])?;
        send_json(with_optional_bearer(self.http.get(url), token)).await
    }

    /// `GET /api/products/{slug}`
    pub async fn get_product(
        &self,
        token: Option<&str>,
        slug: &str,
    ) -> Result<Product, BackendError> {
        let url = self.endpoint(&["api", "products", slug])?;
        send_json(with_optional_bearer(self.http.get(url), token)).await
    }

    /// `POST /api/products/` as `multipart/form-data`.
    pub async fn create_product(
        &self,
        token: &str,
        form: Form,
    ) -> Result<CreatedProduct, BackendError> {
        let url = self.endpoint(&["api", "products", ""])?;
        send_json(self.http.post(url).bearer_auth(token).multipart(form)).await
    }

    /// `GET /api/categories/`
    pub async fn list_categories(&self) -> Result<Vec<Category>, BackendError> {
        let url = self.endpoint(&["api", "categories", ""])?;
        send_json(self.http.get(url)).await
    }

    /// Reachability probe used by the readiness check. Any HTTP answer counts.
    pub async fn ping(&self) -> Result<(), BackendError> {
        self.http.get(self.base_url.clone()).send().await?;
        Ok(())
    }
}

fn with_optional_bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

async fn send_checked(request: RequestBuilder) -> Result<Bytes, BackendError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(BackendError::Status {
            status,
            detail: parse_error_detail(&body),
        });
    }

    Ok(body)
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, BackendError> {
    let body = send_checked(request).await?;
    serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
}

async fn send_unit(request: RequestBuilder) -> Result<(), BackendError> {
    send_checked(request).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_backend;
    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use std::collections::HashMap;

    #[test]
    fn endpoints_keep_trailing_slash_and_encode_segments() {
        let client = BackendClient::new(Url::parse("http://backend.local:8000").unwrap()).unwrap();
        assert_eq!(
            client.endpoint(&["api", "products", ""]).unwrap().as_str(),
            "http://backend.local:8000/api/products/"
        );
        assert_eq!(
            client.endpoint(&["api", "products", "a b/c"]).unwrap().as_str(),
            "http://backend.local:8000/api/products/a%20b%2Fc"
        );
    }

    #[test]
    fn endpoints_respect_base_path_prefix() {
        let client =
            BackendClient::new(Url::parse("http://backend.local/market/").unwrap()).unwrap();
        assert_eq!(
            client.endpoint(&["api", "users", "me"]).unwrap().as_str(),
            "http://backend.local/market/api/users/me"
        );
    }

    #[tokio::test]
    async fn bearer_token_is_forwarded() {
        let backend = Router::new().route(
            "/api/users/me",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(serde_json::json!({ "id": 1, "name": auth, "email": "a@x.in" }))
            }),
        );
        let client = BackendClient::new(spawn_backend(backend).await).unwrap();

        let user = client.current_user("tok-123").await.unwrap();
        assert_eq!(user.name, "Bearer tok-123");
    }

    #[tokio::test]
    async fn status_errors_carry_backend_detail() {
        let backend = Router::new().route(
            "/api/products/{slug}",
            get(|Path(slug): Path<String>| async move {
                (
                    StatusCode::NOT_FOUND,
                    Json(serde_json::json!({ "detail": format!("{slug} not found") })),
                )
            }),
        );
        let client = BackendClient::new(spawn_backend(backend).await).unwrap();

        let err = client.get_product(None, "blue-calculator").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.first_message(), Some("blue-calculator not found"));
    }

    #[tokio::test]
    async fn college_search_sends_query() {
        let backend = Router::new().route(
            "/api/colleges/search",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let q = params.get("q").cloned().unwrap_or_default();
                Json(serde_json::json!([{ "id": 1, "name": q, "slug": "iit-h" }]))
            }),
        );
        let client = BackendClient::new(spawn_backend(backend).await).unwrap();

        let colleges = client.search_colleges("IIT H").await.unwrap();
        assert_eq!(colleges[0].name, "IIT H");
    }

    #[tokio::test]
    async fn undecodable_success_is_a_decode_error() {
        let backend = Router::new().route("/api/auth/google", post(|| async { "not json" }));
        let client = BackendClient::new(spawn_backend(backend).await).unwrap();

        let err = client.exchange_google_credential("cred").await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }
}
