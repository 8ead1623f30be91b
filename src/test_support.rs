// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared helpers for unit tests: an in-process stub backend and token minting.

use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use tokio::net::TcpListener;
use url::Url;

use crate::{auth::claims::SessionClaims, config::Config, state::AppState};

pub const TEST_SECRET: &str = "test-secret";

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_backend(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

/// A base URL nothing listens on.
pub fn unreachable_backend() -> Url {
    Url::parse("http://127.0.0.1:9").unwrap()
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Mint an HS256 session token for `sub` expiring `ttl_secs` from now.
pub fn mint_token(sub: &str, ttl_secs: i64) -> String {
    mint_token_with(sub, ttl_secs, TEST_SECRET)
}

pub fn mint_token_with(sub: &str, ttl_secs: i64, secret: &str) -> String {
    let claims = SessionClaims {
        sub: sub.to_string(),
        exp: now() + ttl_secs,
        iat: Some(now()),
        email: None,
        is_onboarded: None,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn test_config(api_url: Url) -> Config {
    Config {
        api_url,
        secret_key: TEST_SECRET.to_string(),
        ..Config::default()
    }
}

pub fn test_state(api_url: Url) -> AppState {
    AppState::new(test_config(api_url)).unwrap()
}
