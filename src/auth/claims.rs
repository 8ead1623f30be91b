// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token claims and the verified session handed to handlers.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Claims carried by a backend-issued session token.
///
/// Only the fields the gateway reads are modelled; anything else in the
/// token is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// Subject (backend user id). Accepts a string or a number.
    #[serde(deserialize_with = "string_or_number")]
    pub sub: String,

    /// Expiration timestamp
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Set by the backend once onboarding has completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_onboarded: Option<bool>,
}

impl SessionClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Whether the client should open the onboarding flow.
    ///
    /// Tokens without the claim are treated as needing onboarding; the flow
    /// itself skips every requirement the profile already meets.
    pub fn onboarding_required(&self) -> bool {
        !self.is_onboarded.unwrap_or(false)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number subject, got {other}"
        ))),
    }
}

/// A verified session: the raw token plus its decoded claims.
///
/// The raw token is forwarded to the backend as a bearer credential.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub claims: SessionClaims,
}

impl Session {
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }
}

/// Session summary safe to show to the browser.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionInfo {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub onboarding_required: bool,
}

impl From<&SessionClaims> for SessionInfo {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            expires_at: claims.expires_at(),
            onboarding_required: claims.onboarding_required(),
        }
    }
}
