// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Backend call failures and the backend's structured error bodies.

use axum::http::StatusCode;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}")]
    Status {
        status: StatusCode,
        detail: Option<ErrorDetail>,
    },

    #[error("backend response was invalid: {0}")]
    Decode(String),

    #[error("invalid backend URL: {0}")]
    Url(String),
}

impl BackendError {
    /// HTTP status reported by the backend, if it answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// First structured message the backend supplied, if any.
    pub fn first_message(&self) -> Option<&str> {
        match self {
            BackendError::Status {
                detail: Some(detail),
                ..
            } => detail.first_message(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// The `detail` field of a backend error body.
///
/// Either a plain message or a list of validation items.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Items(Vec<ErrorItem>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorItem {
    pub msg: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    detail: ErrorDetail,
}

impl ErrorDetail {
    pub fn first_message(&self) -> Option<&str> {
        match self {
            ErrorDetail::Message(msg) if !msg.is_empty() => Some(msg),
            ErrorDetail::Message(_) => None,
            ErrorDetail::Items(items) => items.first().map(|item| item.msg.as_str()),
        }
    }
}

/// Parse an error body. Non-JSON or unexpected shapes yield `None`.
pub fn parse_error_detail(body: &[u8]) -> Option<ErrorDetail> {
    serde_json::from_slice::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.detail)
}

/// Alert title shown for a failed write, keyed by HTTP status.
pub fn alert_title(status: StatusCode) -> String {
    match status.as_u16() {
        400 => "Bad Request".to_string(),
        401 => "Please log in to continue".to_string(),
        403 => "You don't have permission to do this".to_string(),
        404 => "Not found".to_string(),
        422 => "Validation error".to_string(),
        500 => "Server error. Please try again later".to_string(),
        other => format!("Error {other}"),
    }
}
