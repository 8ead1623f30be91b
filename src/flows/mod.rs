// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Step-wise Flows
//!
//! The onboarding and listing-creation state machines plus the debounced
//! institution search used during onboarding.
//!
//! Flows are plain values. Handlers lock the subject's slot in the
//! [`FlowStore`](crate::store::FlowStore), run a transition (which may call
//! the backend) on a copy, and write the copy back only when the transition
//! succeeds.

pub mod listing;
pub mod onboarding;
pub mod search;

use axum::http::StatusCode;

use crate::backend::{alert_title, BackendError};

pub use listing::{ListingDraft, ListingStep, StepInput, SubmitOutcome};
pub use onboarding::{OnboardingFlow, OnboardingStep};
pub use search::{InstitutionSearch, SearchOutcome};

/// Why a transition was refused. The flow is left unchanged.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("This step is not available right now")]
    WrongStep,

    #[error("{0}")]
    Invalid(String),

    /// Backend rejected or never answered a write. `fallback` is shown when
    /// the backend supplied no structured message.
    #[error("{fallback}")]
    Backend {
        fallback: &'static str,
        #[source]
        source: BackendError,
    },
}

impl FlowError {
    pub fn invalid(message: impl Into<String>) -> Self {
        FlowError::Invalid(message.into())
    }

    pub fn backend(fallback: &'static str, source: BackendError) -> Self {
        FlowError::Backend { fallback, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            FlowError::WrongStep => StatusCode::CONFLICT,
            FlowError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FlowError::Backend { source, .. } => {
                source.status().unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }

    /// Short alert heading for the client.
    pub fn title(&self) -> String {
        match self {
            FlowError::WrongStep => "Not available".to_string(),
            FlowError::Invalid(_) => alert_title(StatusCode::UNPROCESSABLE_ENTITY),
            FlowError::Backend { source, .. } => match source.status() {
                Some(status) => alert_title(status),
                None => "Connection failed".to_string(),
            },
        }
    }

    /// Alert body: the backend's first structured message when it gave one.
    pub fn message(&self) -> String {
        match self {
            FlowError::Backend { fallback, source } => source
                .first_message()
                .unwrap_or(fallback)
                .to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ErrorDetail;

    #[test]
    fn backend_message_prefers_structured_detail() {
        let err = FlowError::backend(
            "Failed to create",
            BackendError::Status {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                detail: Some(ErrorDetail::Message("Title too long".into())),
            },
        );
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.title(), "Validation error");
        assert_eq!(err.message(), "Title too long");
    }

    #[test]
    fn backend_message_falls_back() {
        let err = FlowError::backend(
            "Failed to create",
            BackendError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                detail: None,
            },
        );
        assert_eq!(err.title(), "Server error. Please try again later");
        assert_eq!(err.message(), "Failed to create");
    }

    #[test]
    fn unreachable_backend_reads_as_connection_failure() {
        let err = FlowError::backend("Error sending OTP", BackendError::Decode("eof".into()));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.title(), "Connection failed");
        assert_eq!(err.message(), "Error sending OTP");
    }

    #[test]
    fn local_errors_map_to_client_statuses() {
        assert_eq!(FlowError::WrongStep.status(), StatusCode::CONFLICT);
        let invalid = FlowError::invalid("Title is required");
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(invalid.message(), "Title is required");
    }
}
