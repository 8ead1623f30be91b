// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Onboarding state machine.
//!
//! ```text
//! CollectPhone -> AwaitOtp -> CollectGender -> CollectIdentity -> Complete
//! ```
//!
//! A flow resumes at the first requirement the profile does not meet yet,
//! prefilled with whatever the profile already holds.

use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use super::FlowError;
use crate::{
    backend::BackendClient,
    models::{College, Gender, OnboardingResponse, OnboardingSubmission, UserProfile},
};

/// Length of the one-time code sent by SMS.
pub const OTP_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    CollectPhone,
    AwaitOtp,
    CollectGender,
    /// Identity fields and institution, in either order.
    CollectIdentity,
    Complete,
}

impl OnboardingStep {
    /// 1-based position shown in the step indicator.
    pub fn number(self) -> u8 {
        match self {
            OnboardingStep::CollectPhone => 1,
            OnboardingStep::AwaitOtp => 2,
            OnboardingStep::CollectGender => 3,
            OnboardingStep::CollectIdentity => 4,
            OnboardingStep::Complete => 5,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            OnboardingStep::CollectPhone | OnboardingStep::Complete => None,
            OnboardingStep::AwaitOtp => Some(OnboardingStep::CollectPhone),
            OnboardingStep::CollectGender => Some(OnboardingStep::AwaitOtp),
            OnboardingStep::CollectIdentity => Some(OnboardingStep::CollectGender),
        }
    }
}

/// One onboarding requirement: while `met` is false the flow starts at `step`.
struct Requirement {
    met: fn(&UserProfile) -> bool,
    step: OnboardingStep,
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn phone_verified(profile: &UserProfile) -> bool {
    profile.is_phone_verified
}

fn gender_present(profile: &UserProfile) -> bool {
    has_text(&profile.gender)
}

fn identity_present(profile: &UserProfile) -> bool {
    has_text(&profile.official_name) && has_text(&profile.roll_number)
}

fn college_present(profile: &UserProfile) -> bool {
    profile.college.is_some()
}

/// Checked in order; the first unmet requirement wins.
const REQUIREMENTS: &[Requirement] = &[
    Requirement {
        met: phone_verified,
        step: OnboardingStep::CollectPhone,
    },
    Requirement {
        met: gender_present,
        step: OnboardingStep::CollectGender,
    },
    Requirement {
        met: identity_present,
        step: OnboardingStep::CollectIdentity,
    },
    Requirement {
        met: college_present,
        step: OnboardingStep::CollectIdentity,
    },
];

/// Where onboarding should start for `profile`.
pub fn initial_step(profile: &UserProfile) -> OnboardingStep {
    REQUIREMENTS
        .iter()
        .find(|requirement| !(requirement.met)(profile))
        .map_or(OnboardingStep::Complete, |requirement| requirement.step)
}

/// An in-progress onboarding.
#[derive(Debug, Clone, PartialEq)]
pub struct OnboardingFlow {
    step: OnboardingStep,
    resumed_at: OnboardingStep,
    phone_number: String,
    gender: Option<Gender>,
    official_name: String,
    roll_number: String,
    college: Option<College>,
}

/// Snapshot returned to the client after every transition.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OnboardingView {
    pub step: OnboardingStep,
    pub step_number: u8,
    /// Percent complete for the progress bar.
    pub progress: u8,
    pub can_go_back: bool,
    pub phone_number: String,
    pub gender: Option<Gender>,
    pub official_name: String,
    pub roll_number: String,
    pub college: Option<College>,
}

impl OnboardingFlow {
    /// Start or resume onboarding from the current profile.
    pub fn resume(profile: &UserProfile) -> Self {
        let step = initial_step(profile);
        Self {
            step,
            resumed_at: step,
            phone_number: profile.phone_number.clone().unwrap_or_default(),
            gender: profile.gender.as_deref().and_then(|g| g.parse().ok()),
            official_name: profile.official_name.clone().unwrap_or_default(),
            roll_number: profile.roll_number.clone().unwrap_or_default(),
            college: profile.college.clone(),
        }
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn is_complete(&self) -> bool {
        self.step == OnboardingStep::Complete
    }

    fn identity_filled(&self) -> bool {
        !self.official_name.trim().is_empty() && !self.roll_number.trim().is_empty()
    }

    /// `10 + 20·(n−1)` percent for step `n`; the institution half of the
    /// identity step counts as step 5. Complete is 100.
    pub fn progress(&self) -> u8 {
        let n = match self.step {
            OnboardingStep::Complete => return 100,
            OnboardingStep::CollectIdentity if self.identity_filled() => 5,
            step => step.number(),
        };
        10 + 20 * (n - 1)
    }

    pub fn view(&self) -> OnboardingView {
        OnboardingView {
            step: self.step,
            step_number: self.step.number(),
            progress: self.progress(),
            can_go_back: self.step > self.resumed_at && self.step.previous().is_some(),
            phone_number: self.phone_number.clone(),
            gender: self.gender,
            official_name: self.official_name.clone(),
            roll_number: self.roll_number.clone(),
            college: self.college.clone(),
        }
    }

    fn expect_step(&self, allowed: &[OnboardingStep]) -> Result<(), FlowError> {
        if allowed.contains(&self.step) {
            Ok(())
        } else {
            Err(FlowError::WrongStep)
        }
    }

    /// Send an OTP to `phone_number`. Also used to resend while waiting.
    pub async fn request_otp(
        &mut self,
        backend: &BackendClient,
        token: &str,
        phone_number: &str,
    ) -> Result<(), FlowError> {
        self.expect_step(&[OnboardingStep::CollectPhone, OnboardingStep::AwaitOtp])?;

        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(FlowError::invalid("Phone number is required"));
        }

        backend
            .send_otp(token, phone_number)
            .await
            .map_err(|e| FlowError::backend("Error sending OTP", e))?;

        self.phone_number = phone_number.to_string();
        self.step = OnboardingStep::AwaitOtp;
        Ok(())
    }

    /// Check the code the user typed. It must be exactly six characters.
    pub async fn verify_otp(
        &mut self,
        backend: &BackendClient,
        token: &str,
        code: &str,
    ) -> Result<(), FlowError> {
        self.expect_step(&[OnboardingStep::AwaitOtp])?;

        let code = code.trim();
        if code.chars().count() != OTP_LENGTH {
            return Err(FlowError::invalid(format!(
                "Enter the {OTP_LENGTH}-digit code"
            )));
        }

        backend
            .verify_otp(token, &self.phone_number, code)
            .await
            .map_err(|e| FlowError::backend("Invalid OTP", e))?;

        self.step = OnboardingStep::CollectGender;
        Ok(())
    }

    pub fn select_gender(&mut self, gender: Gender) -> Result<(), FlowError> {
        self.expect_step(&[OnboardingStep::CollectGender])?;
        self.gender = Some(gender);
        self.step = OnboardingStep::CollectIdentity;
        Ok(())
    }

    pub fn set_identity(
        &mut self,
        official_name: &str,
        roll_number: &str,
    ) -> Result<(), FlowError> {
        self.expect_step(&[OnboardingStep::CollectIdentity])?;
        self.official_name = official_name.trim().to_string();
        self.roll_number = roll_number.trim().to_string();
        Ok(())
    }

    /// Pick an institution from search results. It is referenced by slug on
    /// submission, so a blank slug is rejected.
    pub fn select_institution(&mut self, college: College) -> Result<(), FlowError> {
        self.expect_step(&[OnboardingStep::CollectIdentity])?;
        if college.slug.trim().is_empty() {
            return Err(FlowError::invalid("Select your institution"));
        }
        self.college = Some(college);
        Ok(())
    }

    fn submission(&self) -> Result<OnboardingSubmission, FlowError> {
        if !self.identity_filled() {
            return Err(FlowError::invalid("Official name and roll number are required"));
        }
        let Some(college) = &self.college else {
            return Err(FlowError::invalid("Select your institution"));
        };
        let Some(gender) = self.gender else {
            return Err(FlowError::invalid("Select your gender"));
        };

        Ok(OnboardingSubmission {
            phone_number: self.phone_number.clone(),
            gender,
            official_name: self.official_name.clone(),
            roll_number: self.roll_number.clone(),
            college_slug: college.slug.clone(),
        })
    }

    /// Submit everything in one request.
    ///
    /// The response may carry a reissued token; storing it is up to the
    /// caller.
    pub async fn complete(
        &mut self,
        backend: &BackendClient,
        token: &str,
    ) -> Result<OnboardingResponse, FlowError> {
        self.expect_step(&[OnboardingStep::CollectIdentity])?;
        let submission = self.submission()?;

        let response = backend
            .submit_onboarding(token, &submission)
            .await
            .map_err(|e| FlowError::backend("Failed to complete onboarding", e))?;

        info!(college = %submission.college_slug, "Onboarding completed");
        self.step = OnboardingStep::Complete;
        Ok(response)
    }

    /// Step back once. Never goes before the step the flow resumed at.
    pub fn back(&mut self) -> OnboardingStep {
        if self.step > self.resumed_at {
            if let Some(previous) = self.step.previous() {
                self.step = previous.max(self.resumed_at);
            }
        }
        self.step
    }
}
