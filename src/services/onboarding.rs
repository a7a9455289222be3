// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Onboarding wizard state machine and submission client.
//!
//! A linear multi-step wizard: transitions move forward or backward by
//! adjacent step only, except the explicit skip from the templates step
//! straight to review. Forward transitions validate the current step's
//! schema; backward transitions never validate. The accumulated draft
//! becomes a single function call on completion and is consumed by it.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::models::onboarding::{normalize_phone, OnboardingDraft, OnboardingSubmission};
use crate::models::OnboardingOutcome;

/// Wizard steps in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Welcome,
    BasicInfo,
    BusinessDetails,
    ServiceArea,
    SmsTemplates,
    Review,
    Complete,
}

impl OnboardingStep {
    pub const ORDER: [OnboardingStep; 7] = [
        OnboardingStep::Welcome,
        OnboardingStep::BasicInfo,
        OnboardingStep::BusinessDetails,
        OnboardingStep::ServiceArea,
        OnboardingStep::SmsTemplates,
        OnboardingStep::Review,
        OnboardingStep::Complete,
    ];

    pub fn index(self) -> usize {
        Self::ORDER.iter().position(|s| *s == self).unwrap_or(0)
    }

    fn next(self) -> Option<OnboardingStep> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    fn prev(self) -> Option<OnboardingStep> {
        self.index().checked_sub(1).map(|i| Self::ORDER[i])
    }
}

impl Default for OnboardingStep {
    fn default() -> Self {
        OnboardingStep::Welcome
    }
}

/// Errors from wizard transitions.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),

    #[error("Terms and privacy consents are required before completing")]
    ConsentRequired,

    #[error("Skip is only available from the templates step")]
    CannotSkip,

    #[error("Already at the first step")]
    AtFirstStep,

    #[error("Onboarding is already complete")]
    AlreadyComplete,

    #[error("Onboarding has not been completed yet")]
    NotComplete,
}

/// The in-memory wizard. Exists only for the duration of the interaction;
/// discarded on submit or abandonment.
#[derive(Debug, Default)]
pub struct OnboardingWizard {
    step: OnboardingStep,
    draft: OnboardingDraft,
    terms_accepted: bool,
    privacy_accepted: bool,
}

impl OnboardingWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> OnboardingStep {
        self.step
    }

    pub fn draft(&self) -> &OnboardingDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut OnboardingDraft {
        &mut self.draft
    }

    pub fn set_consents(&mut self, terms: bool, privacy: bool) {
        self.terms_accepted = terms;
        self.privacy_accepted = privacy;
    }

    /// Validate the current step and move forward one step.
    ///
    /// `Review -> Complete` additionally requires both consents.
    pub fn advance(&mut self) -> Result<OnboardingStep, WizardError> {
        let next = self.step.next().ok_or(WizardError::AlreadyComplete)?;

        self.validate_step(self.step)?;
        if self.step == OnboardingStep::Review && !(self.terms_accepted && self.privacy_accepted) {
            return Err(WizardError::ConsentRequired);
        }

        self.step = next;
        Ok(self.step)
    }

    /// Move back one step. Never validates.
    pub fn back(&mut self) -> Result<OnboardingStep, WizardError> {
        if self.step == OnboardingStep::Complete {
            return Err(WizardError::AlreadyComplete);
        }
        self.step = self.step.prev().ok_or(WizardError::AtFirstStep)?;
        Ok(self.step)
    }

    /// Explicit skip: templates straight to review, leaving the template
    /// list empty (the server generates defaults).
    pub fn skip_templates(&mut self) -> Result<OnboardingStep, WizardError> {
        if self.step != OnboardingStep::SmsTemplates {
            return Err(WizardError::CannotSkip);
        }
        self.draft.templates.clear();
        self.step = OnboardingStep::Review;
        Ok(self.step)
    }

    /// Full schema validation for one step.
    pub fn validate_step(&self, step: OnboardingStep) -> Result<(), WizardError> {
        match step {
            OnboardingStep::Welcome | OnboardingStep::Review | OnboardingStep::Complete => Ok(()),
            OnboardingStep::BasicInfo => Ok(self.draft.basic_info.validate()?),
            OnboardingStep::BusinessDetails => Ok(self.draft.business_details.validate()?),
            OnboardingStep::ServiceArea => Ok(self.draft.service_area.validate()?),
            OnboardingStep::SmsTemplates => {
                for template in &self.draft.templates {
                    template.validate()?;
                }
                Ok(())
            }
        }
    }

    /// Weaker "enough to show progress" check, for progress indication
    /// only. Never gates transitions or submission.
    pub fn is_step_partially_valid(&self, step: OnboardingStep) -> bool {
        match step {
            OnboardingStep::Welcome
            | OnboardingStep::SmsTemplates
            | OnboardingStep::Review
            | OnboardingStep::Complete => true,
            OnboardingStep::BasicInfo => {
                let info = &self.draft.basic_info;
                !info.display_name.trim().is_empty()
                    || !info.phone.trim().is_empty()
                    || !info.address.trim().is_empty()
            }
            OnboardingStep::BusinessDetails => {
                let details = &self.draft.business_details;
                !details.business_name.trim().is_empty() || !details.abn.trim().is_empty()
            }
            OnboardingStep::ServiceArea => {
                let area = &self.draft.service_area;
                !area.postcodes.is_empty() || area.radius_km.is_some()
            }
        }
    }

    /// Consume the wizard into the submission payload. Only valid once
    /// the `Complete` step has been reached; normalizes the phone number.
    pub fn into_submission(self) -> Result<OnboardingSubmission, WizardError> {
        if self.step != OnboardingStep::Complete {
            return Err(WizardError::NotComplete);
        }

        let mut basic_info = self.draft.basic_info;
        basic_info.phone = normalize_phone(&basic_info.phone);

        Ok(OnboardingSubmission {
            basic_info,
            business_details: self.draft.business_details,
            service_area: self.draft.service_area,
            templates: self.draft.templates,
        })
    }
}

// ─── Submission Client ───────────────────────────────────────────

/// Client for the server-side onboarding-completion function.
#[derive(Clone)]
pub struct OnboardingClient {
    http: reqwest::Client,
    base_url: String,
}

impl OnboardingClient {
    pub fn new(service_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: service_url.trim_end_matches('/').to_string(),
        }
    }

    /// Submit the accumulated draft. Idempotent under retry: the server
    /// upserts on the user id, so re-submission overwrites.
    pub async fn complete(
        &self,
        access_token: &str,
        submission: &OnboardingSubmission,
    ) -> Result<OnboardingOutcome, AppError> {
        let url = format!("{}/functions/onboarding-complete", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(submission)
            .send()
            .await
            .map_err(|e| AppError::Database(format!("Submission request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AppError::InvalidToken);
        }
        if status == reqwest::StatusCode::BAD_REQUEST {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Validation(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Database(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Database(format!("JSON parse error: {}", e)))
    }
}
