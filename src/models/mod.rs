// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Data models for the application.

pub mod onboarding;
pub mod profile;
pub mod session;
pub mod template;

pub use onboarding::{OnboardingDraft, OnboardingOutcome, OnboardingSubmission};
pub use profile::{Profile, Role, ServiceArea};
pub use session::{Session, SessionUser};
pub use template::{SmsTemplate, TemplateKind};
