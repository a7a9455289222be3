// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Services module - business logic layer.

pub mod auth;
pub mod dev_login;
pub mod onboarding;
pub mod profile_cache;
pub mod reconciler;

pub use auth::{AuthClient, AuthEvent, AuthEvents, AuthSubscription};
pub use dev_login::{DevLoginService, DevLoginStrategy};
pub use onboarding::{OnboardingClient, OnboardingStep, OnboardingWizard, WizardError};
pub use profile_cache::{ProfileCache, ProfileFetch};
pub use reconciler::{AuthReconciler, AuthView};
