// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Tests for the onboarding wizard state machine.

use chrono::{Duration, Utc};
use tradielink::models::onboarding::{BasicInfo, BusinessDetails, ServiceAreaInput, TemplateInput};
use tradielink::models::TemplateKind;
use tradielink::services::{OnboardingStep, OnboardingWizard, WizardError};

fn valid_basic_info() -> BasicInfo {
    BasicInfo {
        display_name: "Dale Plumber".to_string(),
        phone: "0412 345 678".to_string(),
        address: "12 Wattle St, Brunswick VIC".to_string(),
    }
}

fn valid_business_details() -> BusinessDetails {
    BusinessDetails {
        business_name: "Dale's Plumbing".to_string(),
        abn: "12345678901".to_string(),
        license_number: Some("VIC-12345".to_string()),
        license_expiry: Some(Utc::now().date_naive() + Duration::days(365)),
        insurance_policy: None,
        insurance_expiry: None,
    }
}

fn wizard_at_review() -> OnboardingWizard {
    let mut wizard = OnboardingWizard::new();
    wizard.advance().unwrap(); // welcome -> basic_info
    wizard.draft_mut().basic_info = valid_basic_info();
    wizard.advance().unwrap(); // -> business_details
    wizard.draft_mut().business_details = valid_business_details();
    wizard.advance().unwrap(); // -> service_area
    wizard.draft_mut().service_area = ServiceAreaInput {
        postcodes: vec![],
        radius_km: Some(25.0),
    };
    wizard.advance().unwrap(); // -> sms_templates
    wizard.advance().unwrap(); // -> review (empty template list is valid)
    assert_eq!(wizard.step(), OnboardingStep::Review);
    wizard
}

#[test]
fn test_forward_transition_blocked_by_invalid_step() {
    let mut wizard = OnboardingWizard::new();
    wizard.advance().unwrap(); // welcome -> basic_info

    // Empty basic info fails validation
    let result = wizard.advance();
    assert!(matches!(result, Err(WizardError::Validation(_))));
    assert_eq!(wizard.step(), OnboardingStep::BasicInfo);

    wizard.draft_mut().basic_info = valid_basic_info();
    assert_eq!(wizard.advance().unwrap(), OnboardingStep::BusinessDetails);
}

#[test]
fn test_back_never_validates() {
    let mut wizard = OnboardingWizard::new();
    wizard.advance().unwrap();
    // Invalid draft, but back is always allowed
    assert_eq!(wizard.back().unwrap(), OnboardingStep::Welcome);
    assert!(matches!(wizard.back(), Err(WizardError::AtFirstStep)));
}

#[test]
fn test_skip_only_from_templates_step() {
    let mut wizard = OnboardingWizard::new();
    assert!(matches!(wizard.skip_templates(), Err(WizardError::CannotSkip)));

    let mut wizard = wizard_at_review();
    assert!(matches!(wizard.skip_templates(), Err(WizardError::CannotSkip)));

    // From the templates step the skip lands on review
    wizard.back().unwrap(); // review -> sms_templates
    assert_eq!(wizard.step(), OnboardingStep::SmsTemplates);
    wizard.draft_mut().templates.push(TemplateInput {
        kind: TemplateKind::MissedCall,
        body: "Sorry we missed you".to_string(),
    });
    assert_eq!(wizard.skip_templates().unwrap(), OnboardingStep::Review);
    // Skip discards any half-entered templates
    assert!(wizard.draft().templates.is_empty());
}

#[test]
fn test_review_requires_both_consents() {
    let mut wizard = wizard_at_review();

    assert!(matches!(wizard.advance(), Err(WizardError::ConsentRequired)));

    wizard.set_consents(true, false);
    assert!(matches!(wizard.advance(), Err(WizardError::ConsentRequired)));

    wizard.set_consents(true, true);
    assert_eq!(wizard.advance().unwrap(), OnboardingStep::Complete);

    // No transitions past complete
    assert!(matches!(wizard.advance(), Err(WizardError::AlreadyComplete)));
}

#[test]
fn test_template_step_validates_bodies() {
    let mut wizard = wizard_at_review();
    wizard.back().unwrap(); // -> sms_templates

    wizard.draft_mut().templates.push(TemplateInput {
        kind: TemplateKind::MissedCall,
        body: "a".repeat(161),
    });
    assert!(matches!(wizard.advance(), Err(WizardError::Validation(_))));

    wizard.draft_mut().templates[0].body = "Sorry we missed your call".to_string();
    assert_eq!(wizard.advance().unwrap(), OnboardingStep::Review);
}

#[test]
fn test_partial_validity_is_weaker_than_schema() {
    let mut wizard = OnboardingWizard::new();
    wizard.advance().unwrap(); // -> basic_info

    assert!(!wizard.is_step_partially_valid(OnboardingStep::BasicInfo));

    // A single filled field counts as progress but fails full validation
    wizard.draft_mut().basic_info.display_name = "D".to_string();
    assert!(wizard.is_step_partially_valid(OnboardingStep::BasicInfo));
    assert!(wizard.validate_step(OnboardingStep::BasicInfo).is_err());

    // Trivial steps always count as partially valid
    assert!(wizard.is_step_partially_valid(OnboardingStep::Welcome));
    assert!(wizard.is_step_partially_valid(OnboardingStep::Review));
}

#[test]
fn test_into_submission_requires_complete_and_normalizes_phone() {
    let wizard = wizard_at_review();
    assert!(matches!(
        wizard.into_submission(),
        Err(WizardError::NotComplete)
    ));

    let mut wizard = wizard_at_review();
    wizard.set_consents(true, true);
    wizard.advance().unwrap();

    let submission = wizard.into_submission().unwrap();
    assert_eq!(submission.basic_info.phone, "0412345678");
    assert_eq!(submission.service_area.radius_km, Some(25.0));
}

#[test]
fn test_step_order_is_linear() {
    let steps = OnboardingStep::ORDER;
    assert_eq!(steps[0], OnboardingStep::Welcome);
    assert_eq!(steps[6], OnboardingStep::Complete);
    for (i, step) in steps.iter().enumerate() {
        assert_eq!(step.index(), i);
    }
}
