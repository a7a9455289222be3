// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Onboarding draft payloads and their validation contracts.
//!
//! Each wizard step owns one payload type with a `validator` schema. The
//! draft is in-memory only; it becomes a profile mutation on final
//! submission and is discarded afterwards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::template::{TemplateKind, MAX_SMS_SEGMENT_CHARS};
use crate::time_utils::is_future_date;

/// Normalized Australian mobile/landline length (leading 0 + 9 digits).
const PHONE_DIGITS: usize = 10;
/// ABN is always exactly 11 digits.
const ABN_DIGITS: usize = 11;

/// Strip spaces and hyphens from a phone number as entered.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn validate_au_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = normalize_phone(phone);
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(validation_error(
            "phone_charset",
            "Phone may only contain digits, spaces and hyphens",
        ));
    }
    if digits.len() < PHONE_DIGITS {
        return Err(validation_error(
            "phone_too_short",
            "Phone must be at least 10 digits",
        ));
    }
    if digits.len() > PHONE_DIGITS {
        return Err(validation_error(
            "phone_too_long",
            "Phone must be exactly 10 digits",
        ));
    }
    if !digits.starts_with('0') {
        return Err(validation_error(
            "phone_prefix",
            "Phone must start with 0",
        ));
    }
    Ok(())
}

fn validate_abn(abn: &str) -> Result<(), ValidationError> {
    if abn.len() != ABN_DIGITS || !abn.chars().all(|c| c.is_ascii_digit()) {
        return Err(validation_error(
            "abn_format",
            "ABN must be exactly 11 digits",
        ));
    }
    Ok(())
}

fn validate_future_expiry(date: &NaiveDate) -> Result<(), ValidationError> {
    if !is_future_date(*date) {
        return Err(validation_error(
            "expiry_in_past",
            "Expiry date must be in the future",
        ));
    }
    Ok(())
}

/// Basic info step payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BasicInfo {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub display_name: String,
    #[validate(custom(function = validate_au_phone))]
    pub phone: String,
    #[validate(length(min = 5, max = 200, message = "Address must be 5-200 characters"))]
    pub address: String,
}

/// Business details step payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct BusinessDetails {
    #[validate(length(min = 2, max = 100, message = "Business name must be 2-100 characters"))]
    pub business_name: String,
    #[validate(custom(function = validate_abn))]
    pub abn: String,
    #[validate(length(max = 50))]
    pub license_number: Option<String>,
    #[validate(custom(function = validate_future_expiry))]
    pub license_expiry: Option<NaiveDate>,
    #[validate(length(max = 50))]
    pub insurance_policy: Option<String>,
    #[validate(custom(function = validate_future_expiry))]
    pub insurance_expiry: Option<NaiveDate>,
}

/// Service area step payload.
///
/// The schema enforces the exclusive-or invariant: a non-empty postcode
/// list or a positive radius, exactly one of the two.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_service_area_xor))]
pub struct ServiceAreaInput {
    #[serde(default)]
    pub postcodes: Vec<String>,
    pub radius_km: Option<f64>,
}

fn validate_service_area_xor(input: &ServiceAreaInput) -> Result<(), ValidationError> {
    let has_postcodes = !input.postcodes.is_empty();
    let has_radius = input.radius_km.is_some_and(|r| r > 0.0);

    match (has_postcodes, has_radius) {
        (true, true) => Err(validation_error(
            "service_area_both",
            "Choose postcodes or a radius, not both",
        )),
        (false, false) => Err(validation_error(
            "service_area_none",
            "Choose at least one postcode or a radius",
        )),
        _ => {
            if input
                .postcodes
                .iter()
                .any(|p| p.len() != 4 || !p.chars().all(|c| c.is_ascii_digit()))
            {
                return Err(validation_error(
                    "postcode_format",
                    "Postcodes must be 4 digits",
                ));
            }
            Ok(())
        }
    }
}

/// One template as entered in the wizard.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TemplateInput {
    pub kind: TemplateKind,
    #[validate(length(
        min = 1,
        max = MAX_SMS_SEGMENT_CHARS,
        message = "Template must fit in a single SMS segment"
    ))]
    pub body: String,
}

/// Accumulated wizard draft. Sub-records fill in as steps complete.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardingDraft {
    pub basic_info: BasicInfo,
    pub business_details: BusinessDetails,
    pub service_area: ServiceAreaInput,
    #[serde(default)]
    pub templates: Vec<TemplateInput>,
}

/// Wire body for the onboarding-completion function call.
///
/// Phone is normalized before this is produced; the server re-validates
/// the whole payload regardless.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OnboardingSubmission {
    #[validate(nested)]
    pub basic_info: BasicInfo,
    #[validate(nested)]
    pub business_details: BusinessDetails,
    #[validate(nested)]
    pub service_area: ServiceAreaInput,
    #[validate(nested)]
    #[serde(default)]
    pub templates: Vec<TemplateInput>,
}

/// Structured result of the onboarding-completion function.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct OnboardingOutcome {
    pub success: bool,
    pub profile_updated: bool,
    pub templates_created: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn valid_basic_info() -> BasicInfo {
        BasicInfo {
            display_name: "Dale Plumber".to_string(),
            phone: "0412 345 678".to_string(),
            address: "12 Wattle St, Brunswick VIC".to_string(),
        }
    }

    #[test]
    fn test_phone_accepted_and_normalized() {
        let info = valid_basic_info();
        assert!(info.validate().is_ok());
        assert_eq!(normalize_phone(&info.phone), "0412345678");
        assert_eq!(normalize_phone("0412345678"), "0412345678");
    }

    #[test]
    fn test_phone_nine_digits_rejected_with_min_length_error() {
        let info = BasicInfo {
            phone: "041234567".to_string(),
            ..valid_basic_info()
        };
        let errors = info.validate().unwrap_err();
        let phone_errors = &errors.field_errors()["phone"];
        assert_eq!(phone_errors[0].code, "phone_too_short");
    }

    #[test]
    fn test_phone_charset_rejected() {
        let info = BasicInfo {
            phone: "04x2345678".to_string(),
            ..valid_basic_info()
        };
        let errors = info.validate().unwrap_err();
        assert_eq!(errors.field_errors()["phone"][0].code, "phone_charset");
    }

    #[test]
    fn test_abn_boundary_lengths() {
        let mut details = BusinessDetails {
            business_name: "Dale's Plumbing".to_string(),
            abn: "12345678901".to_string(), // 11 digits
            ..BusinessDetails::default()
        };
        assert!(details.validate().is_ok());

        details.abn = "1234567890".to_string(); // 10 digits
        assert!(details.validate().is_err());

        details.abn = "123456789012".to_string(); // 12 digits
        assert!(details.validate().is_err());
    }

    #[test]
    fn test_expiry_dates() {
        let future = Utc::now().date_naive() + Duration::days(365);

        let mut details = BusinessDetails {
            business_name: "Dale's Plumbing".to_string(),
            abn: "12345678901".to_string(),
            license_expiry: Some(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()),
            ..BusinessDetails::default()
        };
        let errors = details.validate().unwrap_err();
        assert_eq!(
            errors.field_errors()["license_expiry"][0].code,
            "expiry_in_past"
        );

        details.license_expiry = Some(future);
        assert!(details.validate().is_ok());
    }

    #[test]
    fn test_service_area_xor() {
        let both = ServiceAreaInput {
            postcodes: vec!["3000".to_string()],
            radius_km: Some(25.0),
        };
        assert!(both.validate().is_err());

        let neither = ServiceAreaInput::default();
        assert!(neither.validate().is_err());

        let postcodes_only = ServiceAreaInput {
            postcodes: vec!["3000".to_string(), "3051".to_string()],
            radius_km: None,
        };
        assert!(postcodes_only.validate().is_ok());

        let radius_only = ServiceAreaInput {
            postcodes: vec![],
            radius_km: Some(25.0),
        };
        assert!(radius_only.validate().is_ok());
    }

    #[test]
    fn test_service_area_postcode_format() {
        let bad = ServiceAreaInput {
            postcodes: vec!["30000".to_string()],
            radius_km: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_template_segment_bound() {
        let ok = TemplateInput {
            kind: TemplateKind::MissedCall,
            body: "a".repeat(MAX_SMS_SEGMENT_CHARS as usize),
        };
        assert!(ok.validate().is_ok());

        let too_long = TemplateInput {
            kind: TemplateKind::MissedCall,
            body: "a".repeat(MAX_SMS_SEGMENT_CHARS as usize + 1),
        };
        assert!(too_long.validate().is_err());
    }
}
