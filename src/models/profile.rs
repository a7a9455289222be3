// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Profile model for storage and API.
//!
//! The profile is the application-level user record, distinct from the raw
//! auth identity. Keyed by the auth user id; created server-side on first
//! sign-up and mutated through onboarding and settings edits.

use serde::{Deserialize, Serialize};

/// Application role of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Tradie,
    Admin,
}

/// Validated service-area definition.
///
/// Exactly one variant holds once onboarding completes: an explicit
/// postcode set or a radius from the business address, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceArea {
    Postcodes(Vec<String>),
    RadiusKm(f64),
}

/// Profile row stored by the platform, keyed by auth user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Auth user id (also the row key)
    pub user_id: String,
    pub display_name: String,
    /// Normalized Australian phone number (digits only, leading 0)
    pub phone: String,
    pub address: Option<String>,
    pub role: Role,

    // --- Business fields (tradie role) ---
    pub business_name: Option<String>,
    /// Australian Business Number, exactly 11 digits
    pub abn: Option<String>,
    pub license_number: Option<String>,
    /// License expiry (ISO 8601 date)
    pub license_expiry: Option<String>,
    pub insurance_policy: Option<String>,
    /// Insurance expiry (ISO 8601 date)
    pub insurance_expiry: Option<String>,

    // --- Service area (exactly one populated after onboarding) ---
    pub service_postcodes: Option<Vec<String>>,
    pub service_radius_km: Option<f64>,

    // --- Onboarding state ---
    pub onboarding_completed: bool,
    /// Step cursor persisted on submission ("complete" once done)
    pub onboarding_step: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

impl Profile {
    /// The validated service area, or `None` when the row predates
    /// onboarding completion or violates the exclusive-or invariant.
    pub fn service_area(&self) -> Option<ServiceArea> {
        match (&self.service_postcodes, self.service_radius_km) {
            (Some(postcodes), None) if !postcodes.is_empty() => {
                Some(ServiceArea::Postcodes(postcodes.clone()))
            }
            (None, Some(radius)) if radius > 0.0 => Some(ServiceArea::RadiusKm(radius)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_profile() -> Profile {
        Profile {
            user_id: "user-1".to_string(),
            display_name: "Dale Plumber".to_string(),
            phone: "0412345678".to_string(),
            address: None,
            role: Role::Tradie,
            business_name: None,
            abn: None,
            license_number: None,
            license_expiry: None,
            insurance_policy: None,
            insurance_expiry: None,
            service_postcodes: None,
            service_radius_km: None,
            onboarding_completed: false,
            onboarding_step: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_service_area_postcodes() {
        let mut profile = base_profile();
        profile.service_postcodes = Some(vec!["3000".to_string(), "3051".to_string()]);
        assert_eq!(
            profile.service_area(),
            Some(ServiceArea::Postcodes(vec![
                "3000".to_string(),
                "3051".to_string()
            ]))
        );
    }

    #[test]
    fn test_service_area_radius() {
        let mut profile = base_profile();
        profile.service_radius_km = Some(25.0);
        assert_eq!(profile.service_area(), Some(ServiceArea::RadiusKm(25.0)));
    }

    #[test]
    fn test_service_area_invalid_shapes() {
        // Neither populated
        assert_eq!(base_profile().service_area(), None);

        // Both populated violates the invariant
        let mut both = base_profile();
        both.service_postcodes = Some(vec!["3000".to_string()]);
        both.service_radius_km = Some(10.0);
        assert_eq!(both.service_area(), None);

        // Empty postcode list counts as unset
        let mut empty = base_profile();
        empty.service_postcodes = Some(vec![]);
        assert_eq!(empty.service_area(), None);
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Tradie).unwrap(), "\"tradie\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }
}
