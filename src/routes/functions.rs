// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Server-side function handlers.
//!
//! `onboarding-complete` implements the submission contract: one call
//! that upserts the profile and the template set. The profile upsert is
//! the sole completion criterion; template creation failure is logged
//! and reported, never fatal. Idempotent under retry: the upsert keys on
//! the user id, so re-submission overwrites.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::post,
    Extension, Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use crate::config::Environment;
use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser};
use crate::models::onboarding::{normalize_phone, OnboardingSubmission};
use crate::models::template::default_templates;
use crate::models::{OnboardingOutcome, Profile, Role, Session, SessionUser, SmsTemplate};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

/// Routes requiring platform JWT auth (layered in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/functions/onboarding-complete", post(onboarding_complete))
}

/// Routes with their own gating (service key, environment).
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/functions/dev-session", post(dev_session))
}

// ─── Onboarding Completion ───────────────────────────────────────

async fn onboarding_complete(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(submission): Json<OnboardingSubmission>,
) -> Result<Json<OnboardingOutcome>> {
    // Server-side re-validation; clients are not trusted to have run the
    // wizard schemas.
    submission.validate()?;

    let now = format_utc_rfc3339(Utc::now());

    // Preserve creation time and role across re-submission
    let existing = state.db.get_profile(&user.user_id).await?;
    let created_at = existing
        .as_ref()
        .map(|p| p.created_at.clone())
        .unwrap_or_else(|| now.clone());
    let role = existing.map(|p| p.role).unwrap_or(Role::Tradie);

    let profile = build_profile(&user.user_id, &submission, role, created_at, now);

    // Fatal: a failed profile upsert aborts completion and surfaces
    state.db.upsert_profile(&profile).await?;

    let templates = if submission.templates.is_empty() {
        default_templates(
            &user.user_id,
            profile
                .business_name
                .as_deref()
                .unwrap_or(&profile.display_name),
        )
    } else {
        submission
            .templates
            .iter()
            .map(|t| SmsTemplate {
                user_id: user.user_id.clone(),
                kind: t.kind,
                body: t.body.clone(),
            })
            .collect()
    };

    // Non-fatal: completion stands on the profile upsert alone
    let templates_created = match state.db.upsert_templates(&templates).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                user_id = %user.user_id,
                error = %e,
                "Template creation failed during onboarding, continuing"
            );
            false
        }
    };

    tracing::info!(
        user_id = %user.user_id,
        templates_created,
        "Onboarding completed"
    );

    Ok(Json(OnboardingOutcome {
        success: true,
        profile_updated: true,
        templates_created,
    }))
}

fn build_profile(
    user_id: &str,
    submission: &OnboardingSubmission,
    role: Role,
    created_at: String,
    now: String,
) -> Profile {
    let area = &submission.service_area;
    // The schema guarantees exactly one side is populated
    let (service_postcodes, service_radius_km) = if area.postcodes.is_empty() {
        (None, area.radius_km)
    } else {
        (Some(area.postcodes.clone()), None)
    };

    let business = &submission.business_details;

    Profile {
        user_id: user_id.to_string(),
        display_name: submission.basic_info.display_name.clone(),
        phone: normalize_phone(&submission.basic_info.phone),
        address: Some(submission.basic_info.address.clone()),
        role,
        business_name: Some(business.business_name.clone()),
        abn: Some(business.abn.clone()),
        license_number: business.license_number.clone(),
        license_expiry: business.license_expiry.map(|d| d.to_string()),
        insurance_policy: business.insurance_policy.clone(),
        insurance_expiry: business.insurance_expiry.map(|d| d.to_string()),
        service_postcodes,
        service_radius_km,
        onboarding_completed: true,
        onboarding_step: Some("complete".to_string()),
        created_at,
        updated_at: now,
    }
}

// ─── Dev Session Injection ───────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
struct DevSessionRequest {
    email: String,
}

/// Mint a session for a seeded dev identity.
///
/// Pretends not to exist in production; otherwise requires the
/// service-role key.
async fn dev_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<DevSessionRequest>,
) -> Result<Json<Session>> {
    if state.config.environment == Environment::Production {
        return Err(AppError::NotFound("dev-session".to_string()));
    }

    let provided_key = headers
        .get("x-service-key")
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    if provided_key != state.config.service_role_key {
        tracing::warn!("Dev-session request with bad service key");
        return Err(AppError::Unauthorized);
    }

    let user_id = format!("dev-{}", request.email);
    let access_token = create_jwt(&user_id, Some(&request.email), &state.config.jwt_secret)?;

    let session = Session {
        access_token,
        refresh_token: format!("dev-refresh-{}", user_id),
        expires_at: (Utc::now() + chrono::Duration::hours(1)).to_rfc3339(),
        user: SessionUser {
            id: user_id.clone(),
            email: Some(request.email),
            phone: None,
        },
    };

    tracing::info!(user_id = %user_id, "Dev session minted");
    Ok(Json(session))
}
