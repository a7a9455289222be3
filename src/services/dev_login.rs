// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Dev-login: authenticate as the seeded development identity.
//!
//! One service, one strategy enum. Replaces the historical pile of
//! per-strategy helper modules; credentials come from configuration,
//! never from source. Refuses to run in production.

use crate::config::{Config, DevLoginConfig, Environment};
use crate::error::AppError;
use crate::models::Session;
use crate::services::auth::AuthClient;

/// How to authenticate as the seeded dev identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevLoginStrategy {
    /// Password sign-in; falls back to `Otp` when a code is configured.
    Password,
    /// One-time code verification with the seeded fixed code.
    Otp,
    /// Privileged direct session injection via the dev-session function.
    SessionInjection,
}

/// Explicitly constructed, dependency-injected dev-login service.
pub struct DevLoginService {
    auth: AuthClient,
    http: reqwest::Client,
    /// Base URL of this deployment's function service
    service_url: String,
    environment: Environment,
    service_role_key: String,
    credentials: Option<DevLoginConfig>,
}

impl DevLoginService {
    pub fn new(auth: AuthClient, config: &Config, service_url: &str) -> Self {
        Self {
            auth,
            http: reqwest::Client::new(),
            service_url: service_url.trim_end_matches('/').to_string(),
            environment: config.environment,
            service_role_key: config.service_role_key.clone(),
            credentials: config.dev_login.clone(),
        }
    }

    /// Authenticate with the given strategy. The resulting session is
    /// installed into the auth client, so the reconciler picks it up
    /// through the normal event flow.
    pub async fn login(&self, strategy: DevLoginStrategy) -> Result<Session, AppError> {
        if self.environment == Environment::Production {
            return Err(AppError::BadRequest(
                "Dev login is disabled in production".to_string(),
            ));
        }

        let credentials = self.credentials.as_ref().ok_or_else(|| {
            AppError::BadRequest(
                "Dev login not configured - set DEV_LOGIN_EMAIL and DEV_LOGIN_PASSWORD".to_string(),
            )
        })?;

        match strategy {
            DevLoginStrategy::Password => self.password_with_fallback(credentials).await,
            DevLoginStrategy::Otp => self.otp(credentials).await,
            DevLoginStrategy::SessionInjection => self.inject(credentials).await,
        }
    }

    async fn password_with_fallback(
        &self,
        credentials: &DevLoginConfig,
    ) -> Result<Session, AppError> {
        match self
            .auth
            .sign_in_with_password(&credentials.email, &credentials.password)
            .await
        {
            Ok(session) => Ok(session),
            Err(e) if credentials.otp_code.is_some() => {
                tracing::warn!(error = %e, "Password dev login failed, falling back to OTP");
                self.otp(credentials).await
            }
            Err(e) => Err(AppError::AuthApi(format!(
                "Password dev login failed ({}). Seed the dev account with the setup script",
                e
            ))),
        }
    }

    async fn otp(&self, credentials: &DevLoginConfig) -> Result<Session, AppError> {
        let code = credentials.otp_code.as_ref().ok_or_else(|| {
            AppError::BadRequest("OTP dev login requires DEV_LOGIN_OTP_CODE".to_string())
        })?;

        self.auth.sign_in_with_otp(&credentials.email).await?;
        self.auth.verify_otp(&credentials.email, code).await
    }

    /// Ask the dev-session function to mint a session, then install it.
    async fn inject(&self, credentials: &DevLoginConfig) -> Result<Session, AppError> {
        let url = format!("{}/functions/dev-session", self.service_url);

        let response = self
            .http
            .post(&url)
            .header("x-service-key", &self.service_role_key)
            .json(&serde_json::json!({ "email": credentials.email }))
            .send()
            .await
            .map_err(|e| AppError::AuthApi(format!("Dev-session request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AuthApi(format!(
                "Dev-session function returned HTTP {}: {}",
                status, body
            )));
        }

        let session: Session = response
            .json()
            .await
            .map_err(|e| AppError::AuthApi(format!("JSON parse error: {}", e)))?;

        self.auth.inject_session(session.clone());
        Ok(session)
    }
}
