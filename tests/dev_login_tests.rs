// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Dev-login strategy and dev-session function tests.
//!
//! These tests verify that:
//! 1. Dev login refuses to run in production or without configuration
//! 2. The password strategy falls back to OTP when a code is seeded
//! 3. The dev-session function gates on environment and service key

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tower::ServiceExt;
use tradielink::config::{Config, Environment};
use tradielink::db::PlatformDb;
use tradielink::error::AppError;
use tradielink::models::Session;
use tradielink::routes::create_router;
use tradielink::services::{AuthClient, DevLoginService, DevLoginStrategy};
use tradielink::AppState;

mod common;

fn seeded_service(config: &Config) -> (DevLoginService, AuthClient) {
    let auth = AuthClient::new_mock();
    let dev = config.dev_login.as_ref().unwrap();
    auth.seed_mock_account(&dev.email, &dev.password, dev.otp_code.as_deref());
    (
        DevLoginService::new(auth.clone(), config, "http://localhost:8080"),
        auth,
    )
}

// ─── Strategy Guards ─────────────────────────────────────────────

#[tokio::test]
async fn test_dev_login_disabled_in_production() {
    let mut config = Config::test_default();
    config.environment = Environment::Production;
    let (service, _) = seeded_service(&config);

    for strategy in [
        DevLoginStrategy::Password,
        DevLoginStrategy::Otp,
        DevLoginStrategy::SessionInjection,
    ] {
        let result = service.login(strategy).await;
        assert!(
            matches!(result, Err(AppError::BadRequest(_))),
            "strategy {:?} must be refused in production",
            strategy
        );
    }
}

#[tokio::test]
async fn test_dev_login_requires_configuration() {
    let mut config = Config::test_default();
    config.dev_login = None;
    let service = DevLoginService::new(AuthClient::new_mock(), &config, "http://localhost:8080");

    let result = service.login(DevLoginStrategy::Password).await;
    match result {
        Err(AppError::BadRequest(message)) => {
            assert!(message.contains("DEV_LOGIN_EMAIL"), "error must be actionable")
        }
        other => panic!("expected configuration error, got {:?}", other),
    }
}

// ─── Strategies ──────────────────────────────────────────────────

#[tokio::test]
async fn test_password_strategy_signs_in() {
    let config = Config::test_default();
    let (service, auth) = seeded_service(&config);

    let session = service.login(DevLoginStrategy::Password).await.unwrap();
    assert_eq!(session.user.email.as_deref(), Some("dev@tradielink.test"));
    assert!(auth.get_session().is_some(), "session installed in the client");
}

#[tokio::test]
async fn test_password_falls_back_to_otp() {
    let mut config = Config::test_default();
    // Wrong seeded password: the account exists but the grant fails
    config.dev_login.as_mut().unwrap().password = "stale-password".to_string();
    let auth = AuthClient::new_mock();
    auth.seed_mock_account("dev@tradielink.test", "dev-password", Some("123456"));
    let service = DevLoginService::new(auth.clone(), &config, "http://localhost:8080");

    let session = service.login(DevLoginStrategy::Password).await.unwrap();
    assert_eq!(session.user.email.as_deref(), Some("dev@tradielink.test"));
}

#[tokio::test]
async fn test_password_failure_without_otp_is_actionable() {
    let mut config = Config::test_default();
    let dev = config.dev_login.as_mut().unwrap();
    dev.password = "stale-password".to_string();
    dev.otp_code = None;
    let auth = AuthClient::new_mock();
    auth.seed_mock_account("dev@tradielink.test", "dev-password", None);
    let service = DevLoginService::new(auth, &config, "http://localhost:8080");

    match service.login(DevLoginStrategy::Password).await {
        Err(AppError::AuthApi(message)) => {
            assert!(message.contains("setup script"), "error must say what to do")
        }
        other => panic!("expected auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_otp_strategy_requires_seeded_code() {
    let mut config = Config::test_default();
    config.dev_login.as_mut().unwrap().otp_code = None;
    let (service, _) = seeded_service(&config);

    assert!(matches!(
        service.login(DevLoginStrategy::Otp).await,
        Err(AppError::BadRequest(_))
    ));
}

#[tokio::test]
async fn test_otp_strategy_signs_in() {
    let config = Config::test_default();
    let (service, _) = seeded_service(&config);

    let session = service.login(DevLoginStrategy::Otp).await.unwrap();
    assert_eq!(session.user.email.as_deref(), Some("dev@tradielink.test"));
}

// ─── Dev-Session Function ────────────────────────────────────────

fn dev_session_request(service_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/functions/dev-session")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(key) = service_key {
        builder = builder.header("x-service-key", key);
    }
    builder
        .body(Body::from(
            serde_json::json!({ "email": "dev@tradielink.test" }).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_dev_session_mints_verifiable_jwt() {
    let (app, state) = common::create_test_app();

    let response = app
        .oneshot(dev_session_request(Some("test_service_role_key")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let session: Session = serde_json::from_slice(&body).unwrap();
    assert_eq!(session.user.id, "dev-dev@tradielink.test");

    #[derive(Deserialize)]
    struct Claims {
        sub: String,
        email: Option<String>,
    }
    let decoded = decode::<Claims>(
        &session.access_token,
        &DecodingKey::from_secret(&state.config.jwt_secret),
        &Validation::new(Algorithm::HS256),
    )
    .expect("minted token must verify with the platform secret");
    assert_eq!(decoded.claims.sub, "dev-dev@tradielink.test");
    assert_eq!(decoded.claims.email.as_deref(), Some("dev@tradielink.test"));
}

#[tokio::test]
async fn test_dev_session_rejects_bad_service_key() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(dev_session_request(Some("wrong-key")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (app, _state) = common::create_test_app();
    let response = app.oneshot(dev_session_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dev_session_absent_in_production() {
    let mut config = Config::test_default();
    config.environment = Environment::Production;
    let state = Arc::new(AppState {
        config,
        db: PlatformDb::new_in_memory(),
    });
    let app = create_router(state);

    let response = app
        .oneshot(dev_session_request(Some("test_service_role_key")))
        .await
        .unwrap();
    // Pretends not to exist rather than admitting it is disabled
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
