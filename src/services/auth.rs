// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Hosted auth service client and session-change notifications.
//!
//! Handles:
//! - Sign-in (password, one-time code, magic link)
//! - Session refresh and sign-out
//! - Typed session-change events (subscribe → handle, drop to unsubscribe)
//!
//! The session token pair is owned by the auth service; this client keeps
//! a read-only snapshot and republishes state transitions as `AuthEvent`s.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{Duration, Utc};
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::error::AppError;
use crate::models::{Session, SessionUser};

/// Buffered events per subscriber before lagging.
const EVENT_CHANNEL_CAPACITY: usize = 32;

// ─── Session-Change Events ───────────────────────────────────────

/// A session state transition, as pushed by the auth service.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

/// Publisher for session-change notifications.
#[derive(Clone)]
pub struct AuthEvents {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Subscribe to session changes. Dropping the returned handle
    /// unsubscribes; there is nothing else to clean up.
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Publish an event to all current subscribers.
    pub fn emit(&self, event: AuthEvent) {
        // send only fails when there are no subscribers, which is fine
        let _ = self.tx.send(event);
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscription handle for session-change notifications.
pub struct AuthSubscription {
    rx: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    /// Receive the next event in delivery order. Returns `None` once the
    /// publisher is gone. A lagged subscriber skips to the oldest
    /// retained event rather than erroring.
    pub async fn next(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Auth event subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

// ─── Auth Client ─────────────────────────────────────────────────

/// Client for the hosted auth service.
#[derive(Clone)]
pub struct AuthClient {
    backend: AuthBackend,
    /// Read-only snapshot of the current session.
    session: Arc<RwLock<Option<Session>>>,
    events: AuthEvents,
}

#[derive(Clone)]
enum AuthBackend {
    Rest(RestAuth),
    Mock(Arc<MockAuth>),
}

#[derive(Clone)]
struct RestAuth {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

/// Token grant response from the auth endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    /// Seconds until the access token expires
    expires_in: i64,
    user: SessionUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: (Utc::now() + Duration::seconds(self.expires_in)).to_rfc3339(),
            user: self.user,
        }
    }
}

impl AuthClient {
    /// Create a client against the hosted auth endpoint.
    pub fn new(platform_url: &str, anon_key: &str) -> Self {
        Self {
            backend: AuthBackend::Rest(RestAuth {
                http: reqwest::Client::new(),
                base_url: format!("{}/auth/v1", platform_url.trim_end_matches('/')),
                anon_key: anon_key.to_string(),
            }),
            session: Arc::new(RwLock::new(None)),
            events: AuthEvents::new(),
        }
    }

    /// Create a mock client with seeded accounts, for tests and dev.
    pub fn new_mock() -> Self {
        Self {
            backend: AuthBackend::Mock(Arc::new(MockAuth::default())),
            session: Arc::new(RwLock::new(None)),
            events: AuthEvents::new(),
        }
    }

    /// The session-change event publisher (subscribe here).
    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    /// Seed a mock account. No-op on the REST backend.
    pub fn seed_mock_account(&self, email: &str, password: &str, otp_code: Option<&str>) {
        if let AuthBackend::Mock(mock) = &self.backend {
            mock.seed(email, password, otp_code);
        }
    }

    /// Current session snapshot (no network).
    pub fn get_session(&self) -> Option<Session> {
        self.session.read().unwrap().clone()
    }

    /// Current session, refreshed first if it is about to expire.
    pub async fn ensure_session(&self) -> Result<Option<Session>, AppError> {
        let snapshot = self.get_session();
        match snapshot {
            Some(session) if session.is_expiring() => self.refresh_session().await.map(Some),
            other => Ok(other),
        }
    }

    // ─── Sign-In Strategies ──────────────────────────────────────

    /// Password grant.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        let session = match &self.backend {
            AuthBackend::Mock(mock) => mock.password_grant(email, password)?,
            AuthBackend::Rest(rest) => {
                let url = format!("{}/token?grant_type=password", rest.base_url);
                let body = serde_json::json!({ "email": email, "password": password });
                rest.token_request(&url, &body).await?.into_session()
            }
        };
        self.store_session(session.clone(), AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// Request a one-time code be sent to `email`.
    pub async fn sign_in_with_otp(&self, email: &str) -> Result<(), AppError> {
        match &self.backend {
            AuthBackend::Mock(mock) => mock.require_account(email).map(|_| ()),
            AuthBackend::Rest(rest) => {
                let url = format!("{}/otp", rest.base_url);
                let body = serde_json::json!({ "email": email, "create_user": false });
                rest.post_no_body(&url, &body).await
            }
        }
    }

    /// Verify a one-time code and establish a session.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<Session, AppError> {
        let session = match &self.backend {
            AuthBackend::Mock(mock) => mock.otp_grant(email, code)?,
            AuthBackend::Rest(rest) => {
                let url = format!("{}/verify", rest.base_url);
                let body = serde_json::json!({ "type": "email", "email": email, "token": code });
                rest.token_request(&url, &body).await?.into_session()
            }
        };
        self.store_session(session.clone(), AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// Send a magic link that redirects back to the frontend.
    pub async fn send_magic_link(&self, email: &str, redirect_to: &str) -> Result<(), AppError> {
        match &self.backend {
            AuthBackend::Mock(mock) => mock.require_account(email).map(|_| ()),
            AuthBackend::Rest(rest) => {
                let url = format!("{}/otp", rest.base_url);
                let body = serde_json::json!({
                    "email": email,
                    "create_user": true,
                    "redirect_to": redirect_to,
                });
                rest.post_no_body(&url, &body).await
            }
        }
    }

    /// Install a session obtained out of band (dev session injection).
    pub fn inject_session(&self, session: Session) {
        self.store_session(session.clone(), AuthEvent::SignedIn(session));
    }

    // ─── Session Lifecycle ───────────────────────────────────────

    /// Refresh the current session using its refresh token.
    pub async fn refresh_session(&self) -> Result<Session, AppError> {
        let current = self
            .get_session()
            .ok_or_else(|| AppError::AuthApi("No session to refresh".to_string()))?;

        let session = match &self.backend {
            AuthBackend::Mock(mock) => mock.refresh_grant(&current)?,
            AuthBackend::Rest(rest) => {
                let url = format!("{}/token?grant_type=refresh_token", rest.base_url);
                let body = serde_json::json!({ "refresh_token": current.refresh_token });
                rest.token_request(&url, &body).await?.into_session()
            }
        };
        self.store_session(session.clone(), AuthEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }

    /// Sign out: revoke the session server-side, drop the local snapshot.
    pub async fn sign_out(&self) -> Result<(), AppError> {
        let current = self.get_session();

        if let (AuthBackend::Rest(rest), Some(session)) = (&self.backend, &current) {
            let url = format!("{}/logout", rest.base_url);
            // Server-side revocation failure still clears local state
            if let Err(e) = rest.post_authed(&url, &session.access_token).await {
                tracing::warn!(error = %e, "Sign-out revocation failed, clearing local session");
            }
        }

        *self.session.write().unwrap() = None;
        self.events.emit(AuthEvent::SignedOut);
        Ok(())
    }

    fn store_session(&self, session: Session, event: AuthEvent) {
        *self.session.write().unwrap() = Some(session);
        self.events.emit(event);
    }
}

impl RestAuth {
    async fn token_request(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::AuthApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::AuthApi(format!("HTTP {}: {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::AuthApi(format!("JSON parse error: {}", e)))
    }

    async fn post_no_body(&self, url: &str, body: &serde_json::Value) -> Result<(), AppError> {
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::AuthApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::AuthApi(format!("HTTP {}: {}", status, text)));
        }
        Ok(())
    }

    async fn post_authed(&self, url: &str, access_token: &str) -> Result<(), AppError> {
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::AuthApi(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::AuthApi(format!("HTTP {}", response.status())));
        }
        Ok(())
    }
}

// ─── Mock Backend ────────────────────────────────────────────────

/// Seeded accounts for tests and dev-login.
#[derive(Default)]
struct MockAuth {
    /// email → (password, optional fixed OTP code)
    accounts: Mutex<HashMap<String, (String, Option<String>)>>,
}

impl MockAuth {
    fn seed(&self, email: &str, password: &str, otp_code: Option<&str>) {
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            (password.to_string(), otp_code.map(str::to_string)),
        );
    }

    fn require_account(&self, email: &str) -> Result<(String, Option<String>), AppError> {
        self.accounts
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .ok_or_else(|| {
                AppError::AuthApi(format!("No account for {} - seed the dev account", email))
            })
    }

    fn session_for(email: &str) -> Session {
        Session {
            access_token: format!("mock-access-{}", email),
            refresh_token: format!("mock-refresh-{}", email),
            expires_at: (Utc::now() + Duration::hours(1)).to_rfc3339(),
            user: SessionUser {
                id: format!("mock-{}", email),
                email: Some(email.to_string()),
                phone: None,
            },
        }
    }

    fn password_grant(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let (stored_password, _) = self.require_account(email)?;
        if stored_password != password {
            return Err(AppError::AuthApi("Invalid login credentials".to_string()));
        }
        Ok(Self::session_for(email))
    }

    fn otp_grant(&self, email: &str, code: &str) -> Result<Session, AppError> {
        let (_, otp) = self.require_account(email)?;
        match otp {
            Some(expected) if expected == code => Ok(Self::session_for(email)),
            _ => Err(AppError::AuthApi("Invalid one-time code".to_string())),
        }
    }

    fn refresh_grant(&self, current: &Session) -> Result<Session, AppError> {
        let email = current
            .user
            .email
            .clone()
            .ok_or_else(|| AppError::AuthApi("Session has no email".to_string()))?;
        self.require_account(&email)?;
        Ok(Self::session_for(&email))
    }
}
