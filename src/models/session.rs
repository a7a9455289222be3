// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Session and identity types issued by the hosted auth service.
//!
//! The session token pair is owned by the auth service; this crate only
//! holds a read-only view and never mints access tokens itself (the
//! dev-session function is the one privileged exception).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Margin before expiry at which a session counts as expiring (5 minutes).
const SESSION_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Minimal identity claims associated with a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Stable user identifier (UUID issued by the auth service)
    pub id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Opaque session token pair plus expiry, as returned by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Expiry of the access token (RFC3339)
    pub expires_at: String,
    pub user: SessionUser,
}

impl Session {
    /// True if the access token expires within the refresh margin.
    ///
    /// An unparseable expiry counts as expiring, forcing a refresh.
    pub fn is_expiring(&self) -> bool {
        let margin = Duration::seconds(SESSION_REFRESH_MARGIN_SECS);
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires_at) => Utc::now() + margin >= expires_at.with_timezone(&Utc),
            Err(_) => true,
        }
    }
}

/// Claims we care about when peeking into a platform access token.
#[derive(Debug, Deserialize)]
struct PeekedClaims {
    sub: String,
    exp: i64,
}

/// Decode the payload of a JWT without verifying the signature.
///
/// Client-side only: lets the auth client learn the token's subject and
/// expiry without holding the signing secret. Verification happens
/// server-side in the auth middleware.
pub fn peek_token_claims(token: &str) -> Option<(String, DateTime<Utc>)> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: PeekedClaims = serde_json::from_slice(&bytes).ok()?;
    let exp = DateTime::from_timestamp(claims.exp, 0)?;
    Some((claims.sub, exp))
}
