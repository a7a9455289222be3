// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

use std::sync::Arc;
use tradielink::config::Config;
use tradielink::db::PlatformDb;
use tradielink::middleware::auth::create_jwt;
use tradielink::routes::create_router;
use tradielink::AppState;

/// Create a test app with the in-memory backend.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = PlatformDb::new_in_memory();

    let state = Arc::new(AppState { config, db });

    (create_router(state.clone()), state)
}

/// Mint a platform-compatible JWT for a test user.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, secret: &[u8]) -> String {
    create_jwt(user_id, Some("test@tradielink.test"), secret).expect("JWT creation should succeed")
}
