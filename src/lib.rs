// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! TradieLink: missed-call-to-SMS lead capture for Australian tradies.
//!
//! This crate is the application core: the hosted-auth session workflow
//! (client, reconciler, profile cache), the onboarding wizard, and the
//! server-side onboarding-completion function service.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::PlatformDb;

/// Shared state for the function service.
pub struct AppState {
    pub config: Config,
    pub db: PlatformDb,
}
