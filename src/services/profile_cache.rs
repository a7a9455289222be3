// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Per-user profile cache with single-flight fetches.
//!
//! Guarantees at most one in-flight backing read per user id: the marker
//! is set before the read begins and cleared on completion or failure. A
//! second concurrent caller observes the marker and returns immediately
//! (`ProfileFetch::InFlight`) instead of issuing a duplicate read or
//! awaiting the first.
//!
//! Entries never expire within a process. They are cleared wholesale on
//! logout and superseded by `insert` after a profile mutation. A timed-out
//! read caches nothing; the next explicit call retries.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::db::PlatformDb;
use crate::error::AppError;
use crate::models::Profile;

/// Hard deadline on a profile read.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Outcome of a cache lookup.
#[derive(Debug, Clone)]
pub enum ProfileFetch {
    /// Served from cache, no network.
    Hit(Profile),
    /// Fetched from the backing store; `None` means no row yet (a
    /// brand-new user), which is expected and not an error.
    Fetched(Option<Profile>),
    /// Another fetch for this user is already in flight; this caller
    /// declined to issue a duplicate.
    InFlight,
}

/// Process-local profile cache keyed by user id.
#[derive(Clone)]
pub struct ProfileCache {
    db: PlatformDb,
    entries: Arc<DashMap<String, Profile>>,
    in_flight: Arc<DashMap<String, ()>>,
}

impl ProfileCache {
    pub fn new(db: PlatformDb) -> Self {
        Self {
            db,
            entries: Arc::new(DashMap::new()),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    /// Look up a profile, fetching from the backing store on a miss.
    ///
    /// Errors (transport, timeout) clear the in-flight marker and cache
    /// nothing; a missing row is `Fetched(None)`.
    pub async fn get_or_fetch(&self, user_id: &str) -> Result<ProfileFetch, AppError> {
        if let Some(entry) = self.entries.get(user_id) {
            return Ok(ProfileFetch::Hit(entry.clone()));
        }

        // Set the marker before the read begins; a concurrent caller that
        // finds it set skips without awaiting.
        if self
            .in_flight
            .insert(user_id.to_string(), ())
            .is_some()
        {
            tracing::debug!(user_id, "Profile fetch already in flight, skipping");
            return Ok(ProfileFetch::InFlight);
        }

        let result = tokio::time::timeout(FETCH_TIMEOUT, self.db.get_profile(user_id)).await;

        // Cleared on completion or failure, before any early return
        self.in_flight.remove(user_id);

        let profile = match result {
            Ok(Ok(profile)) => profile,
            Ok(Err(e)) => {
                tracing::warn!(user_id, error = %e, "Profile fetch failed");
                return Err(e);
            }
            Err(_) => {
                tracing::warn!(user_id, "Profile fetch timed out");
                return Err(AppError::Timeout(format!("profile fetch for {}", user_id)));
            }
        };

        if let Some(profile) = &profile {
            self.entries.insert(user_id.to_string(), profile.clone());
        }
        Ok(ProfileFetch::Fetched(profile))
    }

    /// Cached profile, if any (no fetch).
    pub fn peek(&self, user_id: &str) -> Option<Profile> {
        self.entries.get(user_id).map(|entry| entry.clone())
    }

    /// Supersede the cached entry after a mutation.
    pub fn insert(&self, profile: Profile) {
        self.entries.insert(profile.user_id.clone(), profile);
    }

    /// Drop one user's entry (forces a re-fetch on next lookup).
    pub fn invalidate(&self, user_id: &str) {
        self.entries.remove(user_id);
    }

    /// Wholesale clear, on logout. A subsequent login for a different
    /// user must never observe the previous user's profile.
    pub fn clear(&self) {
        self.entries.clear();
        tracing::debug!("Profile cache cleared");
    }
}
