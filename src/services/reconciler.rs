// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Auth reconciliation workflow.
//!
//! Keeps a local (session, user, profile, loading) view consistent with
//! the auth service, without redundant profile fetches. Session-change
//! events are processed strictly in delivery order. The combined
//! `loading` flag is true while the initial session check or a profile
//! fetch is pending; consumers must not render role-gated UI until it
//! clears.
//!
//! Profile fetch failures (including the hard fetch timeout) are logged
//! and resolve to "no profile" - a valid state meaning incomplete signup,
//! never an error surfaced to the render path.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::{Profile, Session, SessionUser};
use crate::services::auth::{AuthClient, AuthEvent, AuthSubscription};
use crate::services::profile_cache::{ProfileCache, ProfileFetch};

/// Combined readiness view exposed to the rest of the application.
#[derive(Debug, Clone)]
pub struct AuthView {
    pub session: Option<Session>,
    pub user: Option<SessionUser>,
    pub profile: Option<Profile>,
    /// True while the session check or a profile fetch is pending.
    pub loading: bool,
}

impl AuthView {
    fn signed_out() -> Self {
        Self {
            session: None,
            user: None,
            profile: None,
            loading: false,
        }
    }
}

/// Handle to a running reconciliation task.
pub struct AuthReconciler {
    task: JoinHandle<()>,
}

impl AuthReconciler {
    /// Start reconciling from an initial session snapshot and an event
    /// subscription. Returns the handle and a watch receiver for the
    /// combined view.
    ///
    /// An initial session triggers exactly one profile fetch; the view
    /// starts with `loading: true` in that case.
    pub fn start(
        initial_session: Option<Session>,
        subscription: AuthSubscription,
        cache: ProfileCache,
    ) -> (Self, watch::Receiver<AuthView>) {
        let initial = AuthView {
            user: initial_session.as_ref().map(|s| s.user.clone()),
            loading: initial_session.is_some(),
            session: initial_session.clone(),
            profile: None,
        };
        let (tx, rx) = watch::channel(initial);

        let task = tokio::spawn(run(initial_session, subscription, cache, tx));
        (Self { task }, rx)
    }

    /// Convenience wiring from a live auth client: synchronous session
    /// snapshot plus a fresh subscription.
    pub fn start_from(auth: &AuthClient, cache: ProfileCache) -> (Self, watch::Receiver<AuthView>) {
        Self::start(auth.get_session(), auth.events().subscribe(), cache)
    }

    /// Tear down: stops event processing and drops the subscription.
    /// In-flight fetch results are discarded, not awaited.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

async fn run(
    initial_session: Option<Session>,
    mut subscription: AuthSubscription,
    cache: ProfileCache,
    tx: watch::Sender<AuthView>,
) {
    if let Some(session) = initial_session {
        resolve_profile(&cache, &tx, session).await;
    } else {
        tx.send_modify(|view| view.loading = false);
    }

    while let Some(event) = subscription.next().await {
        match event {
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => {
                let cached_owner = tx.borrow().profile.as_ref().map(|p| p.user_id.clone());

                if cached_owner.as_deref() == Some(session.user.id.as_str()) {
                    // Same owner: leave the cached profile untouched
                    tx.send_modify(|view| {
                        view.user = Some(session.user.clone());
                        view.session = Some(session);
                        view.loading = false;
                    });
                } else {
                    resolve_profile(&cache, &tx, session).await;
                }
            }
            AuthEvent::SignedOut => {
                cache.clear();
                let _ = tx.send(AuthView::signed_out());
            }
        }
    }

    tracing::debug!("Auth event stream closed, reconciler stopping");
}

/// Fetch the profile for the session's user and publish the result.
/// Failures resolve to "no profile" with loading cleared.
async fn resolve_profile(cache: &ProfileCache, tx: &watch::Sender<AuthView>, session: Session) {
    tx.send_modify(|view| {
        view.user = Some(session.user.clone());
        view.session = Some(session.clone());
        view.loading = true;
    });

    let user_id = session.user.id.clone();
    let profile = match cache.get_or_fetch(&user_id).await {
        Ok(ProfileFetch::Hit(profile)) | Ok(ProfileFetch::Fetched(Some(profile))) => Some(profile),
        // No row yet: expected for a brand-new user
        Ok(ProfileFetch::Fetched(None)) => None,
        // Another flow owns the fetch; keep the current profile only if it
        // belongs to this session's user, never a previous user's
        Ok(ProfileFetch::InFlight) => tx
            .borrow()
            .profile
            .clone()
            .filter(|profile| profile.user_id == user_id),
        Err(e) => {
            tracing::warn!(user_id = %user_id, error = %e, "Profile fetch failed, resolving to no profile");
            None
        }
    };

    tx.send_modify(|view| {
        view.profile = profile;
        view.loading = false;
    });
}
