// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! Typed client for the hosted platform's row endpoint.
//!
//! Provides high-level operations for:
//! - Profiles (application user records)
//! - SMS templates (keyed by user and template kind)
//!
//! The REST backend speaks the platform's PostgREST conventions. The
//! in-memory backend backs tests and local development without network;
//! it also exposes instrumentation (read counts, injected delays and
//! failures) that the integration tests rely on.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{stream, StreamExt};

use crate::db::tables;
use crate::error::AppError;
use crate::models::{Profile, SmsTemplate, TemplateKind};

const MAX_CONCURRENT_WRITES: usize = 4;

/// Platform database client.
#[derive(Clone)]
pub struct PlatformDb {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Rest(RestBackend),
    Memory(Arc<MemoryBackend>),
}

#[derive(Clone)]
struct RestBackend {
    http: reqwest::Client,
    base_url: String,
    service_role_key: String,
}

impl PlatformDb {
    /// Create a client against the hosted platform's REST endpoint.
    pub fn new(platform_url: &str, service_role_key: &str) -> Self {
        Self {
            backend: Backend::Rest(RestBackend {
                http: reqwest::Client::new(),
                base_url: format!("{}/rest/v1", platform_url.trim_end_matches('/')),
                service_role_key: service_role_key.to_string(),
            }),
        }
    }

    /// Create an in-memory client for tests and offline development.
    pub fn new_in_memory() -> Self {
        Self {
            backend: Backend::Memory(Arc::new(MemoryBackend::default())),
        }
    }

    /// Access the in-memory backend's instrumentation, if this client is
    /// in-memory. Returns `None` for the REST backend.
    pub fn memory(&self) -> Option<&MemoryBackend> {
        match &self.backend {
            Backend::Memory(mem) => Some(mem),
            Backend::Rest(_) => None,
        }
    }

    // ─── Profile Operations ──────────────────────────────────────

    /// Get a profile by auth user id. A missing row is `Ok(None)`, never
    /// an error: brand-new users have no profile yet.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        match &self.backend {
            Backend::Memory(mem) => mem.get_profile(user_id).await,
            Backend::Rest(rest) => {
                let url = format!(
                    "{}/{}?user_id=eq.{}&limit=1",
                    rest.base_url,
                    tables::PROFILES,
                    urlencoding::encode(user_id)
                );
                let rows: Vec<Profile> = rest.get_json(&url).await?;
                Ok(rows.into_iter().next())
            }
        }
    }

    /// Create or update a profile. The platform merges on the `user_id`
    /// key, so re-submission overwrites rather than duplicates.
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => mem.upsert_profile(profile),
            Backend::Rest(rest) => {
                let url = format!("{}/{}", rest.base_url, tables::PROFILES);
                rest.upsert(&url, &[profile]).await
            }
        }
    }

    // ─── Template Operations ─────────────────────────────────────

    /// Get all SMS templates for a user.
    pub async fn get_templates(&self, user_id: &str) -> Result<Vec<SmsTemplate>, AppError> {
        match &self.backend {
            Backend::Memory(mem) => mem.get_templates(user_id),
            Backend::Rest(rest) => {
                let url = format!(
                    "{}/{}?user_id=eq.{}",
                    rest.base_url,
                    tables::SMS_TEMPLATES,
                    urlencoding::encode(user_id)
                );
                rest.get_json(&url).await
            }
        }
    }

    /// Upsert a set of SMS templates, keyed by (user_id, kind).
    ///
    /// Writes run per-record with bounded concurrency so one bad row does
    /// not abort the rest.
    pub async fn upsert_templates(&self, templates: &[SmsTemplate]) -> Result<(), AppError> {
        match &self.backend {
            Backend::Memory(mem) => mem.upsert_templates(templates),
            Backend::Rest(rest) => {
                let url = format!("{}/{}", rest.base_url, tables::SMS_TEMPLATES);
                stream::iter(templates.to_vec())
                    .map(|template| {
                        let url = url.clone();
                        async move { rest.upsert(&url, &[&template]).await }
                    })
                    .buffer_unordered(MAX_CONCURRENT_WRITES)
                    .collect::<Vec<Result<(), AppError>>>()
                    .await
                    .into_iter()
                    .collect::<Result<Vec<()>, AppError>>()?;
                Ok(())
            }
        }
    }
}

impl RestBackend {
    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    async fn get_json<T: for<'de> serde::Deserialize<'de>>(
        &self,
        url: &str,
    ) -> Result<T, AppError> {
        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::check_response_json(response).await
    }

    /// Merge-duplicates upsert: the platform resolves conflicts on the
    /// table's primary key, overwriting existing rows.
    async fn upsert<T: serde::Serialize>(&self, url: &str, rows: &[T]) -> Result<(), AppError> {
        let response = self
            .request(reqwest::Method::POST, url)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&rows)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Database(format!("HTTP {}: {}", status, body)));
        }
        Ok(())
    }

    async fn check_response_json<T: for<'de> serde::Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Database(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Database(format!("JSON parse error: {}", e)))
    }
}

// ─── In-Memory Backend ───────────────────────────────────────────

/// In-memory backend with test instrumentation.
#[derive(Default)]
pub struct MemoryBackend {
    profiles: Mutex<HashMap<String, Profile>>,
    templates: Mutex<HashMap<(String, TemplateKind), SmsTemplate>>,
    profile_reads: AtomicUsize,
    read_delay: Mutex<Option<Duration>>,
    fail_profile_reads: AtomicBool,
    fail_template_writes: AtomicBool,
}

impl MemoryBackend {
    /// Number of profile reads issued so far.
    pub fn profile_read_count(&self) -> usize {
        self.profile_reads.load(Ordering::SeqCst)
    }

    /// Delay every profile read by `delay` (simulates a slow network).
    pub fn set_read_delay(&self, delay: Duration) {
        *self.read_delay.lock().unwrap() = Some(delay);
    }

    /// Make profile reads fail (simulates a transport failure).
    pub fn set_fail_profile_reads(&self, fail: bool) {
        self.fail_profile_reads.store(fail, Ordering::SeqCst);
    }

    /// Make template writes fail (simulates a partial submission failure).
    pub fn set_fail_template_writes(&self, fail: bool) {
        self.fail_template_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of profile rows stored.
    pub fn profile_count(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.profile_reads.fetch_add(1, Ordering::SeqCst);

        let delay = *self.read_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_profile_reads.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "profile read failure (injected)".to_string(),
            ));
        }

        Ok(self.profiles.lock().unwrap().get(user_id).cloned())
    }

    fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    fn get_templates(&self, user_id: &str) -> Result<Vec<SmsTemplate>, AppError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    fn upsert_templates(&self, templates: &[SmsTemplate]) -> Result<(), AppError> {
        if self.fail_template_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database(
                "template write failure (injected)".to_string(),
            ));
        }
        let mut map = self.templates.lock().unwrap();
        for template in templates {
            map.insert(
                (template.user_id.clone(), template.kind),
                template.clone(),
            );
        }
        Ok(())
    }
}
