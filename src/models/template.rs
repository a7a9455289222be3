// SPDX-License-Identifier: MIT
// Copyright 2026 TradieLink Pty Ltd

//! SMS template model.
//!
//! Templates are keyed by (user, kind) and bounded to a single GSM-7 SMS
//! segment so the telephony provider never splits a message. Placeholders
//! like `{name}` and `{business}` are substituted by the outbound send
//! flow, which lives server-side and is out of scope here.

use serde::{Deserialize, Serialize};

/// Maximum body length: one GSM-7 SMS segment.
pub const MAX_SMS_SEGMENT_CHARS: u64 = 160;

/// Template type, one per missed-call touchpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    MissedCall,
    JobUpdate,
    QuoteFollowUp,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 3] = [
        TemplateKind::MissedCall,
        TemplateKind::JobUpdate,
        TemplateKind::QuoteFollowUp,
    ];
}

/// SMS template row, keyed by (user_id, kind).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsTemplate {
    pub user_id: String,
    pub kind: TemplateKind,
    pub body: String,
}

/// Server-side default templates, generated when onboarding submits none.
pub fn default_templates(user_id: &str, business_name: &str) -> Vec<SmsTemplate> {
    let defaults = [
        (
            TemplateKind::MissedCall,
            format!(
                "Hi, you've reached {}. Sorry we missed your call - reply here \
                 with what you need and we'll get back to you ASAP.",
                business_name
            ),
        ),
        (
            TemplateKind::JobUpdate,
            format!(
                "{} here with an update on your job: {{update}}. Reply if you \
                 have any questions.",
                business_name
            ),
        ),
        (
            TemplateKind::QuoteFollowUp,
            format!(
                "Hi {{name}}, just following up on the quote from {}. Let us \
                 know if you'd like to go ahead.",
                business_name
            ),
        ),
    ];

    defaults
        .into_iter()
        .map(|(kind, body)| SmsTemplate {
            user_id: user_id.to_string(),
            kind,
            body,
        })
        .collect()
}
