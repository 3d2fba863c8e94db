use serde::{Deserialize, Serialize};

use crate::error::RecipientError;
use crate::models::{Community, Inviter};

/// Recipients as callers send them: one comma-joined string or a list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RecipientInput {
    Joined(String),
    List(Vec<String>),
}

impl Default for RecipientInput {
    fn default() -> Self {
        RecipientInput::Joined(String::new())
    }
}

/// Shared context for every invitation in one batch
#[derive(Debug, Clone)]
pub struct InvitationContext {
    pub inviter: Inviter,
    pub community_id: String,
    pub message: Option<String>,
    pub moderator: bool,
    pub subject: Option<String>,
}

/// Payload for a single downstream invitation send, built fresh per recipient
#[derive(Debug, Clone, PartialEq)]
pub struct InvitationRequest {
    pub recipient: String,
    pub inviter_name: String,
    pub inviter_email: String,
    pub community_name: String,
    pub community_slug: String,
    pub community_url: String,
    pub message: Option<String>,
    pub moderator: bool,
    pub subject: Option<String>,
}

impl InvitationRequest {
    pub fn new(recipient: &str, ctx: &InvitationContext, community: &Community, app_url: &str) -> Self {
        Self {
            recipient: recipient.to_string(),
            inviter_name: ctx.inviter.name.clone(),
            inviter_email: ctx.inviter.email.clone(),
            community_name: community.name.clone(),
            community_slug: community.slug.clone(),
            community_url: community.url(app_url),
            message: ctx
                .message
                .as_deref()
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            moderator: ctx.moderator,
            subject: ctx.subject.clone(),
        }
    }
}

/// Per-recipient result of a batch; `error` is null on success
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub email: String,
    pub error: Option<String>,
}

impl DispatchOutcome {
    pub fn sent(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            error: None,
        }
    }

    pub fn failed(email: impl Into<String>, error: &RecipientError) -> Self {
        Self {
            email: email.into(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Body of `POST /communities/{community_id}/invite`
#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    #[serde(default)]
    pub emails: RecipientInput,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub moderator: bool,
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InviteResponse {
    pub results: Vec<DispatchOutcome>,
}
