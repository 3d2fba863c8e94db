use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::error::{AppError, RecipientError, Result};
use crate::invite::recipient::{parse_recipient, split_batch, EmailValidator, SyntaxValidator};
use crate::mail::Mailer;
use crate::models::{Community, DispatchOutcome, InvitationContext, InvitationRequest, RecipientInput};

/// Lookup of the community a batch targets
#[async_trait]
pub trait CommunityDirectory: Send + Sync {
    async fn find_community(&self, community_id: &str) -> Result<Option<Community>>;
}

/// Fans a batch of invitations out to the mailer, one independent unit per
/// recipient, and reports every outcome in input order.
#[derive(Clone)]
pub struct InvitationDispatcher {
    mailer: Arc<Mailer>,
    communities: Arc<dyn CommunityDirectory>,
    validator: Arc<dyn EmailValidator>,
    max_in_flight: usize,
    app_url: String,
}

impl InvitationDispatcher {
    pub fn new(
        mailer: Arc<Mailer>,
        communities: Arc<dyn CommunityDirectory>,
        max_in_flight: usize,
        app_url: &str,
    ) -> Self {
        Self {
            mailer,
            communities,
            validator: Arc::new(SyntaxValidator),
            max_in_flight: max_in_flight.max(1),
            app_url: app_url.to_string(),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn EmailValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Dispatch every recipient and wait for all of them.
    ///
    /// Per-recipient failures are returned as data; only an unknown
    /// community fails the call.
    pub async fn dispatch_batch(
        &self,
        recipients: &RecipientInput,
        ctx: &InvitationContext,
    ) -> Result<Vec<DispatchOutcome>> {
        self.dispatch_batch_until(recipients, ctx, std::future::pending())
            .await
    }

    /// Like [`dispatch_batch`](Self::dispatch_batch), but stops when `cancel`
    /// resolves. Sends still in flight are dropped and their slots omitted;
    /// outcomes recorded before that point are kept, in input order.
    pub async fn dispatch_batch_until<C>(
        &self,
        recipients: &RecipientInput,
        ctx: &InvitationContext,
        cancel: C,
    ) -> Result<Vec<DispatchOutcome>>
    where
        C: Future<Output = ()>,
    {
        let community = self
            .communities
            .find_community(&ctx.community_id)
            .await?
            .ok_or_else(|| {
                AppError::Precondition(format!("Community {} not found", ctx.community_id))
            })?;
        let community = &community;

        let entries = split_batch(recipients);
        let total = entries.len();
        let mut slots: Vec<Option<DispatchOutcome>> = vec![None; total];

        let mut pending = stream::iter(entries.into_iter().enumerate())
            .map(|(idx, raw)| async move { (idx, self.dispatch_one(&raw, ctx, community).await) })
            .buffer_unordered(self.max_in_flight);

        tokio::pin!(cancel);
        let mut cancelled = false;
        loop {
            tokio::select! {
                biased;
                next = pending.next() => match next {
                    Some((idx, outcome)) => slots[idx] = Some(outcome),
                    None => break,
                },
                _ = &mut cancel => {
                    cancelled = true;
                    break;
                }
            }
        }
        drop(pending);

        let outcomes: Vec<DispatchOutcome> = slots.into_iter().flatten().collect();
        let failed = outcomes.iter().filter(|o| !o.is_success()).count();

        if cancelled {
            tracing::warn!(
                community_id = %ctx.community_id,
                total,
                recorded = outcomes.len(),
                "Invitation batch cancelled"
            );
        }
        tracing::info!(
            community_id = %ctx.community_id,
            inviter = %ctx.inviter.user_id,
            total,
            sent = outcomes.len() - failed,
            failed,
            "Invitation batch dispatched"
        );

        Ok(outcomes)
    }

    async fn dispatch_one(
        &self,
        raw: &str,
        ctx: &InvitationContext,
        community: &Community,
    ) -> DispatchOutcome {
        let email = parse_recipient(raw);

        if !self.validator.is_valid(&email) {
            tracing::debug!(recipient = %email, "Skipping malformed recipient");
            return DispatchOutcome::failed(email, &RecipientError::InvalidAddress);
        }

        let request = InvitationRequest::new(&email, ctx, community, &self.app_url);
        match self.mailer.send_invitation(&request).await {
            Ok(()) => {
                tracing::debug!(recipient = %email, "Invitation sent");
                DispatchOutcome::sent(email)
            }
            Err(err) => {
                tracing::warn!(recipient = %email, error = %err, "Invitation send failed");
                DispatchOutcome::failed(email, &RecipientError::Send(err))
            }
        }
    }
}
