pub mod sendwithus;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{MailError, Result};
use crate::models::InvitationRequest;
use crate::reply::ReplyAddressCodec;

pub use sendwithus::SendWithUsClient;

pub const NEW_PROJECT_POST_TEMPLATE: &str = "tem_bG7zNWk3sqbLKkg2TLcYgE";
pub const PROJECT_INVITATION_TEMPLATE: &str = "tem_5karBhDbANcCEmrvuuQtgn";
pub const PASSWORD_RESET_TEMPLATE: &str = "tem_mccpcJNEzS4822mAnDNmGT";
pub const INVITATION_TEMPLATE: &str = "tem_ZXZuvouDYKKhCrdEWYbEp9";
pub const NEW_COMMENT_TEMPLATE: &str = "tem_tP6JzrYzvvDXhgTNmtkxuW";
pub const POST_MENTION_TEMPLATE: &str = "tem_wXiqtyNzAr8EF4fqBna5WQ";
pub const COMMUNITY_DIGEST_TEMPLATE: &str = "tem_rkZiuPHBvLDFrZ6rv8VixH";

const INVITATION_VERSION: &str = "user-edited text";

/// Replaces parts of the default sender identity for one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SenderOverride {
    pub name: Option<String>,
    pub reply_to: Option<String>,
}

/// One templated message for the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplatedEmail {
    pub template_id: String,
    pub recipient: String,
    pub data: Value,
    pub sender: Option<SenderOverride>,
    pub version_name: Option<String>,
}

impl TemplatedEmail {
    pub fn new(template_id: &str, recipient: &str, data: Value) -> Self {
        Self {
            template_id: template_id.to_string(),
            recipient: recipient.to_string(),
            data,
            sender: None,
            version_name: None,
        }
    }

    pub fn with_sender(mut self, sender: SenderOverride) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_version(mut self, version_name: Option<String>) -> Self {
        self.version_name = version_name;
        self
    }
}

/// Capability that transmits one templated email.
#[async_trait]
pub trait Sender: Send + Sync {
    async fn send(&self, email: TemplatedEmail) -> std::result::Result<(), MailError>;
}

/// Notification about activity on a post; replies are routed back through
/// an encrypted reply address for (post, recipient user).
#[derive(Debug, Clone)]
pub struct PostNotification {
    pub email: String,
    pub post_id: String,
    pub user_id: String,
    pub data: Value,
    pub sender_name: Option<String>,
    pub version: Option<String>,
}

/// Template catalogue over an injected [`Sender`]
#[derive(Clone)]
pub struct Mailer {
    sender: Arc<dyn Sender>,
    reply_codec: Arc<ReplyAddressCodec>,
    sender_name: String,
}

impl Mailer {
    pub fn new(sender: Arc<dyn Sender>, reply_codec: Arc<ReplyAddressCodec>, sender_name: &str) -> Self {
        Self {
            sender,
            reply_codec,
            sender_name: sender_name.to_string(),
        }
    }

    /// Send one community invitation on behalf of the inviter
    pub async fn send_invitation(&self, request: &InvitationRequest) -> std::result::Result<(), MailError> {
        let data = json!({
            "inviter_name": request.inviter_name,
            "inviter_email": request.inviter_email,
            "community_name": request.community_name,
            "community_slug": request.community_slug,
            "community_url": request.community_url,
            "message": request.message,
            "moderator": request.moderator,
            "subject": request.subject,
        });

        let email = TemplatedEmail::new(INVITATION_TEMPLATE, &request.recipient, data)
            .with_sender(self.via(&request.inviter_name, &request.inviter_email))
            .with_version(Some(INVITATION_VERSION.to_string()));

        self.sender.send(email).await
    }

    pub async fn send_project_invitation(&self, email: &str, data: Value) -> Result<()> {
        let inviter_name = data["inviter_name"].as_str().unwrap_or_default().to_string();
        let inviter_email = data["inviter_email"].as_str().unwrap_or_default().to_string();

        let message = TemplatedEmail::new(PROJECT_INVITATION_TEMPLATE, email, data)
            .with_sender(self.via(&inviter_name, &inviter_email));
        Ok(self.sender.send(message).await?)
    }

    pub async fn send_new_project_post_notification(&self, email: &str, data: Value) -> Result<()> {
        self.send_simple(NEW_PROJECT_POST_TEMPLATE, email, data).await
    }

    pub async fn send_password_reset(&self, email: &str, data: Value) -> Result<()> {
        self.send_simple(PASSWORD_RESET_TEMPLATE, email, data).await
    }

    pub async fn send_community_digest(&self, email: &str, data: Value) -> Result<()> {
        self.send_simple(COMMUNITY_DIGEST_TEMPLATE, email, data).await
    }

    pub async fn send_new_comment_notification(&self, notification: PostNotification) -> Result<()> {
        self.send_post_notification(NEW_COMMENT_TEMPLATE, notification).await
    }

    pub async fn send_post_mention_notification(&self, notification: PostNotification) -> Result<()> {
        self.send_post_notification(POST_MENTION_TEMPLATE, notification).await
    }

    async fn send_simple(&self, template_id: &str, email: &str, data: Value) -> Result<()> {
        Ok(self.sender.send(TemplatedEmail::new(template_id, email, data)).await?)
    }

    async fn send_post_notification(&self, template_id: &str, n: PostNotification) -> Result<()> {
        let reply_to = self
            .reply_codec
            .post_reply_address(&n.post_id, &n.user_id)?;

        let email = TemplatedEmail::new(template_id, &n.email, n.data)
            .with_sender(SenderOverride {
                name: n.sender_name,
                reply_to: Some(reply_to),
            })
            .with_version(n.version);

        Ok(self.sender.send(email).await?)
    }

    fn via(&self, inviter_name: &str, inviter_email: &str) -> SenderOverride {
        SenderOverride {
            name: Some(format!("{} (via {})", inviter_name, self.sender_name)),
            reply_to: Some(inviter_email.to_string()).filter(|e| !e.is_empty()),
        }
    }
}
