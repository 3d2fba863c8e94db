use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::Config;
use crate::invite::InvitationDispatcher;
use crate::mail::Mailer;
use crate::redis::CommunityRepository;
use crate::reply::ReplyAddressCodec;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
    pub communities: Arc<CommunityRepository>,
    pub mailer: Arc<Mailer>,
    pub reply_codec: Arc<ReplyAddressCodec>,
    pub dispatcher: Arc<InvitationDispatcher>,
}

impl AppState {
    pub fn new(
        config: Config,
        auth: AuthService,
        communities: Arc<CommunityRepository>,
        mailer: Arc<Mailer>,
        reply_codec: Arc<ReplyAddressCodec>,
        dispatcher: InvitationDispatcher,
    ) -> Self {
        Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            communities,
            mailer,
            reply_codec,
            dispatcher: Arc::new(dispatcher),
        }
    }
}
